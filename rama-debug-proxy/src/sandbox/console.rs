//! The restricted `console` object bound into every script invocation.
//!
//! Per spec.md §4.5: "a restricted `console` (both `log` and `error`
//! route to `ctx.log`)". Rather than mutate the script's `ctx` value in
//! place (round-tripped through `rhai::serde`, so in-script mutations of
//! nested arrays are not guaranteed to be observable after the call
//! returns), both methods push into a plain `Arc<Mutex<Vec<String>>>`
//! that the sandbox drains into the final `ComponentResult.log` once
//! evaluation completes.

use std::sync::Arc;

use parking_lot::Mutex;

#[derive(Clone)]
pub struct Console {
    sink: Arc<Mutex<Vec<String>>>,
}

impl Console {
    pub fn new(sink: Arc<Mutex<Vec<String>>>) -> Self {
        Self { sink }
    }

    pub fn log(&mut self, message: &str) {
        self.sink.lock().push(message.to_owned());
    }

    pub fn error(&mut self, message: &str) {
        self.sink.lock().push(format!("error: {message}"));
    }
}
