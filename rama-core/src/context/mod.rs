//! Context passed to and between services as input.
//!
//! [`Context`] carries two things alongside a request as it travels through
//! a stack of [`Service`](crate::Service)s: the immutable, service-scoped
//! `state` established once at construction time (e.g. an `Arc<AppState>`),
//! and a mutable, request-scoped [`Extensions`] bag that middleware can use
//! to thread ad-hoc values (matched route params, a proxy target, ...)
//! alongside the request without changing every signature in the stack.

use crate::extensions::Extensions;
use crate::rt::Executor;
use std::sync::Arc;

/// Context passed to and between services as input.
///
/// See the [module level docs](crate::context) for more information.
#[derive(Debug)]
pub struct Context<S = ()> {
    state: Arc<S>,
    executor: Executor,
    extensions: Extensions,
}

impl<S> Clone for Context<S> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            executor: self.executor.clone(),
            extensions: self.extensions.clone(),
        }
    }
}

impl<S: Default> Default for Context<S> {
    fn default() -> Self {
        Self::with_state(Arc::new(S::default()))
    }
}

impl<S> Context<S> {
    /// Create a new [`Context`] wrapping an already-shared state.
    #[must_use]
    pub fn with_state(state: Arc<S>) -> Self {
        Self {
            state,
            executor: Executor::new(),
            extensions: Extensions::new(),
        }
    }

    /// Create a new [`Context`], taking ownership of `state` and sharing it
    /// behind an `Arc` from here on.
    #[must_use]
    pub fn new(state: S) -> Self {
        Self::with_state(Arc::new(state))
    }

    /// Attach an [`Executor`] to this context, replacing the default one.
    #[must_use]
    pub fn with_executor(mut self, executor: Executor) -> Self {
        self.executor = executor;
        self
    }

    /// Borrow the service-scoped state.
    #[must_use]
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Clone the `Arc` backing the service-scoped state.
    #[must_use]
    pub fn state_clone(&self) -> Arc<S> {
        self.state.clone()
    }

    /// Borrow the [`Executor`] used to spawn tasks on behalf of this context.
    #[must_use]
    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Get a shared reference to a request-scoped extension, if present.
    #[must_use]
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions.get()
    }

    /// Get an exclusive reference to a request-scoped extension, if present.
    pub fn get_mut<T: Send + Sync + 'static>(&mut self) -> Option<&mut T> {
        self.extensions.get_mut()
    }

    /// Insert a request-scoped extension, returning the previous value (if any).
    pub fn insert<T: Clone + Send + Sync + 'static>(&mut self, val: T) -> Option<T> {
        self.extensions.insert(val)
    }

    /// Borrow the full [`Extensions`] bag.
    #[must_use]
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Swap the state this context carries for a different one, keeping
    /// the executor and extensions intact.
    #[must_use]
    pub fn map_state<S2>(self, state: Arc<S2>) -> Context<S2> {
        Context {
            state,
            executor: self.executor,
            extensions: self.extensions,
        }
    }
}
