//! Error taxonomy for the proxy engine.
//!
//! Follows spec.md §7: most errors here are recoverable at a narrow
//! scope (a single connection, a single flow node) and never bubble up
//! to crash the listener. `rama_error`'s `BoxError` plus its
//! `ErrorContext`/`ErrorExt` extension traits are used throughout
//! instead of a generic `anyhow`-style catch-all.

use rama_core::error::BoxError;
use std::fmt;

/// Certificate authority failures: load/mint/import/leaf issuance.
#[derive(Debug)]
pub enum CaError {
    Io(std::io::Error),
    Cert(BoxError),
}

impl fmt::Display for CaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "certificate authority io error: {e}"),
            Self::Cert(e) => write!(f, "certificate authority error: {e}"),
        }
    }
}

impl std::error::Error for CaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Cert(e) => Some(e.as_ref()),
        }
    }
}

impl From<std::io::Error> for CaError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Upstream forwarding failure, surfaced to the client as `502`.
#[derive(Debug)]
pub struct ForwardError(pub BoxError);

impl fmt::Display for ForwardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "upstream forwarding failed: {}", self.0)
    }
}

impl std::error::Error for ForwardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.0.as_ref())
    }
}

/// CONNECT/MITM setup failure after the client socket is already
/// committed to a tunnel, surfaced to the client as `500`.
#[derive(Debug)]
pub struct MitmSetupError(pub BoxError);

impl fmt::Display for MitmSetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mitm setup failed: {}", self.0)
    }
}

impl std::error::Error for MitmSetupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.0.as_ref())
    }
}

/// A flow-execution error, always recovered at the offending node
/// (spec.md §7): the engine logs it and continues the default edge.
#[derive(Debug)]
pub struct FlowExecutionError(pub String);

impl fmt::Display for FlowExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for FlowExecutionError {}

/// A fatal error in the proxy engine's own lifecycle (bind failure,
/// `SystemProxyController` failure, shutdown exceeding its grace
/// period) — unlike the other errors here, this one ends [`ProxyEngine::run`]
/// rather than being recovered at a connection or flow-node scope.
///
/// [`ProxyEngine::run`]: crate::proxy::ProxyEngine::run
#[derive(Debug)]
pub struct EngineError(pub String);

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for EngineError {}
