//! Configuration (spec.md §6).
//!
//! The engine itself only cares about the five recognized keys below; the
//! surrounding CLI plumbing (`clap`) lives in `main.rs`, matching the
//! teacher's own split between a thin `clap`-driven binary and a library
//! that never imports `clap` itself.

use rama_core::error::{BoxError, ErrorContext as _};
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_proxy_port() -> u16 {
    8888
}

fn default_max_request_records() -> usize {
    2000
}

fn default_log_level() -> String {
    "info".to_owned()
}

/// Configuration recognized by the engine (spec.md §6 table).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener port. Valid range is 1024..=65535; out-of-range values
    /// are rejected at startup.
    pub proxy_port: u16,
    /// Recorder capacity.
    pub max_request_records: usize,
    /// Diagnostic verbosity, fed into `tracing_subscriber`'s default
    /// directive.
    pub log_level: String,
    /// Route CONNECTs through MITM rather than raw tunnels.
    pub https_mitm_enabled: bool,
    /// Drive the OS system proxy to point at this engine. The engine
    /// only stores this flag; actually mutating the OS setting is an
    /// external collaborator (spec.md §1 Non-goals), exposed via
    /// [`crate::proxy::SystemProxyController`].
    pub system_proxy_enabled: bool,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            proxy_port: default_proxy_port(),
            max_request_records: default_max_request_records(),
            log_level: default_log_level(),
            https_mitm_enabled: true,
            system_proxy_enabled: false,
        }
    }
}

impl ProxyConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, BoxError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read config file at {}", path.display()))?;
        let cfg: Self = serde_json::from_str(&raw)
            .with_context(|| format!("parse config file at {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), BoxError> {
        if !(1024..=65535).contains(&self.proxy_port) {
            return Err(rama_core::error::OpaqueError::from_display(format!(
                "proxy_port {} out of valid range 1024..65535",
                self.proxy_port
            ))
            .into());
        }
        if self.log_level.parse::<tracing_subscriber::filter::Directive>().is_err() {
            return Err(rama_core::error::OpaqueError::from_display(format!(
                "log_level '{}' is not a valid tracing filter directive",
                self.log_level
            ))
            .into());
        }
        Ok(())
    }
}
