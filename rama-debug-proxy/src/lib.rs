//! An interactive HTTP/HTTPS debugging proxy: captures, inspects, and
//! programmatically rewrites traffic between a client and arbitrary
//! upstream servers.
//!
//! The crate is organized leaf-first, matching spec.md §2's component
//! table: [`ca`] mints per-host TLS certificates, [`recorder`] keeps a
//! bounded log of observed transactions, [`component`] catalogs the
//! built-in rewriting handlers plus user scripts, [`sandbox`] executes
//! those scripts, [`flow`] matches a request to a user-authored graph and
//! walks it, and [`proxy`] owns the listener and drives everything above
//! per connection.

pub mod ca;
pub mod component;
pub mod config;
pub mod error;
pub mod flow;
pub mod model;
pub mod proxy;
pub mod recorder;
pub mod sandbox;

pub use ca::CertificateAuthority;
pub use component::ComponentRegistry;
pub use config::ProxyConfig;
pub use flow::{FlowEngine, FlowStore};
pub use proxy::ProxyEngine;
pub use recorder::Recorder;
pub use sandbox::ScriptSandbox;

use std::sync::Arc;

/// Every shared collaborator the proxy engine is built from, assembled
/// once at startup and handed to [`ProxyEngine::new`].
///
/// Grouping construction here (rather than leaving it to `main.rs`) keeps
/// the wiring order — CA, then recorder, then component registry and
/// sandbox, then flow store and engine, then the proxy engine itself —
/// in one place for embedders who want the engine without the CLI.
pub struct Engine {
    pub ca: Arc<CertificateAuthority>,
    pub recorder: Arc<Recorder>,
    pub component_registry: Arc<ComponentRegistry>,
    pub sandbox: Arc<ScriptSandbox>,
    pub flow_store: Arc<FlowStore>,
    pub flow_engine: Arc<FlowEngine>,
    pub proxy: Arc<ProxyEngine>,
}

impl Engine {
    /// Build every collaborator from `config`, rooting certificate
    /// storage under `certs_dir`.
    pub fn build(
        config: ProxyConfig,
        certs_dir: impl Into<std::path::PathBuf>,
    ) -> Result<Self, rama_core::error::BoxError> {
        config.validate()?;

        let ca = Arc::new(CertificateAuthority::initialize(certs_dir)?);
        let recorder = Arc::new(Recorder::with_capacity(config.max_request_records));
        let component_registry = Arc::new(ComponentRegistry::new());
        let sandbox = Arc::new(ScriptSandbox::new());
        let flow_store = Arc::new(FlowStore::new());
        let flow_engine = Arc::new(FlowEngine::new(flow_store.clone(), component_registry.clone(), sandbox.clone()));
        let proxy = Arc::new(ProxyEngine::new(config, ca.clone(), recorder.clone(), flow_engine.clone()));

        Ok(Self {
            ca,
            recorder,
            component_registry,
            sandbox,
            flow_store,
            flow_engine,
            proxy,
        })
    }
}
