//! The proxy engine: binds the accept loop to the shared component state
//! and drives its graceful lifecycle (spec.md §4.2, §7).
//!
//! Grounded on `examples/plabayo-rama/rama-cli/src/cmd/probe/mod.rs` for
//! combining an OS shutdown signal with a programmatic
//! `tokio::sync::oneshot` trigger inside one `rama_core::graceful::Shutdown`,
//! and on `examples/plabayo-rama/examples/unix_socket.rs` /
//! `rama-http-backend/src/server/hyper_conn.rs` for using
//! `ShutdownGuard::cancelled()` as the per-connection cancellation signal
//! instead of a separate `tokio_util::sync::CancellationToken` — see
//! DESIGN.md Open Question decision 2.

pub mod convert;
mod listener;
mod mitm;
pub mod upstream;
pub mod wire;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rama_core::graceful::{self, Shutdown};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use crate::ca::CertificateAuthority;
use crate::config::ProxyConfig;
use crate::error::EngineError;
use crate::flow::FlowEngine;
use crate::recorder::Recorder;

/// Everything a connection handler needs a read-only `Arc` handle to.
pub(crate) struct SharedState {
    pub ca: Arc<CertificateAuthority>,
    pub recorder: Arc<Recorder>,
    pub flow_engine: Arc<FlowEngine>,
    pub mitm_enabled: AtomicBool,
}

/// Lets an embedder register this host OS as the active HTTP(S) proxy
/// while the engine runs, and restore it on stop (spec.md §4.2's
/// `system_proxy_enabled` setting). Out of scope for this crate to
/// implement per-OS (spec.md Non-goals); [`NullSystemProxyController`] is
/// the default no-op so the engine runs the same with or without one.
pub trait SystemProxyController: Send + Sync + 'static {
    fn enable(&self, proxy_port: u16) -> Result<(), EngineError>;
    fn disable(&self) -> Result<(), EngineError>;
}

/// Default [`SystemProxyController`]: does nothing, successfully.
#[derive(Debug, Default)]
pub struct NullSystemProxyController;

impl SystemProxyController for NullSystemProxyController {
    fn enable(&self, _proxy_port: u16) -> Result<(), EngineError> {
        Ok(())
    }

    fn disable(&self) -> Result<(), EngineError> {
        Ok(())
    }
}

/// Owns the listener socket and drives it to completion, wiring the
/// shared Certificate Authority, Recorder, and Flow Engine into every
/// accepted connection.
pub struct ProxyEngine {
    config: ProxyConfig,
    state: Arc<SharedState>,
    system_proxy: Arc<dyn SystemProxyController>,
    stop_tx: parking_lot::Mutex<Option<oneshot::Sender<()>>>,
}

impl ProxyEngine {
    #[must_use]
    pub fn new(
        config: ProxyConfig,
        ca: Arc<CertificateAuthority>,
        recorder: Arc<Recorder>,
        flow_engine: Arc<FlowEngine>,
    ) -> Self {
        Self::with_system_proxy_controller(
            config,
            ca,
            recorder,
            flow_engine,
            Arc::new(NullSystemProxyController),
        )
    }

    #[must_use]
    pub fn with_system_proxy_controller(
        config: ProxyConfig,
        ca: Arc<CertificateAuthority>,
        recorder: Arc<Recorder>,
        flow_engine: Arc<FlowEngine>,
        system_proxy: Arc<dyn SystemProxyController>,
    ) -> Self {
        let mitm_enabled = AtomicBool::new(config.https_mitm_enabled);
        Self {
            state: Arc::new(SharedState { ca, recorder, flow_engine, mitm_enabled }),
            config,
            system_proxy,
            stop_tx: parking_lot::Mutex::new(None),
        }
    }

    /// Toggle MITM interception at runtime (spec.md §4.2's
    /// `https_mitm_enabled` setting): when disabled, CONNECT tunnels are
    /// spliced raw instead of TLS-terminated.
    pub fn set_mitm_enabled(&self, enabled: bool) {
        self.state.mitm_enabled.store(enabled, Ordering::Relaxed);
    }

    #[must_use]
    pub fn mitm_enabled(&self) -> bool {
        self.state.mitm_enabled.load(Ordering::Relaxed)
    }

    /// Bind the listener and run until either an OS shutdown signal
    /// arrives or [`Self::stop`] is called. Enables the system proxy (if
    /// configured) on entry and always disables it again on exit.
    pub async fn run(&self) -> Result<(), EngineError> {
        let listener = TcpListener::bind(("0.0.0.0", self.config.proxy_port))
            .await
            .map_err(|err| EngineError(format!("failed to bind 0.0.0.0:{}: {err}", self.config.proxy_port)))?;

        if self.config.system_proxy_enabled {
            self.system_proxy.enable(self.config.proxy_port)?;
        }

        let (stop_tx, stop_rx) = oneshot::channel();
        *self.stop_tx.lock() = Some(stop_tx);

        let shutdown = Shutdown::new(async move {
            tokio::select! {
                _ = graceful::default_signal() => {}
                _ = stop_rx => {}
            }
        });

        let state = self.state.clone();
        shutdown.spawn_task_fn(move |guard| async move {
            listener::accept_loop(listener, state, guard).await;
        });

        shutdown
            .shutdown_with_limit(std::time::Duration::from_secs(10))
            .await
            .map_err(|err| EngineError(format!("graceful shutdown exceeded its grace period: {err}")))?;

        if self.config.system_proxy_enabled {
            self.system_proxy.disable()?;
        }
        Ok(())
    }

    /// Trigger shutdown of a running [`Self::run`] call. A no-op if the
    /// engine was never started or has already stopped.
    pub fn stop(&self) {
        if let Some(tx) = self.stop_tx.lock().take() {
            let _ = tx.send(());
        }
    }
}
