//! Per-tunnel TLS server config for CONNECT/MITM interception.
//!
//! Grounded on `examples/plabayo-rama/examples/tls_rustls_dynamic_certs.rs`
//! (`ServerConfig::builder()...with_cert_resolver(...)`), generalized to
//! bind the resolver to the single host this CONNECT tunnel is for — see
//! DESIGN.md Open Question decision 3 for why this crate builds one
//! `ServerConfig` per tunnel instead of standing up a listener per host.

use std::sync::Arc;

use rustls::ServerConfig;

use crate::ca::{CertificateAuthority, DynamicCertResolver};

/// Build the `rustls::ServerConfig` an accepted CONNECT tunnel terminates
/// TLS with, resolving `host`'s leaf certificate from `ca` (minting and
/// caching it on first contact).
#[must_use]
pub fn server_config(ca: Arc<CertificateAuthority>, host: &str) -> Arc<ServerConfig> {
    let resolver = Arc::new(DynamicCertResolver::new(ca, host.to_owned()));
    let mut config = ServerConfig::builder()
        .with_no_client_auth()
        .with_cert_resolver(resolver);
    config.alpn_protocols = vec![b"http/1.1".to_vec()];
    Arc::new(config)
}
