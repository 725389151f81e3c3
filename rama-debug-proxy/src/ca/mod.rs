//! Certificate Authority (spec.md §4.1).
//!
//! Grounded on `examples/plabayo-rama/examples/tls_rustls_dynamic_certs.rs`
//! (per-host leaf issuance shape) and `rama-crypto`'s `rcgen` re-export.
//! See DESIGN.md for why this crate drives `rcgen`/`rustls` directly
//! rather than through the (empty in this pack) `rama-tls-rustls`
//! subcrate.

mod resolver;

pub use resolver::DynamicCertResolver;

use parking_lot::RwLock;
use rama_core::error::BoxError;
use rcgen::{
    CertificateParams, DistinguishedName, DnType, DnValue, Ia5String, Issuer, KeyPair, KeyUsagePurpose,
};
use rustls::sign::CertifiedKey;
use rustls_pki_types::CertificateDer;
use std::collections::HashMap;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::error::CaError;

const ROOT_VALIDITY: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 10);
const LEAF_VALIDITY: Duration = Duration::from_secs(60 * 60 * 24 * 365);

/// Snapshot of the CA's current state, returned by [`CertificateAuthority::status`].
#[derive(Debug, Clone)]
pub struct CaStatus {
    pub loaded: bool,
    pub subject_common_name: String,
    pub not_before: String,
    pub not_after: String,
    pub cert_path: PathBuf,
    pub trust: TrustCheck,
}

/// Result of a best-effort OS trust-store probe.
#[derive(Debug, Clone)]
pub struct TrustCheck {
    pub trusted: Option<bool>,
    pub message: String,
}

/// Best-effort interrogation of the host OS trust store. The process
/// integration itself is explicitly out of scope (spec.md §1); this
/// trait exists only so a real implementation can be swapped in by an
/// embedder without touching the CA.
pub trait TrustStoreProbe: Send + Sync + 'static {
    fn probe(&self, subject_common_name: &str) -> TrustCheck;
}

/// Default probe: never claims to know. Matches the "unknown" branch of
/// the `{trusted, message}` contract in spec.md §4.1.
#[derive(Debug, Default)]
pub struct NullTrustStoreProbe;

impl TrustStoreProbe for NullTrustStoreProbe {
    fn probe(&self, _subject_common_name: &str) -> TrustCheck {
        TrustCheck {
            trusted: None,
            message: "OS trust store probing is not wired up for this deployment".to_owned(),
        }
    }
}

struct RootMaterial {
    issuer: Issuer<'static, KeyPair>,
    cert_der: CertificateDer<'static>,
    not_before: SystemTime,
    not_after: SystemTime,
}

struct CachedLeaf {
    certified_key: Arc<CertifiedKey>,
}

/// Owns the root key/cert pair and the per-hostname leaf cache.
pub struct CertificateAuthority {
    certs_dir: PathBuf,
    root: RwLock<RootMaterial>,
    leaves: RwLock<HashMap<String, CachedLeaf>>,
    trust_probe: Box<dyn TrustStoreProbe>,
}

impl std::fmt::Debug for CertificateAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateAuthority")
            .field("certs_dir", &self.certs_dir)
            .finish()
    }
}

fn root_cert_path(dir: &Path) -> PathBuf {
    dir.join("ca-cert.pem")
}

fn root_key_path(dir: &Path) -> PathBuf {
    dir.join("ca-key.pem")
}

fn mint_root() -> Result<(CertificateParams, KeyPair), CaError> {
    let key_pair = KeyPair::generate_for(&rcgen::PKCS_RSA_SHA256)
        .map_err(|e| CaError::Cert(Box::new(e)))?;

    let mut params = CertificateParams::new(Vec::new()).map_err(|e| CaError::Cert(Box::new(e)))?;
    let mut dn = DistinguishedName::new();
    dn.push(
        DnType::CommonName,
        DnValue::Utf8String("rama-debug-proxy root CA".to_owned()),
    );
    dn.push(
        DnType::OrganizationName,
        DnValue::Utf8String("rama-debug-proxy".to_owned()),
    );
    params.distinguished_name = dn;
    params.is_ca = rcgen::IsCa::Ca(rcgen::BasicConstraints::Unconstrained);
    params.key_usages = vec![KeyUsagePurpose::KeyCertSign, KeyUsagePurpose::CrlSign];
    params.not_before = SystemTime::now().into();
    params.not_after = (SystemTime::now() + ROOT_VALIDITY).into();

    Ok((params, key_pair))
}

impl CertificateAuthority {
    /// Load a persisted root from `certs_dir`, or mint and persist one
    /// (spec.md §4.1 *initialize*).
    pub fn initialize(certs_dir: impl Into<PathBuf>) -> Result<Self, CaError> {
        Self::initialize_with_probe(certs_dir, Box::new(NullTrustStoreProbe))
    }

    pub fn initialize_with_probe(
        certs_dir: impl Into<PathBuf>,
        trust_probe: Box<dyn TrustStoreProbe>,
    ) -> Result<Self, CaError> {
        let certs_dir = certs_dir.into();
        std::fs::create_dir_all(&certs_dir)?;

        let cert_path = root_cert_path(&certs_dir);
        let key_path = root_key_path(&certs_dir);

        let root = if cert_path.exists() && key_path.exists() {
            let cert_pem = std::fs::read_to_string(&cert_path)?;
            let key_pem = std::fs::read_to_string(&key_path)?;
            load_root(&cert_pem, &key_pem)?
        } else {
            let (params, key_pair) = mint_root()?;
            let not_before = params.not_before.into();
            let not_after = params.not_after.into();
            let issuer = Issuer::new(params, key_pair);
            let cert_der = issuer
                .self_signed_cert_der()
                .map_err(|e| CaError::Cert(Box::new(e)))?;
            persist_atomically(&cert_path, &pem_from_der("CERTIFICATE", &cert_der))?;
            persist_atomically(&key_path, &issuer.key().serialize_pem())?;
            RootMaterial {
                issuer,
                cert_der,
                not_before,
                not_after,
            }
        };

        Ok(Self {
            certs_dir,
            root: RwLock::new(root),
            leaves: RwLock::new(HashMap::new()),
            trust_probe,
        })
    }

    /// Replace the in-memory root with externally supplied PEM blobs and
    /// persist atomically (spec.md §4.1 *Import path*).
    pub fn import_root(&self, cert_pem: &str, key_pem: &str) -> Result<(), CaError> {
        let root = load_root(cert_pem, key_pem)?;
        persist_atomically(&root_cert_path(&self.certs_dir), cert_pem)?;
        persist_atomically(&root_key_path(&self.certs_dir), key_pem)?;
        // dropping stale leaves: they were signed by the previous root
        self.leaves.write().clear();
        *self.root.write() = root;
        Ok(())
    }

    /// Return a cached leaf for `hostname`, minting and caching a new
    /// one on a cache miss (spec.md §4.1 *certificate for host*).
    pub fn certified_key_for_host(&self, hostname: &str) -> Result<Arc<CertifiedKey>, CaError> {
        if let Some(cached) = self.leaves.read().get(hostname) {
            return Ok(cached.certified_key.clone());
        }

        let certified_key = self.mint_leaf(hostname)?;
        self.leaves.write().insert(
            hostname.to_owned(),
            CachedLeaf {
                certified_key: certified_key.clone(),
            },
        );
        Ok(certified_key)
    }

    fn mint_leaf(&self, hostname: &str) -> Result<Arc<CertifiedKey>, CaError> {
        let mut params = CertificateParams::new(Vec::new()).map_err(|e| CaError::Cert(Box::new(e)))?;

        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, DnValue::Utf8String(hostname.to_owned()));
        params.distinguished_name = dn;

        if let Ok(ip) = hostname.parse::<IpAddr>() {
            params.subject_alt_names = vec![rcgen::SanType::IpAddress(ip)];
        } else {
            let ia5 = Ia5String::try_from(hostname.to_owned()).map_err(|e| CaError::Cert(Box::new(e)))?;
            params.subject_alt_names = vec![rcgen::SanType::DnsName(ia5)];
        }

        params.not_before = SystemTime::now().into();
        params.not_after = (SystemTime::now() + LEAF_VALIDITY).into();

        let leaf_key = KeyPair::generate_for(&rcgen::PKCS_RSA_SHA256)
            .map_err(|e| CaError::Cert(Box::new(e)))?;

        let root = self.root.read();
        let leaf_cert_der = params
            .signed_by(&leaf_key, &root.issuer)
            .map_err(|e| CaError::Cert(Box::new(e)))?;

        let key_der = rustls_pki_types::PrivateKeyDer::try_from(leaf_key.serialize_der())
            .map_err(|e| CaError::Cert(BoxError::from(e)))?;
        let signing_key = rustls::crypto::aws_lc_rs::sign::any_supported_type(&key_der)
            .map_err(|e| CaError::Cert(Box::new(e)))?;

        let chain = vec![leaf_cert_der, root.cert_der.clone()];
        Ok(Arc::new(CertifiedKey::new(chain, signing_key)))
    }

    pub fn status(&self) -> CaStatus {
        let root = self.root.read();
        let common_name = root
            .issuer
            .params()
            .distinguished_name
            .get(&DnType::CommonName)
            .map(|v| v.to_string())
            .unwrap_or_default();
        let trust = self.trust_probe.probe(&common_name);
        CaStatus {
            loaded: true,
            subject_common_name: common_name,
            not_before: humantime_like(root.not_before),
            not_after: humantime_like(root.not_after),
            cert_path: root_cert_path(&self.certs_dir),
            trust,
        }
    }
}

fn humantime_like(t: SystemTime) -> String {
    match t.duration_since(SystemTime::UNIX_EPOCH) {
        Ok(d) => format!("{}s since epoch", d.as_secs()),
        Err(_) => "before epoch".to_owned(),
    }
}

fn load_root(cert_pem: &str, key_pem: &str) -> Result<RootMaterial, CaError> {
    let key_pair = KeyPair::from_pem(key_pem).map_err(|e| CaError::Cert(Box::new(e)))?;
    let params =
        CertificateParams::from_ca_cert_pem(cert_pem).map_err(|e| CaError::Cert(Box::new(e)))?;
    let not_before = params.not_before.into();
    let not_after = params.not_after.into();
    let issuer = Issuer::new(params, key_pair);
    let cert_der = issuer
        .self_signed_cert_der()
        .map_err(|e| CaError::Cert(Box::new(e)))?;
    Ok(RootMaterial {
        issuer,
        cert_der,
        not_before,
        not_after,
    })
}

fn pem_from_der(label: &str, der: &CertificateDer<'static>) -> String {
    use base64::Engine as _;
    let b64 = base64::engine::general_purpose::STANDARD.encode(der.as_ref());
    let mut out = format!("-----BEGIN {label}-----\n");
    for chunk in b64.as_bytes().chunks(64) {
        out.push_str(std::str::from_utf8(chunk).expect("base64 is ascii"));
        out.push('\n');
    }
    out.push_str(&format!("-----END {label}-----\n"));
    out
}

fn persist_atomically(path: &Path, contents: &str) -> Result<(), CaError> {
    let tmp_path = path.with_extension("tmp");
    std::fs::write(&tmp_path, contents)?;
    std::fs::rename(&tmp_path, path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt as _;
        let mut perms = std::fs::metadata(path)?.permissions();
        perms.set_mode(0o600);
        std::fs::set_permissions(path, perms)?;
    }
    Ok(())
}
