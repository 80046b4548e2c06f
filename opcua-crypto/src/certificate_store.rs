use std::path::{Path, PathBuf};

/// Holds the filesystem paths to the server's own certificate/private
/// key and the directory of trusted/rejected peer certificates.
/// Certificate parsing, trust-chain validation, and signature
/// verification against an X.509 cert are intentionally out of scope
/// here: this store only tracks *where* that material lives, mirroring
/// how the connection pipeline only needs paths at config-validation
/// time and raw DER bytes at OPN time.
#[derive(Debug, Clone)]
pub struct CertificateStore {
    pub pki_dir: PathBuf,
    pub certificate_path: Option<PathBuf>,
    pub private_key_path: Option<PathBuf>,
}

impl CertificateStore {
    pub fn new(pki_dir: impl Into<PathBuf>) -> Self {
        Self {
            pki_dir: pki_dir.into(),
            certificate_path: None,
            private_key_path: None,
        }
    }

    pub fn with_certificate(mut self, path: impl Into<PathBuf>) -> Self {
        self.certificate_path = Some(path.into());
        self
    }

    pub fn with_private_key(mut self, path: impl Into<PathBuf>) -> Self {
        self.private_key_path = Some(path.into());
        self
    }

    pub fn rejected_dir(&self) -> PathBuf {
        self.pki_dir.join("rejected")
    }

    pub fn trusted_dir(&self) -> PathBuf {
        self.pki_dir.join("trusted")
    }

    pub fn validate_paths(&self) -> Result<(), String> {
        if let Some(cert) = &self.certificate_path {
            if !Path::new(cert).exists() {
                return Err(format!("certificate not found at {}", cert.display()));
            }
        }
        if let Some(key) = &self.private_key_path {
            if !Path::new(key).exists() {
                return Err(format!("private key not found at {}", key.display()));
            }
        }
        Ok(())
    }
}
