//! TLS listener material loading.

use std::path::{Path, PathBuf};

use axum_server::tls_rustls::RustlsConfig;

#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("certificate file not found: {0}")]
    CertificateNotFound(PathBuf),

    #[error("private key file not found: {0}")]
    KeyNotFound(PathBuf),

    #[error("failed to load TLS material: {0}")]
    Load(#[from] std::io::Error),
}

/// Load a rustls server config from PEM certificate and key files.
pub async fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, TlsError> {
    if !cert_path.exists() {
        return Err(TlsError::CertificateNotFound(cert_path.to_path_buf()));
    }
    if !key_path.exists() {
        return Err(TlsError::KeyNotFound(key_path.to_path_buf()));
    }

    Ok(RustlsConfig::from_pem_file(cert_path, key_path).await?)
}
