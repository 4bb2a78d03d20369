//! Listener TLS material
//!
//! PEM certificate/key files are handed to rustls as is; PKCS12 bundles are
//! unpacked into a DER chain plus PKCS8 key first.

use anyhow::{anyhow, Context, Result};
use axum_server::tls_rustls::RustlsConfig;
use p12_keystore::KeyStore;

use crate::config::{CertType, TlsConfig};

/// Build the rustls listener configuration
pub async fn rustls_config(tls: &TlsConfig) -> Result<RustlsConfig> {
    match tls.cert_type {
        CertType::Pem => RustlsConfig::from_pem_file(&tls.certificate, &tls.private_key)
            .await
            .with_context(|| {
                format!(
                    "Failed to load PEM certificate '{}' / key '{}'",
                    tls.certificate, tls.private_key
                )
            }),
        CertType::Pkcs12 => {
            let bundle = tokio::fs::read(&tls.certificate)
                .await
                .with_context(|| format!("Failed to read PKCS12 bundle '{}'", tls.certificate))?;
            let (chain, key) = unpack_pkcs12(&bundle, &tls.pkcs12_pass)?;
            RustlsConfig::from_der(chain, key)
                .await
                .context("Failed to build TLS config from PKCS12 bundle")
        }
    }
}

/// Certificate chain (leaf first) and PKCS8 private key from a PKCS12 bundle
pub fn unpack_pkcs12(bundle: &[u8], password: &str) -> Result<(Vec<Vec<u8>>, Vec<u8>)> {
    let store = KeyStore::from_pkcs12(bundle, password)
        .map_err(|e| anyhow!("Failed to decode PKCS12 bundle: {:?}", e))?;
    let (_alias, entry) = store
        .private_key_chain()
        .ok_or_else(|| anyhow!("PKCS12 bundle contains no private key"))?;

    let chain: Vec<Vec<u8>> = entry.chain().iter().map(|c| c.as_der().to_vec()).collect();
    if chain.is_empty() {
        return Err(anyhow!("PKCS12 bundle contains no certificate"));
    }
    Ok((chain, entry.key().to_vec()))
}
