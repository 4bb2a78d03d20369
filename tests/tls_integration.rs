//! TLS integration tests
//!
//! A self-signed HTTPS broker stands in for a real one to check that broker
//! certificate verification follows `ssl_verify`, and the listener loads both
//! PEM and PKCS12 material.

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::{routing::post, Router};
use axum_server::tls_rustls::RustlsConfig;
use solace_exporter::config::{AuthConfig, AuthScheme, CertType, DataSource, ScrapeConfig, TlsConfig};
use solace_exporter::semp::{MetricTuple, SempClient};
use solace_exporter::server::tls::{rustls_config, unpack_pkcs12};

const VERSION_REPLY: &str = r#"<rpc-reply><rpc><show><version><current-load>soltr_10.4.1</current-load><uptime><total-secs>42</total-secs></uptime></version></show></rpc><execute-result code="ok"/></rpc-reply>"#;

fn fixture(name: &str) -> String {
    let path: PathBuf = [env!("CARGO_MANIFEST_DIR"), "tests", "fixtures", name]
        .iter()
        .collect();
    path.to_string_lossy().into_owned()
}

fn install_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

fn pem_tls() -> TlsConfig {
    TlsConfig {
        enable: true,
        cert_type: CertType::Pem,
        certificate: fixture("server.crt"),
        private_key: fixture("server.key"),
        pkcs12_pass: String::new(),
    }
}

/// Serve a fake SEMP v1 endpoint over HTTPS with the fixture certificate
async fn start_https_broker(config: RustlsConfig) -> SocketAddr {
    let app = Router::new().route("/SEMP", post(|| async { VERSION_REPLY }));
    let handle = axum_server::Handle::new();
    let listening = handle.clone();

    tokio::spawn(async move {
        axum_server::bind_rustls("127.0.0.1:0".parse().unwrap(), config)
            .handle(handle)
            .serve(app.into_make_service())
            .await
            .unwrap();
    });

    listening.listening().await.expect("HTTPS broker failed to bind")
}

async fn scrape_version(addr: SocketAddr, ssl_verify: bool) -> Result<Vec<MetricTuple>, String> {
    let scrape = ScrapeConfig {
        uri: format!("https://localhost:{}", addr.port()),
        ssl_verify,
        ..ScrapeConfig::default()
    };
    let auth = AuthConfig {
        scheme: AuthScheme::Basic,
        username: "admin".to_string(),
        password: "admin".to_string(),
        ..AuthConfig::default()
    };
    let client = SempClient::new(&scrape, auth).map_err(|e| e.to_string())?;
    let source: DataSource = "Version=*|*".parse().unwrap();
    client.scrape_source(&source).await.map_err(|e| e.to_string())
}

#[tokio::test]
async fn test_unverified_broker_certificate_is_accepted() {
    install_provider();
    let addr = start_https_broker(rustls_config(&pem_tls()).await.unwrap()).await;

    let tuples = scrape_version(addr, false).await.unwrap();
    assert!(tuples
        .iter()
        .any(|t| t.key() == "system_version_uptime_totalsecs" && t.value == 42.0));
}

#[tokio::test]
async fn test_verified_broker_certificate_is_rejected() {
    install_provider();
    let addr = start_https_broker(rustls_config(&pem_tls()).await.unwrap()).await;

    let err = scrape_version(addr, true).await.unwrap_err();
    assert!(err.contains("HTTP request failed"), "unexpected error: {err}");
}

#[tokio::test]
async fn test_pkcs12_listener() {
    install_provider();
    let tls = TlsConfig {
        enable: true,
        cert_type: CertType::Pkcs12,
        certificate: fixture("server.p12"),
        private_key: String::new(),
        pkcs12_pass: "changeit".to_string(),
    };
    let addr = start_https_broker(rustls_config(&tls).await.unwrap()).await;

    assert!(scrape_version(addr, false).await.is_ok());
}

#[test]
fn test_pkcs12_wrong_password() {
    let bundle = std::fs::read(fixture("server.p12")).unwrap();
    assert!(unpack_pkcs12(&bundle, "wrong").is_err());

    let (chain, key) = unpack_pkcs12(&bundle, "changeit").unwrap();
    assert_eq!(chain.len(), 1);
    assert!(!key.is_empty());
}
