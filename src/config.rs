//! Configuration management for solace-exporter
//!
//! Handles loading and validating configuration from YAML files. CLI flags and
//! `SOLACE_*` environment variables are layered on top by [`crate::cli::Cli`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors. All of them are fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Error reading the configuration file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Error parsing the configuration file
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Configuration validation error
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// Data source entry not in `name=vpn|item[|metrics]` form
    #[error("Invalid data source '{entry}': {reason}")]
    InvalidDataSource { entry: String, reason: String },
}

/// Authentication scheme for broker-facing and exporter-facing auth
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AuthScheme {
    #[default]
    None,
    Basic,
    OAuth,
}

impl From<String> for AuthScheme {
    fn from(raw: String) -> Self {
        match raw.to_lowercase().as_str() {
            "basic" => AuthScheme::Basic,
            "oauth" => AuthScheme::OAuth,
            _ => AuthScheme::None,
        }
    }
}

impl From<AuthScheme> for String {
    fn from(scheme: AuthScheme) -> Self {
        scheme.to_string()
    }
}

impl fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthScheme::None => write!(f, "none"),
            AuthScheme::Basic => write!(f, "basic"),
            AuthScheme::OAuth => write!(f, "oauth"),
        }
    }
}

/// Listener certificate format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CertType {
    #[default]
    Pem,
    Pkcs12,
}

impl From<String> for CertType {
    fn from(raw: String) -> Self {
        match raw.to_lowercase().as_str() {
            "pkcs12" => CertType::Pkcs12,
            _ => CertType::Pem,
        }
    }
}

impl From<CertType> for String {
    fn from(cert_type: CertType) -> Self {
        match cert_type {
            CertType::Pem => "pem".to_string(),
            CertType::Pkcs12 => "pkcs12".to_string(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Listener address for the metrics endpoint
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Warn when a broker round trip takes longer than the slow threshold
    #[serde(default)]
    pub log_broker_to_slow_warnings: bool,

    /// Listener TLS
    #[serde(default)]
    pub tls: TlsConfig,

    /// Broker scrape settings
    #[serde(default)]
    pub scrape: ScrapeConfig,

    /// Credentials presented to the broker
    #[serde(default = "default_semp_auth")]
    pub semp_auth: AuthConfig,

    /// Credentials required from scrapers of this exporter
    #[serde(default)]
    pub exporter_auth: AuthConfig,

    /// Named endpoints, each a list of data sources
    #[serde(default)]
    pub endpoints: BTreeMap<String, Vec<DataSource>>,
}

/// Broker scrape configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Broker base URI
    #[serde(default = "default_scrape_uri")]
    pub uri: String,

    /// VPN used when a data source leaves its VPN filter blank
    #[serde(default = "default_vpn")]
    pub vpn: String,

    /// Per-source timeout in milliseconds
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,

    /// Serve cached results younger than this; 0 disables the cache
    #[serde(default)]
    pub prefetch_interval_ms: u64,

    /// Upper bound of concurrent broker requests
    #[serde(default = "default_parallel")]
    pub parallel_semp_connections: usize,

    /// Appliance (hardware) broker instead of a software broker
    #[serde(default)]
    pub is_hw_broker: bool,

    /// Verify the broker certificate
    #[serde(default)]
    pub ssl_verify: bool,

    /// Slow-broker warning threshold in milliseconds (default: half the timeout)
    pub slow_warning_ms: Option<u64>,

    /// Client certificate (PEM) for mutual TLS towards the broker
    pub client_certificate: Option<String>,

    /// Client private key (PEM) for mutual TLS towards the broker
    pub client_private_key: Option<String>,
}

/// Authentication configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub scheme: AuthScheme,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub oauth_client_id: String,
    #[serde(default)]
    pub oauth_client_secret: String,
    #[serde(default)]
    pub oauth_token_url: String,
    #[serde(default)]
    pub oauth_client_scope: String,
}

/// Listener TLS configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TlsConfig {
    #[serde(default)]
    pub enable: bool,
    #[serde(default)]
    pub cert_type: CertType,
    /// PEM certificate chain, or the PKCS12 bundle
    #[serde(default)]
    pub certificate: String,
    /// PEM private key
    #[serde(default)]
    pub private_key: String,
    #[serde(default)]
    pub pkcs12_pass: String,
}

/// A named, filtered scrape target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DataSource {
    /// Category name, e.g. `BridgeStats`
    pub name: String,
    pub vpn_filter: String,
    pub item_filter: String,
    /// Optional metric selection (SEMP v2 categories)
    pub metric_filter: Vec<String>,
}

static SCRAPE_TARGET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\w+)(\.\d+)?$").expect("static regex"));

impl DataSource {
    /// Build a data source from a key (`Name` or `Name.N`) and a `vpn|item[|metrics]` value
    pub fn from_parts(key: &str, value: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidDataSource {
            entry: format!("{}={}", key, value),
            reason: reason.to_string(),
        };

        let key = key.trim();
        let name = SCRAPE_TARGET_RE
            .captures(key)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| invalid("name must be a word optionally followed by .<number>"))?;

        let parts: Vec<&str> = value.split('|').collect();
        if parts.len() < 2 || parts.len() > 3 {
            return Err(invalid(
                "expected: VPN wildcard | item wildcard | optional metric filter for v2 apis",
            ));
        }

        let metric_filter = match parts.get(2) {
            Some(raw) if !raw.trim().is_empty() => raw
                .split(',')
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect(),
            _ => Vec::new(),
        };

        Ok(Self {
            name,
            vpn_filter: parts[0].to_string(),
            item_filter: parts[1].to_string(),
            metric_filter,
        })
    }
}

impl FromStr for DataSource {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = s.split_once('=').ok_or_else(|| ConfigError::InvalidDataSource {
            entry: s.to_string(),
            reason: "expected name=vpn|item[|metrics]".to_string(),
        })?;
        Self::from_parts(key, value)
    }
}

impl TryFrom<String> for DataSource {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DataSource> for String {
    fn from(ds: DataSource) -> Self {
        ds.to_string()
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={}|{}|{}",
            self.name,
            self.vpn_filter,
            self.item_filter,
            self.metric_filter.join(",")
        )
    }
}

// Default value functions
fn default_listen_addr() -> String {
    "0.0.0.0:9628".to_string()
}

fn default_scrape_uri() -> String {
    "http://localhost:8080".to_string()
}

fn default_vpn() -> String {
    "default".to_string()
}

fn default_timeout() -> u64 {
    5000
}

fn default_parallel() -> usize {
    1
}

fn default_semp_auth() -> AuthConfig {
    AuthConfig {
        scheme: AuthScheme::Basic,
        ..AuthConfig::default()
    }
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            uri: default_scrape_uri(),
            vpn: default_vpn(),
            timeout_ms: default_timeout(),
            prefetch_interval_ms: 0,
            parallel_semp_connections: default_parallel(),
            is_hw_broker: false,
            ssl_verify: false,
            slow_warning_ms: None,
            client_certificate: None,
            client_private_key: None,
        }
    }
}

impl ScrapeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn prefetch_interval(&self) -> Duration {
        Duration::from_millis(self.prefetch_interval_ms)
    }

    pub fn slow_threshold(&self) -> Duration {
        self.slow_warning_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| self.timeout() / 2)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            log_broker_to_slow_warnings: false,
            tls: TlsConfig::default(),
            scrape: ScrapeConfig::default(),
            semp_auth: default_semp_auth(),
            exporter_auth: AuthConfig::default(),
            endpoints: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a YAML file, falling back to defaults if not found
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "Config file not found, using defaults"
            );
            return Ok(Self::default());
        }

        Self::load(path)
    }

    /// Listener URI as advertised in logs
    pub fn listen_uri(&self) -> String {
        let scheme = if self.tls.enable { "https" } else { "http" };
        format!("{}://{}", scheme, self.listen_addr)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::ValidationError(msg.to_string()));

        if self.tls.enable {
            match self.tls.cert_type {
                CertType::Pem => {
                    if self.tls.certificate.is_empty() || self.tls.private_key.is_empty() {
                        return invalid("TLS enabled but PEM cert or key missing");
                    }
                }
                CertType::Pkcs12 => {
                    if self.tls.certificate.is_empty() || self.tls.pkcs12_pass.is_empty() {
                        return invalid("TLS enabled but PKCS12 file or password missing");
                    }
                }
            }
        }

        let auth = &self.semp_auth;
        let has_basic = !auth.username.is_empty() && !auth.password.is_empty();
        let has_oauth = !auth.oauth_client_id.is_empty()
            && !auth.oauth_client_secret.is_empty()
            && !auth.oauth_token_url.is_empty()
            && !auth.oauth_client_scope.is_empty();

        if !has_basic && !has_oauth {
            return invalid("either Basic Auth or OAuth must be configured");
        }
        if auth.scheme == AuthScheme::OAuth && !has_oauth {
            return invalid("OAuth scheme selected but OAuth client settings are incomplete");
        }

        if self.exporter_auth.scheme == AuthScheme::Basic
            && (self.exporter_auth.username.is_empty() || self.exporter_auth.password.is_empty())
        {
            return invalid("exporter basic auth requires username and password");
        }

        if self.scrape.parallel_semp_connections == 0 {
            return invalid("parallel_semp_connections must be at least 1");
        }
        if self.scrape.timeout_ms == 0 {
            return invalid("timeout_ms must be greater than 0");
        }
        if self.scrape.client_certificate.is_some() != self.scrape.client_private_key.is_some() {
            return invalid("client_certificate and client_private_key must be set together");
        }

        url::Url::parse(&self.scrape.uri).map_err(|e| {
            ConfigError::ValidationError(format!("invalid scrape uri '{}': {}", self.scrape.uri, e))
        })?;

        for name in self.endpoints.keys() {
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
                return Err(ConfigError::ValidationError(format!(
                    "endpoint name '{}' must be alphanumeric",
                    name
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.semp_auth.username = "admin".to_string();
        config.semp_auth.password = "admin".to_string();
        config
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.listen_addr, "0.0.0.0:9628");
        assert_eq!(config.scrape.uri, "http://localhost:8080");
        assert_eq!(config.scrape.vpn, "default");
        assert_eq!(config.scrape.timeout(), Duration::from_secs(5));
        assert_eq!(config.scrape.parallel_semp_connections, 1);
        assert!(!config.scrape.ssl_verify);
        assert_eq!(config.semp_auth.scheme, AuthScheme::Basic);
        assert_eq!(config.exporter_auth.scheme, AuthScheme::None);
    }

    #[test]
    fn test_validate_requires_either_basic_or_oauth() {
        let config = Config::default();
        assert!(config.validate().is_err());
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_oauth_tuple() {
        let mut config = Config::default();
        config.semp_auth.scheme = AuthScheme::OAuth;
        config.semp_auth.oauth_client_id = "id".to_string();
        config.semp_auth.oauth_client_secret = "secret".to_string();
        config.semp_auth.oauth_token_url = "http://idp/token".to_string();
        assert!(config.validate().is_err());

        config.semp_auth.oauth_client_scope = "semp".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_tls_pem_requires_cert_and_key() {
        let mut config = valid_config();
        config.tls.enable = true;
        config.tls.cert_type = CertType::Pem;
        assert!(config.validate().is_err());

        config.tls.certificate = "cert.pem".to_string();
        config.tls.private_key = "key.pem".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_tls_pkcs12_requires_file_and_pass() {
        let mut config = valid_config();
        config.tls.enable = true;
        config.tls.cert_type = CertType::Pkcs12;
        config.tls.certificate = "bundle.p12".to_string();
        assert!(config.validate().is_err());

        config.tls.pkcs12_pass = "secret".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_parallel_connections() {
        let mut config = valid_config();
        config.scrape.parallel_semp_connections = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_auth_scheme() {
        let cases = [
            ("basic", AuthScheme::Basic),
            ("BASIC", AuthScheme::Basic),
            ("oauth", AuthScheme::OAuth),
            ("OAUTH", AuthScheme::OAuth),
            ("none", AuthScheme::None),
            ("", AuthScheme::None),
            ("invalid", AuthScheme::None),
        ];
        for (input, expected) in cases {
            assert_eq!(AuthScheme::from(input.to_string()), expected, "input {input:?}");
        }
    }

    #[test]
    fn test_parse_cert_type() {
        assert_eq!(CertType::from("pkcs12".to_string()), CertType::Pkcs12);
        assert_eq!(CertType::from("something".to_string()), CertType::Pem);
    }

    #[test]
    fn test_listen_uri() {
        let mut config = Config::default();
        assert_eq!(config.listen_uri(), "http://0.0.0.0:9628");
        config.tls.enable = true;
        assert_eq!(config.listen_uri(), "https://0.0.0.0:9628");
    }

    #[test]
    fn test_data_source_parse() {
        let ds: DataSource = "BridgeStats=vpnA|itemA|metric1,metric2".parse().unwrap();
        assert_eq!(ds.name, "BridgeStats");
        assert_eq!(ds.vpn_filter, "vpnA");
        assert_eq!(ds.item_filter, "itemA");
        assert_eq!(ds.metric_filter, vec!["metric1", "metric2"]);
    }

    #[test]
    fn test_data_source_strips_index_suffix() {
        let ds: DataSource = "QueueDetails.2=*|q*".parse().unwrap();
        assert_eq!(ds.name, "QueueDetails");
        assert!(ds.metric_filter.is_empty());
    }

    #[test]
    fn test_data_source_invalid_format() {
        assert!("broken=onlyone".parse::<DataSource>().is_err());
        assert!("no-equals-sign".parse::<DataSource>().is_err());
        assert!("bad name=a|b".parse::<DataSource>().is_err());
        assert!("Name=a|b|c|d".parse::<DataSource>().is_err());
    }

    #[test]
    fn test_data_source_string_round_trip() {
        for raw in [
            "queue1=vpn|item|a,b",
            "VpnStats=*|*",
            "BridgeStats=default|br*|",
            "QueueStatsV2=vpn1|q%2A|spool_usage_bytes",
        ] {
            let parsed: DataSource = raw.parse().unwrap();
            let reparsed: DataSource = parsed.to_string().parse().unwrap();
            assert_eq!(parsed, reparsed, "round trip of {raw}");
        }

        let ds = DataSource {
            name: "queue1".to_string(),
            vpn_filter: "vpn".to_string(),
            item_filter: "item".to_string(),
            metric_filter: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(ds.to_string(), "queue1=vpn|item|a,b");
    }

    #[test]
    fn test_load_yaml_with_endpoints() {
        let yaml = r#"
listen_addr: "127.0.0.1:9999"
scrape:
  uri: "https://broker:943"
  timeout_ms: 2000
  parallel_semp_connections: 4
semp_auth:
  scheme: BASIC
  username: admin
  password: secret
endpoints:
  std:
    - "Version=*|*"
    - "VpnStats=default|*"
  det:
    - "QueueStatsV2=default|*|spool_usage_bytes,bind_count"
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:9999");
        assert_eq!(config.scrape.timeout_ms, 2000);
        assert_eq!(config.scrape.vpn, "default");
        assert_eq!(config.semp_auth.scheme, AuthScheme::Basic);
        assert_eq!(config.endpoints.len(), 2);
        assert_eq!(config.endpoints["std"][1].name, "VpnStats");
        assert_eq!(config.endpoints["det"][0].metric_filter.len(), 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_yaml_rejects_bad_data_source() {
        let yaml = r#"
endpoints:
  std:
    - "broken=onlyone"
"#;
        assert!(serde_yaml::from_str::<Config>(yaml).is_err());
    }

    #[test]
    fn test_slow_threshold_defaults_to_half_timeout() {
        let mut scrape = ScrapeConfig::default();
        assert_eq!(scrape.slow_threshold(), Duration::from_millis(2500));
        scrape.slow_warning_ms = Some(100);
        assert_eq!(scrape.slow_threshold(), Duration::from_millis(100));
    }
}
