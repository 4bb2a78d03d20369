//! SEMP broker client
//!
//! This module handles:
//! - Building SEMP v1 RPC commands and SEMP v2 collection queries
//! - Executing them with credentials re-applied on every redirect hop
//! - Decoding the replies into [`MetricTuple`]s

pub mod category;
pub mod descriptor;
pub mod filter;
pub mod transport;
pub mod v1;
pub mod v2;

pub use category::{Category, Dialect, Platform};
pub use descriptor::{MetricDesc, MetricTuple, MetricType};

use std::collections::HashSet;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use crate::auth::CredentialManager;
use crate::config::{AuthConfig, DataSource, ScrapeConfig};
use crate::error::{SempError, SempResult};
use crate::scrape::SourceScraper;
use transport::PendingRequest;

/// Client for one broker
#[derive(Debug, Clone)]
pub struct SempClient {
    http: Client,
    credentials: CredentialManager,
    base_uri: String,
    default_vpn: String,
}

impl SempClient {
    /// Build the HTTP client from `scrape` and share it with the credential manager
    pub fn new(scrape: &ScrapeConfig, auth: AuthConfig) -> SempResult<Self> {
        let http = transport::build_client(scrape)?;
        let credentials = CredentialManager::new(auth, http.clone());
        Ok(Self::with_parts(http, credentials, scrape))
    }

    pub fn with_parts(http: Client, credentials: CredentialManager, scrape: &ScrapeConfig) -> Self {
        Self {
            http,
            credentials,
            base_uri: scrape.uri.trim_end_matches('/').to_string(),
            default_vpn: scrape.vpn.clone(),
        }
    }

    /// Scrape one data source.
    ///
    /// Requests are fully prepared (category, filters, metric selection) before
    /// credentials are obtained, so filter errors never reach the network.
    #[instrument(skip(self, source), fields(data_source = %source.name, broker = %self.base_uri))]
    pub async fn scrape_source(&self, source: &DataSource) -> SempResult<Vec<MetricTuple>> {
        let category: Category = source.name.parse()?;
        let vpn = if source.vpn_filter.trim().is_empty() {
            self.default_vpn.as_str()
        } else {
            source.vpn_filter.as_str()
        };

        match category.dialect() {
            Dialect::V1Xml => {
                let command = v1::command(category, vpn, &source.item_filter)?;
                let url = self.url(v1::SEMP_PATH)?;
                let decorator = self.credentials.obtain_decorator().await?;
                let body = transport::execute(
                    &self.http,
                    &decorator,
                    PendingRequest::post_xml(url, command),
                )
                .await?;
                v1::decode(category, &body)
            }
            Dialect::V2Json => {
                let mut query = v2::Query::build(
                    category,
                    &self.base_uri,
                    vpn,
                    &source.item_filter,
                    &source.metric_filter,
                )?;
                let decorator = self.credentials.obtain_decorator().await?;

                let mut tuples = Vec::new();
                let mut visited = HashSet::from([query.url.clone()]);
                loop {
                    let body = transport::execute(
                        &self.http,
                        &decorator,
                        PendingRequest::get(query.url.clone()),
                    )
                    .await?;
                    let page = query.decode(&body)?;
                    tuples.extend(page.tuples);
                    match page.next {
                        Some(next) if !visited.insert(next.clone()) => {
                            return Err(SempError::json(format!(
                                "nextPageUri {} revisits an earlier page",
                                next
                            )));
                        }
                        Some(next) => query = query.with_url(next),
                        None => break,
                    }
                }
                debug!(
                    pages = visited.len(),
                    tuples = tuples.len(),
                    "Collected SEMP v2 collection"
                );
                Ok(tuples)
            }
        }
    }

    fn url(&self, path: &str) -> SempResult<Url> {
        let raw = format!("{}{}", self.base_uri, path);
        Url::parse(&raw).map_err(|e| SempError::Decode {
            dialect: "URL",
            message: format!("{}: {}", raw, e),
        })
    }
}

#[async_trait]
impl SourceScraper for SempClient {
    async fn scrape(&self, source: &DataSource) -> SempResult<Vec<MetricTuple>> {
        self.scrape_source(source).await
    }
}
