//! SEMP v2 (REST/JSON) monitoring dialect
//!
//! Each category is a collection under `/SEMP/v2/monitor`. Requests select only
//! the attributes backing the requested metrics plus the label attributes, and
//! filter by name with a `where` clause. Collections are paged through
//! `meta.paging.nextPageUri`.

mod schema;

pub use schema::{schema, FilterTarget, Schema};

use serde::Deserialize;
use serde_json::Value;
use url::Url;

use super::category::Category;
use super::descriptor::{json_label, json_number, JsonField, MetricTuple};
use super::filter::{escape_query_value, translate_items};
use crate::error::{SempError, SempResult};

/// Path of the v2 monitoring API relative to the broker URI
pub const MONITOR_PATH: &str = "/SEMP/v2/monitor";

/// Objects requested per page
pub const PAGE_COUNT: u32 = 100;

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(default)]
    data: Value,
    #[serde(default)]
    meta: Meta,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Meta {
    response_code: Option<u16>,
    paging: Option<Paging>,
    error: Option<MetaError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Paging {
    next_page_uri: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MetaError {
    description: String,
}

/// One decoded page
#[derive(Debug)]
pub struct Page {
    pub tuples: Vec<MetricTuple>,
    pub next: Option<Url>,
}

/// A prepared collection query for one data source
#[derive(Debug, Clone)]
pub struct Query {
    pub url: Url,
    schema: &'static Schema,
    fields: Vec<&'static JsonField>,
}

impl Query {
    /// Build the first-page URL.
    ///
    /// `metric_filter` entries are metric keys or JSON attribute names; an
    /// empty filter selects every metric of the category.
    pub fn build(
        category: Category,
        base_uri: &str,
        vpn_filter: &str,
        item_filter: &str,
        metric_filter: &[String],
    ) -> SempResult<Self> {
        let schema = schema(category).ok_or_else(|| SempError::UnknownCategory(category.to_string()))?;
        let fields = select_fields(schema, metric_filter)?;

        let mut params = vec![format!("count={}", PAGE_COUNT)];
        let select: Vec<&str> = schema
            .label_attributes
            .iter()
            .copied()
            .chain(fields.iter().map(|f| f.attribute))
            .collect();
        params.push(format!("select={}", select.join(",")));

        let pattern = match schema.filter {
            FilterTarget::Vpn => vpn_filter,
            FilterTarget::Item => item_filter,
        };
        if !pattern.trim().is_empty() {
            params.push(format!(
                "where={}=={}",
                schema.where_attribute,
                escape_query_value(pattern)
            ));
        }

        let raw = format!(
            "{}{}{}?{}",
            base_uri.trim_end_matches('/'),
            MONITOR_PATH,
            (schema.collection)(&escape_query_value(vpn_filter)),
            params.join("&")
        );
        let url = Url::parse(&raw).map_err(|e| SempError::Decode {
            dialect: "URL",
            message: format!("{}: {}", raw, e),
        })?;

        Ok(Self {
            url,
            schema,
            fields,
        })
    }

    /// Decode one page of the collection
    pub fn decode(&self, body: &str) -> SempResult<Page> {
        let response: Response = serde_json::from_str(body).map_err(SempError::json)?;

        if let Some(code) = response.meta.response_code {
            if code != 200 {
                let description = response
                    .meta
                    .error
                    .map(|e| e.description)
                    .unwrap_or_default();
                return Err(SempError::json(format!(
                    "responseCode {}: {}",
                    code, description
                )));
            }
        }

        let objects: &[Value] = match &response.data {
            Value::Array(items) => items,
            Value::Object(_) => std::slice::from_ref(&response.data),
            _ => &[],
        };

        let mut tuples = Vec::with_capacity(objects.len() * self.fields.len());
        for object in objects {
            let labels: Vec<String> = self
                .schema
                .label_attributes
                .iter()
                .map(|attr| json_label(object, attr))
                .collect();
            for field in &self.fields {
                tuples.push(MetricTuple {
                    desc: &field.desc,
                    value: json_number(object, field.attribute),
                    labels: labels.clone(),
                });
            }
        }

        let next = match response.meta.paging.and_then(|p| p.next_page_uri) {
            Some(uri) if !uri.is_empty() => {
                let next = self.url.join(&uri).map_err(SempError::json)?;
                (next != self.url).then_some(next)
            }
            _ => None,
        };

        Ok(Page { tuples, next })
    }

    /// Same query pointed at a follow-up page
    pub fn with_url(&self, url: Url) -> Self {
        Self {
            url,
            ..self.clone()
        }
    }
}

fn select_fields(schema: &'static Schema, metric_filter: &[String]) -> SempResult<Vec<&'static JsonField>> {
    if metric_filter.is_empty() {
        return Ok(schema.fields.iter().collect());
    }

    let allowed: Vec<(&str, &str)> = schema
        .fields
        .iter()
        .map(|f| (f.desc.key, f.attribute))
        .collect();
    let wanted = translate_items(metric_filter, &allowed)?;

    Ok(schema
        .fields
        .iter()
        .filter(|f| wanted.iter().any(|w| w == f.attribute))
        .collect())
}
