//! SEMP v1 (XML/RPC) dialect
//!
//! Requests are `<rpc><show>...</show></rpc>` commands posted to `/SEMP`;
//! replies are `<rpc-reply>` documents whose `<execute-result code="...">`
//! must be `ok` before the body is trusted.

mod bridge;
mod client;
mod queue;
mod system;
mod vpn;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::category::Category;
use super::descriptor::{MetricDesc, MetricTuple};
use super::filter::escape_xml;
use crate::error::{SempError, SempResult};

/// Path of the SEMP v1 endpoint relative to the broker URI
pub const SEMP_PATH: &str = "/SEMP";

/// Only the result code of a reply
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "execute-result")]
    execute_result: Option<ExecuteResult>,
}

#[derive(Debug, Deserialize)]
struct ExecuteResult {
    #[serde(rename = "@code", default)]
    code: String,
}

#[derive(Debug, Deserialize)]
struct Reply<S> {
    rpc: Option<Rpc<S>>,
}

#[derive(Debug, Deserialize)]
struct Rpc<S> {
    show: Option<S>,
}

/// Check the result code, then decode the `<show>` body
pub(crate) fn decode_show<S>(body: &str) -> SempResult<S>
where
    S: DeserializeOwned + Default,
{
    let envelope: Envelope = quick_xml::de::from_str(body).map_err(SempError::xml)?;
    let code = envelope
        .execute_result
        .map(|r| r.code)
        .ok_or_else(|| SempError::xml("missing execute-result"))?;
    if code != "ok" {
        return Err(SempError::UnexpectedResult { code });
    }

    let reply: Reply<S> = quick_xml::de::from_str(body).map_err(SempError::xml)?;
    Ok(reply.rpc.and_then(|rpc| rpc.show).unwrap_or_default())
}

/// Build the RPC command for a category; filters are XML-escaped
pub fn command(category: Category, vpn_filter: &str, item_filter: &str) -> SempResult<String> {
    let vpn = escape_xml(vpn_filter);
    let item = escape_xml(item_filter);
    let command = match category {
        Category::Version => system::version_command(),
        Category::Health => system::health_command(),
        Category::Disk => system::disk_command(),
        Category::Redundancy => system::redundancy_command(),
        Category::VpnStats => vpn::command(&vpn),
        Category::BridgeStats => bridge::command(&vpn, &item),
        Category::QueueDetails => queue::command(&vpn, &item),
        Category::ClientStats => client::command(&vpn, &item),
        other => return Err(SempError::UnknownCategory(other.to_string())),
    };
    Ok(command)
}

/// Decode a reply for a category into metric tuples
pub fn decode(category: Category, body: &str) -> SempResult<Vec<MetricTuple>> {
    match category {
        Category::Version => system::decode_version(body),
        Category::Health => system::decode_health(body),
        Category::Disk => system::decode_disk(body),
        Category::Redundancy => system::decode_redundancy(body),
        Category::VpnStats => vpn::decode(body),
        Category::BridgeStats => bridge::decode(body),
        Category::QueueDetails => queue::decode(body),
        Category::ClientStats => client::decode(body),
        other => Err(SempError::UnknownCategory(other.to_string())),
    }
}

pub(crate) fn descriptors(category: Category) -> Vec<&'static MetricDesc> {
    match category {
        Category::Version => system::version_descriptors(),
        Category::Health => system::HEALTH_FIELDS.iter().map(|f| &f.desc).collect(),
        Category::Disk => system::DISK_FIELDS.iter().map(|f| &f.desc).collect(),
        Category::Redundancy => system::REDUNDANCY_FIELDS.iter().map(|f| &f.desc).collect(),
        Category::VpnStats => vpn::FIELDS.iter().map(|f| &f.desc).collect(),
        Category::BridgeStats => bridge::FIELDS.iter().map(|f| &f.desc).collect(),
        Category::QueueDetails => queue::FIELDS.iter().map(|f| &f.desc).collect(),
        Category::ClientStats => client::FIELDS.iter().map(|f| &f.desc).collect(),
        _ => Vec::new(),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Deserialize)]
    struct Empty {}

    #[test]
    fn test_non_ok_result_is_rejected() {
        let body = fixtures::reply("", "fail");
        match decode_show::<Empty>(&body) {
            Err(SempError::UnexpectedResult { code }) => assert_eq!(code, "fail"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_missing_execute_result_is_decode_error() {
        let body = "<rpc-reply><rpc><show/></rpc></rpc-reply>";
        assert!(matches!(
            decode_show::<Empty>(body),
            Err(SempError::Decode { .. })
        ));
    }

    #[test]
    fn test_malformed_xml_is_decode_error() {
        assert!(matches!(
            decode_show::<Empty>("<rpc-reply><rpc>"),
            Err(SempError::Decode { .. })
        ));
    }

    #[test]
    fn test_commands_escape_filters() {
        let cmd = command(Category::BridgeStats, "v<1>", "b&*").unwrap();
        assert!(cmd.contains("<vpn-name-pattern>v&lt;1&gt;</vpn-name-pattern>"));
        assert!(cmd.contains("<bridge-name-pattern>b&amp;*</bridge-name-pattern>"));
    }

    #[test]
    fn test_v2_category_has_no_v1_command() {
        assert!(command(Category::QueueStatsV2, "*", "*").is_err());
    }
}
