//! `show bridge <pattern> message-vpn <pattern> stats`

use serde::Deserialize;

use super::decode_show;
use crate::error::SempResult;
use crate::semp::descriptor::{emit, encode_bool, Field, MetricDesc, MetricTuple};

const LABELS: &[&str] = &["vpn_name", "bridge_name"];

pub(super) fn command(vpn: &str, item: &str) -> String {
    format!(
        "<rpc><show><bridge><bridge-name-pattern>{}</bridge-name-pattern><vpn-name-pattern>{}</vpn-name-pattern><stats/></bridge></show></rpc>",
        item, vpn
    )
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Show {
    bridge: BridgeSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BridgeSection {
    bridges: Bridges,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Bridges {
    bridge: Vec<Bridge>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub(super) struct Bridge {
    bridge_name: String,
    local_vpn_name: String,
    client: Client,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct Client {
    num_subscriptions: f64,
    slow_subscriber: bool,
    stats: Stats,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct Stats {
    total_client_messages_received: f64,
    total_client_messages_sent: f64,
    client_data_messages_received: f64,
    client_data_messages_sent: f64,
    client_persistent_messages_received: f64,
    client_persistent_messages_sent: f64,
    client_non_persistent_messages_received: f64,
    client_non_persistent_messages_sent: f64,
    client_direct_messages_received: f64,
    client_direct_messages_sent: f64,

    total_client_bytes_received: f64,
    total_client_bytes_sent: f64,
    client_data_bytes_received: f64,
    client_data_bytes_sent: f64,
    client_persistent_bytes_received: f64,
    client_persistent_bytes_sent: f64,
    client_non_persistent_bytes_received: f64,
    client_non_persistent_bytes_sent: f64,
    client_direct_bytes_received: f64,
    client_direct_bytes_sent: f64,

    large_messages_received: f64,
    denied_duplicate_clients: f64,
    not_enough_space_msgs_sent: f64,
    max_exceeded_msgs_sent: f64,
    subscribe_client_not_found: f64,
    not_found_msgs_sent: f64,
    current_ingress_rate_per_second: f64,
    current_egress_rate_per_second: f64,
    ingress_discards: IngressDiscards,
    egress_discards: EgressDiscards,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct IngressDiscards {
    total_ingress_discards: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct EgressDiscards {
    total_egress_discards: f64,
}

macro_rules! bridge_field {
    ($key:literal, $help:literal, $($path:ident).+) => {
        Field {
            desc: MetricDesc::gauge($key, $help, LABELS),
            value: |b: &Bridge| b.client.stats.$($path).+,
        }
    };
}

pub(super) static FIELDS: &[Field<Bridge>] = &[
    Field {
        desc: MetricDesc::gauge("bridge_client_num_subscriptions", "Bridge number of subscriptions.", LABELS),
        value: |b| b.client.num_subscriptions,
    },
    Field {
        desc: MetricDesc::gauge("bridge_client_slow_subscriber", "Bridge is a slow subscriber (0/1).", LABELS),
        value: |b| encode_bool(b.client.slow_subscriber),
    },
    bridge_field!("bridge_total_client_messages_received", "Bridge total number of messages received.", total_client_messages_received),
    bridge_field!("bridge_total_client_messages_sent", "Bridge total number of messages sent.", total_client_messages_sent),
    bridge_field!("bridge_client_data_messages_received", "Bridge number of data messages received.", client_data_messages_received),
    bridge_field!("bridge_client_data_messages_sent", "Bridge number of data messages sent.", client_data_messages_sent),
    bridge_field!("bridge_client_persistent_messages_received", "Bridge number of persistent messages received.", client_persistent_messages_received),
    bridge_field!("bridge_client_persistent_messages_sent", "Bridge number of persistent messages sent.", client_persistent_messages_sent),
    bridge_field!("bridge_client_nonpersistent_messages_received", "Bridge number of non-persistent messages received.", client_non_persistent_messages_received),
    bridge_field!("bridge_client_nonpersistent_messages_sent", "Bridge number of non-persistent messages sent.", client_non_persistent_messages_sent),
    bridge_field!("bridge_client_direct_messages_received", "Bridge number of direct messages received.", client_direct_messages_received),
    bridge_field!("bridge_client_direct_messages_sent", "Bridge number of direct messages sent.", client_direct_messages_sent),
    bridge_field!("bridge_total_client_bytes_received", "Bridge total number of bytes received.", total_client_bytes_received),
    bridge_field!("bridge_total_client_bytes_sent", "Bridge total number of bytes sent.", total_client_bytes_sent),
    bridge_field!("bridge_client_data_bytes_received", "Bridge number of data bytes received.", client_data_bytes_received),
    bridge_field!("bridge_client_data_bytes_sent", "Bridge number of data bytes sent.", client_data_bytes_sent),
    bridge_field!("bridge_client_persistent_bytes_received", "Bridge number of persistent bytes received.", client_persistent_bytes_received),
    bridge_field!("bridge_client_persistent_bytes_sent", "Bridge number of persistent bytes sent.", client_persistent_bytes_sent),
    bridge_field!("bridge_client_nonpersistent_bytes_received", "Bridge number of non-persistent bytes received.", client_non_persistent_bytes_received),
    bridge_field!("bridge_client_nonpersistent_bytes_sent", "Bridge number of non-persistent bytes sent.", client_non_persistent_bytes_sent),
    bridge_field!("bridge_client_direct_bytes_received", "Bridge number of direct bytes received.", client_direct_bytes_received),
    bridge_field!("bridge_client_direct_bytes_sent", "Bridge number of direct bytes sent.", client_direct_bytes_sent),
    bridge_field!("bridge_client_large_messages_received", "Bridge number of large messages received.", large_messages_received),
    bridge_field!("bridge_denied_duplicate_clients", "Bridge number of denied duplicate clients.", denied_duplicate_clients),
    bridge_field!("bridge_not_enough_space_msgs_sent", "Bridge number of messages not sent due to insufficient space.", not_enough_space_msgs_sent),
    bridge_field!("bridge_max_exceeded_msgs_sent", "Bridge number of messages not sent due to max exceeded.", max_exceeded_msgs_sent),
    bridge_field!("bridge_subscribe_client_not_found", "Bridge number of subscribe requests with client not found.", subscribe_client_not_found),
    bridge_field!("bridge_not_found_msgs_sent", "Bridge number of messages not sent due to not found.", not_found_msgs_sent),
    bridge_field!("bridge_current_ingress_rate_per_second", "Bridge current ingress rate in messages per second.", current_ingress_rate_per_second),
    bridge_field!("bridge_current_egress_rate_per_second", "Bridge current egress rate in messages per second.", current_egress_rate_per_second),
    bridge_field!("bridge_total_ingress_discards", "Bridge total number of ingress discards.", ingress_discards.total_ingress_discards),
    bridge_field!("bridge_total_egress_discards", "Bridge total number of egress discards.", egress_discards.total_egress_discards),
];

pub(super) fn decode(body: &str) -> SempResult<Vec<MetricTuple>> {
    let show: Show = decode_show(body)?;
    let mut out = Vec::with_capacity(show.bridge.bridges.bridge.len() * FIELDS.len());
    for bridge in &show.bridge.bridges.bridge {
        emit(
            FIELDS,
            bridge,
            &[&bridge.local_vpn_name, &bridge.bridge_name],
            &mut out,
        );
    }
    Ok(out)
}
