//! Schema-to-tuple tables for the v2 collections

use crate::semp::category::Category;
use crate::semp::descriptor::{JsonField, MetricDesc};

/// Which data source filter the `where` clause matches against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterTarget {
    Vpn,
    Item,
}

#[derive(Debug)]
pub struct Schema {
    /// Collection path below the monitor root, given the escaped VPN filter
    pub collection: fn(&str) -> String,
    pub where_attribute: &'static str,
    pub filter: FilterTarget,
    /// JSON attributes backing the descriptor labels, in label order
    pub label_attributes: &'static [&'static str],
    pub fields: &'static [JsonField],
}

const fn gauge(key: &'static str, help: &'static str, labels: &'static [&'static str], attribute: &'static str) -> JsonField {
    JsonField {
        desc: MetricDesc::gauge(key, help, labels),
        attribute,
    }
}

const fn counter(key: &'static str, help: &'static str, labels: &'static [&'static str], attribute: &'static str) -> JsonField {
    JsonField {
        desc: MetricDesc::counter(key, help, labels),
        attribute,
    }
}

const VPN_LABELS: &[&str] = &["vpn_name"];
const QUEUE_LABELS: &[&str] = &["vpn_name", "queue_name"];
const CLIENT_LABELS: &[&str] = &["vpn_name", "client_name", "client_username"];

static VPN: Schema = Schema {
    collection: |_| "/msgVpns".to_string(),
    where_attribute: "msgVpnName",
    filter: FilterTarget::Vpn,
    label_attributes: &["msgVpnName"],
    fields: &[
        gauge("vpn_rx_msg_rate", "Current ingress message rate.", VPN_LABELS, "rxMsgRate"),
        gauge("vpn_tx_msg_rate", "Current egress message rate.", VPN_LABELS, "txMsgRate"),
        gauge("vpn_rx_byte_rate", "Current ingress byte rate.", VPN_LABELS, "rxByteRate"),
        gauge("vpn_tx_byte_rate", "Current egress byte rate.", VPN_LABELS, "txByteRate"),
        gauge("vpn_msg_spool_usage_bytes", "Message spool usage in bytes.", VPN_LABELS, "msgSpoolUsage"),
        gauge("vpn_msg_spool_msgs", "Number of spooled messages.", VPN_LABELS, "msgSpoolMsgCount"),
        counter("vpn_data_rx_msgs_total", "Data messages received.", VPN_LABELS, "dataRxMsgCount"),
        counter("vpn_data_tx_msgs_total", "Data messages sent.", VPN_LABELS, "dataTxMsgCount"),
        gauge("vpn_enabled", "VPN is enabled (0/1).", VPN_LABELS, "enabled"),
    ],
};

static QUEUE: Schema = Schema {
    collection: |vpn| format!("/msgVpns/{}/queues", vpn),
    where_attribute: "queueName",
    filter: FilterTarget::Item,
    label_attributes: &["msgVpnName", "queueName"],
    fields: &[
        gauge("queue_rx_msg_rate", "Current ingress message rate.", QUEUE_LABELS, "rxMsgRate"),
        gauge("queue_tx_msg_rate", "Current egress message rate.", QUEUE_LABELS, "txMsgRate"),
        gauge("queue_msg_spool_usage_bytes", "Queue spool usage in bytes.", QUEUE_LABELS, "msgSpoolUsage"),
        gauge("queue_bind_count", "Number of consumers bound.", QUEUE_LABELS, "bindCount"),
        counter("queue_spooled_msgs_total", "Messages spooled to the queue.", QUEUE_LABELS, "spooledMsgCount"),
        counter("queue_redelivered_msgs_total", "Messages redelivered from the queue.", QUEUE_LABELS, "redeliveredMsgCount"),
    ],
};

static CLIENT: Schema = Schema {
    collection: |vpn| format!("/msgVpns/{}/clients", vpn),
    where_attribute: "clientName",
    filter: FilterTarget::Item,
    label_attributes: &["msgVpnName", "clientName", "clientUsername"],
    fields: &[
        gauge("client_rx_msg_rate", "Current ingress message rate.", CLIENT_LABELS, "rxMsgRate"),
        gauge("client_tx_msg_rate", "Current egress message rate.", CLIENT_LABELS, "txMsgRate"),
        gauge("client_rx_byte_rate", "Current ingress byte rate.", CLIENT_LABELS, "rxByteRate"),
        gauge("client_tx_byte_rate", "Current egress byte rate.", CLIENT_LABELS, "txByteRate"),
        gauge("client_uptime_seconds", "Time since the client connected.", CLIENT_LABELS, "uptime"),
        counter("client_data_rx_msgs_total", "Data messages received from the client.", CLIENT_LABELS, "dataRxMsgCount"),
        counter("client_data_tx_msgs_total", "Data messages sent to the client.", CLIENT_LABELS, "dataTxMsgCount"),
    ],
};

/// Schema for a v2 category, `None` for v1 categories
pub fn schema(category: Category) -> Option<&'static Schema> {
    match category {
        Category::VpnStatsV2 => Some(&VPN),
        Category::QueueStatsV2 => Some(&QUEUE),
        Category::ClientStatsV2 => Some(&CLIENT),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_attributes_match_descriptors() {
        for category in Category::ALL {
            let Some(schema) = schema(*category) else {
                continue;
            };
            for field in schema.fields {
                assert_eq!(
                    field.desc.labels.len(),
                    schema.label_attributes.len(),
                    "{}",
                    field.desc.key
                );
            }
        }
    }

    #[test]
    fn test_collection_paths() {
        assert_eq!((QUEUE.collection)("v1"), "/msgVpns/v1/queues");
        assert_eq!((VPN.collection)("ignored"), "/msgVpns");
    }
}
