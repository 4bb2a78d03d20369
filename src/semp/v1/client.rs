//! `show client <pattern> message-vpn <pattern> stats`

use serde::Deserialize;

use super::decode_show;
use crate::error::SempResult;
use crate::semp::descriptor::{emit, encode_bool, Field, MetricDesc, MetricTuple};

const LABELS: &[&str] = &["vpn_name", "client_name", "client_username"];

pub(super) fn command(vpn: &str, item: &str) -> String {
    format!(
        "<rpc><show><client><name>{}</name><vpn-name>{}</vpn-name><stats/></client></show></rpc>",
        item, vpn
    )
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Show {
    client: ClientSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct ClientSection {
    primary_virtual_router: Router,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Router {
    client: Vec<Client>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub(super) struct Client {
    name: String,
    message_vpn: String,
    client_username: String,
    slow_subscriber: bool,
    stats: Stats,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct Stats {
    total_client_messages_received: f64,
    total_client_messages_sent: f64,
    total_client_bytes_received: f64,
    total_client_bytes_sent: f64,
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

pub(super) static FIELDS: &[Field<Client>] = &[
    Field {
        desc: MetricDesc::gauge("client_slow_subscriber", "Client is a slow subscriber (0/1).", LABELS),
        value: |c| encode_bool(c.slow_subscriber),
    },
    Field {
        desc: MetricDesc::counter("client_total_messages_received", "Messages received from the client.", LABELS),
        value: |c| c.stats.total_client_messages_received,
    },
    Field {
        desc: MetricDesc::counter("client_total_messages_sent", "Messages sent to the client.", LABELS),
        value: |c| c.stats.total_client_messages_sent,
    },
    Field {
        desc: MetricDesc::counter("client_total_bytes_received", "Bytes received from the client.", LABELS),
        value: |c| c.stats.total_client_bytes_received,
    },
    Field {
        desc: MetricDesc::counter("client_total_bytes_sent", "Bytes sent to the client.", LABELS),
        value: |c| c.stats.total_client_bytes_sent,
    },
    Field {
        desc: MetricDesc::gauge("client_current_ingress_rate_per_second", "Current ingress message rate.", LABELS),
        value: |c| c.stats.current_ingress_rate_per_second,
    },
    Field {
        desc: MetricDesc::gauge("client_current_egress_rate_per_second", "Current egress message rate.", LABELS),
        value: |c| c.stats.current_egress_rate_per_second,
    },
    Field {
        desc: MetricDesc::counter("client_total_ingress_discards", "Ingress discards for the client.", LABELS),
        value: |c| c.stats.ingress_discards.total_ingress_discards,
    },
    Field {
        desc: MetricDesc::counter("client_total_egress_discards", "Egress discards for the client.", LABELS),
        value: |c| c.stats.egress_discards.total_egress_discards,
    },
];

pub(super) fn decode(body: &str) -> SempResult<Vec<MetricTuple>> {
    let show: Show = decode_show(body)?;
    let clients = &show.client.primary_virtual_router.client;
    let mut out = Vec::with_capacity(clients.len() * FIELDS.len());
    for client in clients {
        emit(
            FIELDS,
            client,
            &[&client.message_vpn, &client.name, &client.client_username],
            &mut out,
        );
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semp::v1::fixtures::reply;

    #[test]
    fn test_decode_clients() {
        let body = reply(
            r#"<client><primary-virtual-router>
  <client><name>app-1</name><message-vpn>default</message-vpn><client-username>svc</client-username>
    <slow-subscriber>false</slow-subscriber>
    <stats><total-client-messages-sent>42</total-client-messages-sent>
      <egress-discards><total-egress-discards>3</total-egress-discards></egress-discards>
    </stats></client>
  <client><name>app-2</name><message-vpn>default</message-vpn><client-username>svc</client-username>
    <slow-subscriber>true</slow-subscriber></client>
</primary-virtual-router></client>"#,
            "ok",
        );
        let tuples = decode(&body).unwrap();
        assert_eq!(tuples.len(), 2 * FIELDS.len());

        let sent = tuples
            .iter()
            .find(|t| t.key() == "client_total_messages_sent" && t.labels[1] == "app-1")
            .unwrap();
        assert_eq!(sent.value, 42.0);
        assert_eq!(sent.labels, vec!["default", "app-1", "svc"]);

        let slow = tuples
            .iter()
            .find(|t| t.key() == "client_slow_subscriber" && t.labels[1] == "app-2")
            .unwrap();
        assert_eq!(slow.value, 1.0);

        for tuple in &tuples {
            assert_eq!(tuple.labels.len(), tuple.desc.labels.len());
        }
    }

    #[test]
    fn test_command() {
        assert!(command("default", "app*").contains("<name>app*</name><vpn-name>default</vpn-name>"));
    }
}
