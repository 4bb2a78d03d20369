//! `show message-vpn <pattern> stats`

use serde::Deserialize;

use super::decode_show;
use crate::error::SempResult;
use crate::semp::descriptor::{emit, encode_bool, Field, MetricDesc, MetricTuple};

const LABELS: &[&str] = &["vpn_name"];

pub(super) fn command(vpn: &str) -> String {
    format!(
        "<rpc><show><message-vpn><vpn-name>{}</vpn-name><stats/></message-vpn></show></rpc>",
        vpn
    )
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct Show {
    message_vpn: MessageVpn,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MessageVpn {
    vpn: Vec<Vpn>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub(super) struct Vpn {
    name: String,
    local_status: String,
    connections: f64,
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
    ingress_discards: Discards,
    egress_discards: EgressDiscards,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct Discards {
    total_ingress_discards: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct EgressDiscards {
    total_egress_discards: f64,
}

pub(super) static FIELDS: &[Field<Vpn>] = &[
    Field {
        desc: MetricDesc::gauge("vpn_local_status_up", "VPN local status is Up (0/1).", LABELS),
        value: |v| encode_bool(v.local_status.eq_ignore_ascii_case("up")),
    },
    Field {
        desc: MetricDesc::gauge("vpn_connections", "Number of client connections.", LABELS),
        value: |v| v.connections,
    },
    Field {
        desc: MetricDesc::counter("vpn_total_client_messages_received", "Total messages received from clients.", LABELS),
        value: |v| v.stats.total_client_messages_received,
    },
    Field {
        desc: MetricDesc::counter("vpn_total_client_messages_sent", "Total messages sent to clients.", LABELS),
        value: |v| v.stats.total_client_messages_sent,
    },
    Field {
        desc: MetricDesc::counter("vpn_total_client_bytes_received", "Total bytes received from clients.", LABELS),
        value: |v| v.stats.total_client_bytes_received,
    },
    Field {
        desc: MetricDesc::counter("vpn_total_client_bytes_sent", "Total bytes sent to clients.", LABELS),
        value: |v| v.stats.total_client_bytes_sent,
    },
    Field {
        desc: MetricDesc::gauge("vpn_current_ingress_rate_per_second", "Current ingress message rate.", LABELS),
        value: |v| v.stats.current_ingress_rate_per_second,
    },
    Field {
        desc: MetricDesc::gauge("vpn_current_egress_rate_per_second", "Current egress message rate.", LABELS),
        value: |v| v.stats.current_egress_rate_per_second,
    },
    Field {
        desc: MetricDesc::counter("vpn_total_ingress_discards", "Total ingress discards.", LABELS),
        value: |v| v.stats.ingress_discards.total_ingress_discards,
    },
    Field {
        desc: MetricDesc::counter("vpn_total_egress_discards", "Total egress discards.", LABELS),
        value: |v| v.stats.egress_discards.total_egress_discards,
    },
];

pub(super) fn decode(body: &str) -> SempResult<Vec<MetricTuple>> {
    let show: Show = decode_show(body)?;
    let mut out = Vec::with_capacity(show.message_vpn.vpn.len() * FIELDS.len());
    for vpn in &show.message_vpn.vpn {
        emit(FIELDS, vpn, &[&vpn.name], &mut out);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semp::v1::fixtures::reply;

    #[test]
    fn test_decode_two_vpns() {
        let body = reply(
            r#"<message-vpn>
  <vpn><name>default</name><local-status>Up</local-status><connections>4</connections>
    <stats><total-client-messages-received>10</total-client-messages-received>
      <ingress-discards><total-ingress-discards>2</total-ingress-discards></ingress-discards>
    </stats></vpn>
  <vpn><name>other</name><local-status>Down</local-status></vpn>
</message-vpn>"#,
            "ok",
        );
        let tuples = decode(&body).unwrap();
        assert_eq!(tuples.len(), 2 * FIELDS.len());

        let first: Vec<_> = tuples.iter().filter(|t| t.labels == vec!["default"]).collect();
        assert_eq!(first.len(), FIELDS.len());
        assert_eq!(first[0].value, 1.0);
        assert_eq!(first[1].value, 4.0);
        assert_eq!(first[2].value, 10.0);
        assert_eq!(first[8].value, 2.0);

        let second: Vec<_> = tuples.iter().filter(|t| t.labels == vec!["other"]).collect();
        assert!(second.iter().all(|t| t.value == 0.0));
    }

    #[test]
    fn test_command() {
        assert_eq!(
            command("*"),
            "<rpc><show><message-vpn><vpn-name>*</vpn-name><stats/></message-vpn></show></rpc>"
        );
    }
}
