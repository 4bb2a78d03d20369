//! `show queue <pattern> message-vpn <pattern> detail`

use serde::Deserialize;

use super::decode_show;
use crate::error::SempResult;
use crate::semp::descriptor::{emit, encode_bool, Field, MetricDesc, MetricTuple};

const LABELS: &[&str] = &["vpn_name", "queue_name"];

const MEGABYTE: f64 = 1_048_576.0;

pub(super) fn command(vpn: &str, item: &str) -> String {
    format!(
        "<rpc><show><queue><name>{}</name><vpn-name>{}</vpn-name><detail/></queue></show></rpc>",
        item, vpn
    )
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Show {
    queue: QueueSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QueueSection {
    queues: Queues,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Queues {
    queue: Vec<Queue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct Queue {
    name: String,
    info: Info,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct Info {
    message_vpn: String,
    current_spool_usage_in_mb: f64,
    num_messages_spooled: f64,
    high_water_mark_in_mb: f64,
    bind_count: f64,
    ingress_config_status: String,
    egress_config_status: String,
}

pub(super) static FIELDS: &[Field<Queue>] = &[
    Field {
        desc: MetricDesc::gauge("queue_spool_usage_bytes", "Queue spool usage in bytes.", LABELS),
        value: |q| q.info.current_spool_usage_in_mb * MEGABYTE,
    },
    Field {
        desc: MetricDesc::gauge("queue_spool_usage_msgs", "Queue spooled number of messages.", LABELS),
        value: |q| q.info.num_messages_spooled,
    },
    Field {
        desc: MetricDesc::gauge("queue_spool_hwm_bytes", "Queue spool high water mark in bytes.", LABELS),
        value: |q| q.info.high_water_mark_in_mb * MEGABYTE,
    },
    Field {
        desc: MetricDesc::gauge("queue_binds", "Number of clients bound to the queue.", LABELS),
        value: |q| q.info.bind_count,
    },
    Field {
        desc: MetricDesc::gauge("queue_ingress_up", "Queue ingress is Up (0/1).", LABELS),
        value: |q| encode_bool(q.info.ingress_config_status.eq_ignore_ascii_case("up")),
    },
    Field {
        desc: MetricDesc::gauge("queue_egress_up", "Queue egress is Up (0/1).", LABELS),
        value: |q| encode_bool(q.info.egress_config_status.eq_ignore_ascii_case("up")),
    },
];

pub(super) fn decode(body: &str) -> SempResult<Vec<MetricTuple>> {
    let show: Show = decode_show(body)?;
    let mut out = Vec::with_capacity(show.queue.queues.queue.len() * FIELDS.len());
    for queue in &show.queue.queues.queue {
        emit(FIELDS, queue, &[&queue.info.message_vpn, &queue.name], &mut out);
    }
    Ok(out)
}
