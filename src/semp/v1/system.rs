//! Broker-wide system categories: version, health, disk and redundancy

use serde::Deserialize;

use super::decode_show;
use crate::error::SempResult;
use crate::semp::descriptor::{emit, encode_bool, Field, MetricDesc, MetricTuple};

pub(super) fn version_command() -> String {
    "<rpc><show><version/></show></rpc>".to_string()
}

pub(super) fn health_command() -> String {
    "<rpc><show><system><health/></system></show></rpc>".to_string()
}

pub(super) fn disk_command() -> String {
    "<rpc><show><disk><detail/></disk></show></rpc>".to_string()
}

pub(super) fn redundancy_command() -> String {
    "<rpc><show><redundancy/></show></rpc>".to_string()
}

// Version

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VersionShow {
    version: Version,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub(super) struct Version {
    current_load: String,
    uptime: Uptime,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct Uptime {
    total_secs: f64,
}

pub(super) static VERSION_FIELDS: &[Field<Version>] = &[Field {
    desc: MetricDesc::gauge(
        "system_version_uptime_totalsecs",
        "Broker uptime in seconds.",
        &[],
    ),
    value: |v| v.uptime.total_secs,
}];

pub(super) static VERSION_INFO_FIELDS: &[Field<Version>] = &[Field {
    desc: MetricDesc::gauge(
        "system_version_info",
        "Broker software load, always 1.",
        &["version"],
    ),
    value: |_| 1.0,
}];

pub(super) fn version_descriptors() -> Vec<&'static MetricDesc> {
    VERSION_FIELDS
        .iter()
        .chain(VERSION_INFO_FIELDS)
        .map(|f| &f.desc)
        .collect()
}

pub(super) fn decode_version(body: &str) -> SempResult<Vec<MetricTuple>> {
    let show: VersionShow = decode_show(body)?;
    let mut out = Vec::new();
    emit(VERSION_FIELDS, &show.version, &[], &mut out);
    emit(
        VERSION_INFO_FIELDS,
        &show.version,
        &[&show.version.current_load],
        &mut out,
    );
    Ok(out)
}

// Health

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HealthShow {
    system: HealthSystem,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HealthSystem {
    health: Health,
}

/// Latencies are reported in microseconds
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub(super) struct Health {
    disk_latency_minimum_value: f64,
    disk_latency_maximum_value: f64,
    disk_latency_average_value: f64,
    disk_latency_current_value: f64,
    compute_latency_minimum_value: f64,
    compute_latency_maximum_value: f64,
    compute_latency_average_value: f64,
    compute_latency_current_value: f64,
    mate_link_latency_minimum_value: f64,
    mate_link_latency_maximum_value: f64,
    mate_link_latency_average_value: f64,
    mate_link_latency_current_value: f64,
}

const MICROS: f64 = 1e6;

macro_rules! latency_field {
    ($key:literal, $help:literal, $field:ident) => {
        Field {
            desc: MetricDesc::gauge($key, $help, &[]),
            value: |h: &Health| h.$field / MICROS,
        }
    };
}

pub(super) static HEALTH_FIELDS: &[Field<Health>] = &[
    latency_field!("system_disk_latency_min_seconds", "Minimum disk latency.", disk_latency_minimum_value),
    latency_field!("system_disk_latency_max_seconds", "Maximum disk latency.", disk_latency_maximum_value),
    latency_field!("system_disk_latency_avg_seconds", "Average disk latency.", disk_latency_average_value),
    latency_field!("system_disk_latency_cur_seconds", "Current disk latency.", disk_latency_current_value),
    latency_field!("system_compute_latency_min_seconds", "Minimum compute latency.", compute_latency_minimum_value),
    latency_field!("system_compute_latency_max_seconds", "Maximum compute latency.", compute_latency_maximum_value),
    latency_field!("system_compute_latency_avg_seconds", "Average compute latency.", compute_latency_average_value),
    latency_field!("system_compute_latency_cur_seconds", "Current compute latency.", compute_latency_current_value),
    latency_field!("system_mate_link_latency_min_seconds", "Minimum mate link latency.", mate_link_latency_minimum_value),
    latency_field!("system_mate_link_latency_max_seconds", "Maximum mate link latency.", mate_link_latency_maximum_value),
    latency_field!("system_mate_link_latency_avg_seconds", "Average mate link latency.", mate_link_latency_average_value),
    latency_field!("system_mate_link_latency_cur_seconds", "Current mate link latency.", mate_link_latency_current_value),
];

pub(super) fn decode_health(body: &str) -> SempResult<Vec<MetricTuple>> {
    let show: HealthShow = decode_show(body)?;
    let mut out = Vec::new();
    emit(HEALTH_FIELDS, &show.system.health, &[], &mut out);
    Ok(out)
}

// Disk

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DiskShow {
    disk: DiskSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct DiskSection {
    disk_infos: DiskInfos,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct DiskInfos {
    disk_info: Vec<DiskInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub(super) struct DiskInfo {
    number: String,
    state: String,
    enabled: bool,
}

const DISK_LABELS: &[&str] = &["disk"];

pub(super) static DISK_FIELDS: &[Field<DiskInfo>] = &[
    Field {
        desc: MetricDesc::gauge("system_disk_up", "Disk state is Up (0/1).", DISK_LABELS),
        value: |d| encode_bool(d.state.eq_ignore_ascii_case("up")),
    },
    Field {
        desc: MetricDesc::gauge("system_disk_enabled", "Disk is enabled (0/1).", DISK_LABELS),
        value: |d| encode_bool(d.enabled),
    },
];

pub(super) fn decode_disk(body: &str) -> SempResult<Vec<MetricTuple>> {
    let show: DiskShow = decode_show(body)?;
    let mut out = Vec::new();
    for disk in &show.disk.disk_infos.disk_info {
        emit(DISK_FIELDS, disk, &[&disk.number], &mut out);
    }
    Ok(out)
}

// Redundancy

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RedundancyShow {
    redundancy: Redundancy,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub(super) struct Redundancy {
    config_status: String,
    redundancy_status: String,
    active_standby_role: String,
    mate_router_name: String,
    virtual_routers: VirtualRouters,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VirtualRouters {
    primary: VirtualRouter,
    backup: VirtualRouter,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VirtualRouter {
    status: RouterStatus,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RouterStatus {
    activity: String,
}

impl Redundancy {
    fn role(&self) -> f64 {
        match self.active_standby_role.to_ascii_lowercase().as_str() {
            "primary" => 1.0,
            "backup" => 2.0,
            _ => 0.0,
        }
    }

    fn local_active(&self) -> bool {
        let routers = &self.virtual_routers;
        [&routers.primary, &routers.backup]
            .iter()
            .any(|r| r.status.activity.eq_ignore_ascii_case("local active"))
    }
}

const REDUNDANCY_LABELS: &[&str] = &["mate_name"];

pub(super) static REDUNDANCY_FIELDS: &[Field<Redundancy>] = &[
    Field {
        desc: MetricDesc::gauge(
            "system_redundancy_config",
            "Redundancy is configured (0/1).",
            REDUNDANCY_LABELS,
        ),
        value: |r| encode_bool(r.config_status.eq_ignore_ascii_case("enabled")),
    },
    Field {
        desc: MetricDesc::gauge(
            "system_redundancy_up",
            "Redundancy is up (0/1).",
            REDUNDANCY_LABELS,
        ),
        value: |r| encode_bool(r.redundancy_status.eq_ignore_ascii_case("up")),
    },
    Field {
        desc: MetricDesc::gauge(
            "system_redundancy_role",
            "Active-standby role: 0 none, 1 primary, 2 backup.",
            REDUNDANCY_LABELS,
        ),
        value: Redundancy::role,
    },
    Field {
        desc: MetricDesc::gauge(
            "system_redundancy_local_active",
            "This broker is the active one of the pair (0/1).",
            REDUNDANCY_LABELS,
        ),
        value: |r| encode_bool(r.local_active()),
    },
];

pub(super) fn decode_redundancy(body: &str) -> SempResult<Vec<MetricTuple>> {
    let show: RedundancyShow = decode_show(body)?;
    let mut out = Vec::new();
    emit(
        REDUNDANCY_FIELDS,
        &show.redundancy,
        &[&show.redundancy.mate_router_name],
        &mut out,
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semp::v1::fixtures::reply;

    fn value(tuples: &[MetricTuple], key: &str) -> f64 {
        tuples
            .iter()
            .find(|t| t.key() == key)
            .unwrap_or_else(|| panic!("missing {key}"))
            .value
    }

    #[test]
    fn test_decode_version() {
        let body = reply(
            "<version><description>Solace PubSub+</description><current-load>soltr_10.4.1.64</current-load><uptime><days>1</days><total-secs>90061</total-secs></uptime></version>",
            "ok",
        );
        let tuples = decode_version(&body).unwrap();
        assert_eq!(tuples.len(), 2);
        assert_eq!(value(&tuples, "system_version_uptime_totalsecs"), 90061.0);
        assert!(tuples[0].labels.is_empty());
        assert_eq!(tuples[1].labels, vec!["soltr_10.4.1.64"]);
        assert_eq!(tuples[1].value, 1.0);
    }

    #[test]
    fn test_decode_health_converts_micros() {
        let body = reply(
            "<system><health><disk-latency-minimum-value>250</disk-latency-minimum-value><compute-latency-current-value>1500000</compute-latency-current-value></health></system>",
            "ok",
        );
        let tuples = decode_health(&body).unwrap();
        assert_eq!(tuples.len(), HEALTH_FIELDS.len());
        assert_eq!(value(&tuples, "system_disk_latency_min_seconds"), 0.00025);
        assert_eq!(value(&tuples, "system_compute_latency_cur_seconds"), 1.5);
        assert_eq!(value(&tuples, "system_mate_link_latency_avg_seconds"), 0.0);
    }

    #[test]
    fn test_decode_disk_per_disk_labels() {
        let body = reply(
            "<disk><disk-infos><disk-info><number>1</number><state>Up</state><enabled>true</enabled></disk-info><disk-info><number>2</number><state>Down</state><enabled>false</enabled></disk-info></disk-infos></disk>",
            "ok",
        );
        let tuples = decode_disk(&body).unwrap();
        assert_eq!(tuples.len(), 4);
        assert_eq!(tuples[0].labels, vec!["1"]);
        assert_eq!(tuples[0].value, 1.0);
        assert_eq!(tuples[2].labels, vec!["2"]);
        assert_eq!(tuples[2].value, 0.0);
        assert_eq!(tuples[3].value, 0.0);
    }

    #[test]
    fn test_decode_redundancy() {
        let body = reply(
            "<redundancy><config-status>Enabled</config-status><redundancy-status>Up</redundancy-status><active-standby-role>Backup</active-standby-role><mate-router-name>mate1</mate-router-name><virtual-routers><primary><status><activity>Mate Active</activity></status></primary><backup><status><activity>Local Active</activity></status></backup></virtual-routers></redundancy>",
            "ok",
        );
        let tuples = decode_redundancy(&body).unwrap();
        assert_eq!(value(&tuples, "system_redundancy_config"), 1.0);
        assert_eq!(value(&tuples, "system_redundancy_up"), 1.0);
        assert_eq!(value(&tuples, "system_redundancy_role"), 2.0);
        assert_eq!(value(&tuples, "system_redundancy_local_active"), 1.0);
        assert!(tuples.iter().all(|t| t.labels == vec!["mate1"]));
    }

    #[test]
    fn test_static_commands() {
        assert_eq!(version_command(), "<rpc><show><version/></show></rpc>");
        assert_eq!(redundancy_command(), "<rpc><show><redundancy/></show></rpc>");
        assert!(health_command().contains("<health/>"));
        assert!(disk_command().contains("<detail/>"));
    }
}
