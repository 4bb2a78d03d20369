//! Metric descriptors and decoded metric tuples
//!
//! Every category declares its metrics as a static table of [`Field`]s. A field
//! pairs the descriptor (name, help, label schema) with the accessor that reads
//! the value from one decoded item, so the label order a decoder emits is the
//! order the descriptor declares.

use serde_json::Value;

/// Prometheus metric type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Gauge,
    Counter,
}

impl MetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Gauge => "gauge",
            MetricType::Counter => "counter",
        }
    }
}

/// Fully-qualified descriptor of one metric
#[derive(Debug, PartialEq, Eq)]
pub struct MetricDesc {
    /// Key within the category; the family name is `solace_<key>`
    pub key: &'static str,
    pub help: &'static str,
    pub labels: &'static [&'static str],
    pub metric_type: MetricType,
}

impl MetricDesc {
    pub const fn gauge(
        key: &'static str,
        help: &'static str,
        labels: &'static [&'static str],
    ) -> Self {
        Self {
            key,
            help,
            labels,
            metric_type: MetricType::Gauge,
        }
    }

    pub const fn counter(
        key: &'static str,
        help: &'static str,
        labels: &'static [&'static str],
    ) -> Self {
        Self {
            key,
            help,
            labels,
            metric_type: MetricType::Counter,
        }
    }

    pub fn family_name(&self) -> String {
        format!("solace_{}", self.key)
    }
}

/// One decoded sample: descriptor, value and label values in descriptor order
#[derive(Debug, Clone, PartialEq)]
pub struct MetricTuple {
    pub desc: &'static MetricDesc,
    pub value: f64,
    pub labels: Vec<String>,
}

impl MetricTuple {
    pub fn key(&self) -> &'static str {
        self.desc.key
    }
}

/// Descriptor plus accessor for one item type
pub struct Field<T> {
    pub desc: MetricDesc,
    pub value: fn(&T) -> f64,
}

/// Descriptor plus JSON attribute name for SEMP v2 objects
#[derive(Debug)]
pub struct JsonField {
    pub desc: MetricDesc,
    pub attribute: &'static str,
}

/// Emit one tuple per field for `item`
pub fn emit<T>(fields: &'static [Field<T>], item: &T, labels: &[&str], out: &mut Vec<MetricTuple>) {
    for field in fields {
        debug_assert_eq!(field.desc.labels.len(), labels.len(), "{}", field.desc.key);
        out.push(MetricTuple {
            desc: &field.desc,
            value: (field.value)(item),
            labels: labels.iter().map(|l| l.to_string()).collect(),
        });
    }
}

/// Canonical 0/1 gauge encoding for booleans
pub fn encode_bool(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Numeric view of a SEMP v2 attribute. Missing or non-numeric attributes read as 0.
pub fn json_number(object: &Value, attribute: &str) -> f64 {
    match object.get(attribute) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::Bool(b)) => encode_bool(*b),
        Some(Value::String(s)) => s.parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// String view of a SEMP v2 label attribute. Missing attributes read as "".
pub fn json_label(object: &Value, attribute: &str) -> String {
    match object.get(attribute) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
