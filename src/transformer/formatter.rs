//! Prometheus Exposition Format output
//!
//! This module handles formatting of metric tuples into the text exposition
//! format (version 0.0.4).
//!
//! # Format Specification
//!
//! ```text
//! # HELP <metric_name> <help_text>
//! # TYPE <metric_name> <type>
//! <metric_name>{<label1>="<value1>",<label2>="<value2>"} <value>
//! ```

use std::collections::HashMap;

use crate::semp::MetricTuple;

/// Prometheus exposition format formatter
///
/// ```ignore
/// let output = PrometheusFormatter::new().format(cycle_tuples.iter());
/// ```
#[derive(Debug, Clone, Default)]
pub struct PrometheusFormatter;

impl PrometheusFormatter {
    /// Create a new formatter
    pub fn new() -> Self {
        Self
    }

    /// Format tuples into Prometheus exposition format
    ///
    /// # Notes
    ///
    /// - HELP and TYPE lines are emitted once per family
    /// - Families are grouped in order of first occurrence
    /// - Labels keep the order their descriptor declares
    pub fn format<'a, I>(&self, tuples: I) -> String
    where
        I: IntoIterator<Item = &'a MetricTuple>,
    {
        let tuples: Vec<&MetricTuple> = tuples.into_iter().collect();
        if tuples.is_empty() {
            return String::new();
        }

        let mut output = String::with_capacity(tuples.len() * 100);

        for (name, group) in Self::group_by_name(&tuples) {
            let desc = group[0].desc;
            if !desc.help.is_empty() {
                output.push_str(&format!("# HELP {} {}\n", name, Self::escape_help(desc.help)));
            }
            output.push_str(&format!("# TYPE {} {}\n", name, desc.metric_type.as_str()));

            for tuple in group {
                output.push_str(&Self::format_line(&name, tuple));
                output.push('\n');
            }
        }

        output
    }

    /// Group tuples by family name, preserving order of first occurrence
    fn group_by_name<'a>(tuples: &[&'a MetricTuple]) -> Vec<(String, Vec<&'a MetricTuple>)> {
        let mut groups: HashMap<String, Vec<&MetricTuple>> = HashMap::new();
        let mut order: Vec<String> = Vec::new();

        for tuple in tuples {
            let name = tuple.desc.family_name();
            if !groups.contains_key(&name) {
                order.push(name.clone());
            }
            groups.entry(name).or_default().push(tuple);
        }

        order
            .into_iter()
            .filter_map(|name| groups.remove(&name).map(|g| (name, g)))
            .collect()
    }

    fn format_line(name: &str, tuple: &MetricTuple) -> String {
        let mut line = name.to_string();

        if !tuple.desc.labels.is_empty() {
            let pairs: Vec<String> = tuple
                .desc
                .labels
                .iter()
                .zip(tuple.labels.iter())
                .map(|(k, v)| format!("{}=\"{}\"", k, Self::escape_label_value(v)))
                .collect();

            line.push('{');
            line.push_str(&pairs.join(","));
            line.push('}');
        }

        line.push(' ');
        line.push_str(&Self::format_value(tuple.value));
        line
    }

    /// Format a numeric value for Prometheus
    ///
    /// - NaN → "NaN"
    /// - +Inf → "+Inf"
    /// - -Inf → "-Inf"
    /// - Integers are formatted without decimal point
    /// - Large/small floats use scientific notation
    fn format_value(value: f64) -> String {
        if value.is_nan() {
            "NaN".to_string()
        } else if value.is_infinite() {
            if value.is_sign_positive() {
                "+Inf".to_string()
            } else {
                "-Inf".to_string()
            }
        } else if value.fract() == 0.0 && value.abs() < 1e15 {
            format!("{}", value as i64)
        } else if value.abs() >= 1e6 || (value.abs() < 1e-3 && value != 0.0) {
            format!("{:e}", value)
        } else {
            format!("{}", value)
        }
    }

    /// Escapes backslash and newline characters.
    fn escape_help(help: &str) -> String {
        help.replace('\\', "\\\\").replace('\n', "\\n")
    }

    /// Escapes backslash, double-quote, and newline characters.
    fn escape_label_value(value: &str) -> String {
        let mut escaped = String::with_capacity(value.len());
        for c in value.chars() {
            match c {
                '\\' => escaped.push_str("\\\\"),
                '"' => escaped.push_str("\\\""),
                '\n' => escaped.push_str("\\n"),
                _ => escaped.push(c),
            }
        }
        escaped
    }
}
