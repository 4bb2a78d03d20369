//! Item/metric name translation and query escaping

use crate::error::{SempError, SempResult};

/// Translate requested names against an `alias -> canonical` allow-list.
///
/// Aliases are replaced by their canonical name, canonical names pass through
/// and anything else fails with the full list of valid choices.
pub fn translate_items(requested: &[String], allowed: &[(&str, &str)]) -> SempResult<Vec<String>> {
    requested
        .iter()
        .map(|item| {
            if let Some((_, canonical)) = allowed.iter().find(|(alias, _)| alias == item) {
                Ok((*canonical).to_string())
            } else if allowed.iter().any(|(_, canonical)| canonical == item) {
                Ok(item.clone())
            } else {
                Err(SempError::UnknownItem {
                    name: item.clone(),
                    valid_choices: valid_choices(allowed),
                })
            }
        })
        .collect()
}

fn valid_choices(allowed: &[(&str, &str)]) -> Vec<String> {
    allowed
        .iter()
        .flat_map(|(alias, canonical)| [alias.to_string(), canonical.to_string()])
        .collect()
}

/// Percent-encode a value for a SEMP v2 query or path segment.
///
/// Blank input and input already containing `%` are returned unchanged.
pub fn escape_query_value(raw: &str) -> String {
    if raw.trim().is_empty() || raw.contains('%') {
        return raw.to_string();
    }
    urlencoding::encode(raw).into_owned()
}

/// Escape a filter pattern for embedding in a SEMP v1 XML command
pub fn escape_xml(raw: &str) -> String {
    quick_xml::escape::escape(raw).into_owned()
}
