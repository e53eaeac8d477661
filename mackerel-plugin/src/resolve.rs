//! Expanding metric declarations into concrete series.
//!
//! A declaration is either literal (`memcached.cmd` / `cmd_get`) or a
//! wildcard, where `*` or `#` in the graph key or metric name stands for
//! one name segment (`[-a-zA-Z0-9_]+`). A wildcard governs every reading
//! whose key matches the pattern from its start.

use mackerel_plugin_types::{Metric, Readings};
use regex::Regex;

use crate::error::Result;

/// Characters that turn a declaration into a wildcard.
pub const WILDCARDS: [char; 2] = ['*', '#'];

/// What a wildcard character matches.
const SEGMENT: &str = "[-a-zA-Z0-9_]+";

/// Whether a graph key or metric name contains a wildcard.
pub fn is_wildcard(graph_key: &str, name: &str) -> bool {
    graph_key.contains(WILDCARDS) || name.contains(WILDCARDS)
}

/// One reading a declaration resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    /// Key of the reading in the fetched readings.
    pub key: String,
    /// Name the series is emitted under. Literal series still get the
    /// plugin prefix.
    pub name: String,
}

/// Join a graph key and metric name with `.`; an empty key contributes
/// nothing.
pub fn join_name(graph_key: &str, name: &str) -> String {
    if graph_key.is_empty() {
        name.to_string()
    } else {
        format!("{graph_key}.{name}")
    }
}

/// Compile a wildcard pattern anchored at the start of the key.
///
/// Everything but the wildcard characters matches literally.
pub fn compile_pattern(pattern: &str) -> Result<Regex> {
    let mut re = String::from(r"\A");
    for (i, part) in pattern.split(WILDCARDS).enumerate() {
        if i > 0 {
            re.push_str(SEGMENT);
        }
        re.push_str(&regex::escape(part));
    }
    Ok(Regex::new(&re)?)
}

/// Resolve `metric`, declared in graph `graph_key`, against `readings`.
///
/// A literal declaration yields at most one series: the reading stored
/// under the metric name, or under `graph_key.name` when the metric is
/// absolute. It is emitted as `graph_key.name` under the plugin prefix. A
/// wildcard yields every matching reading, each emitted under its own key
/// with no prefix.
pub fn resolve(graph_key: &str, metric: &Metric, readings: &Readings) -> Result<Vec<Series>> {
    let name = join_name(graph_key, &metric.name);

    if !is_wildcard(graph_key, &metric.name) {
        let key = if metric.absolute_name {
            name.clone()
        } else {
            metric.name.clone()
        };
        if !readings.contains_key(&key) {
            return Ok(Vec::new());
        }
        return Ok(vec![Series { key, name }]);
    }

    let re = compile_pattern(&name)?;
    Ok(readings
        .keys()
        .filter(|k| re.is_match(k))
        .map(|k| Series {
            key: k.clone(),
            name: k.clone(),
        })
        .collect())
}
