//! Graph declarations and the definition document.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use crate::{Metric, MetricBuilder};

/// A named group of metrics sharing a unit and a label.
///
/// Graphs are keyed by a graph key in [`GraphDef`]; the key doubles as the
/// middle segment of every emitted metric name.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Graph {
    /// Display label. Defaults to the title-cased graph key when empty.
    pub label: String,

    /// Unit understood by the agent (`integer`, `float`, `percentage`,
    /// `bytes`, `bytes/sec`, `iops`).
    pub unit: String,

    /// Metrics in display order.
    pub metrics: Vec<Metric>,
}

impl Graph {
    /// Create a builder for a graph.
    pub fn builder() -> GraphBuilder {
        GraphBuilder::new()
    }

    /// Whether any metric of this graph is a counter.
    pub fn has_diff(&self) -> bool {
        self.metrics.iter().any(|m| m.diff)
    }
}

/// Builder for [`Graph`].
#[derive(Debug, Default)]
pub struct GraphBuilder {
    label: String,
    unit: String,
    metrics: Vec<Metric>,
}

impl GraphBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the display label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set the unit.
    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// Add a metric built using a closure.
    pub fn metric<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(MetricBuilder) -> MetricBuilder,
    {
        self.metrics.push(f(MetricBuilder::new(name)).build());
        self
    }

    /// Add a pre-built metric.
    pub fn metric_def(mut self, metric: Metric) -> Self {
        self.metrics.push(metric);
        self
    }

    /// Build the graph.
    pub fn build(self) -> Graph {
        Graph {
            label: self.label,
            unit: self.unit,
            metrics: self.metrics,
        }
    }
}

/// The full set of graphs a plugin declares, keyed by graph key.
///
/// Serialized as the `{"graphs": {...}}` definition document. Keys are kept
/// sorted so output is stable between runs.
///
/// # Example
///
/// ```rust
/// use mackerel_plugin_types::{GraphDef, MetricType};
///
/// let def = GraphDef::builder()
///     .graph("memcached.cmd", |g| {
///         g.label("Memcached Command")
///             .unit("integer")
///             .metric("cmd_get", |m| {
///                 m.label("Get").diff(true).metric_type(MetricType::Uint64)
///             })
///     })
///     .build();
///
/// assert_eq!(def.len(), 1);
/// assert!(def.has_diff());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GraphDef {
    /// Graphs keyed by graph key.
    pub graphs: BTreeMap<String, Graph>,
}

impl GraphDef {
    /// Create an empty definition.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for a definition.
    pub fn builder() -> GraphDefBuilder {
        GraphDefBuilder::new()
    }

    /// Whether any declared metric is a counter.
    ///
    /// Plugins without counters never read or write a state file.
    pub fn has_diff(&self) -> bool {
        self.graphs.values().any(Graph::has_diff)
    }

    /// Number of graphs.
    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    /// Check if no graph is declared.
    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    /// Get a graph by key.
    pub fn get(&self, key: &str) -> Option<&Graph> {
        self.graphs.get(key)
    }

    /// Iterate over graphs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Graph)> {
        self.graphs.iter()
    }
}

impl From<BTreeMap<String, Graph>> for GraphDef {
    fn from(graphs: BTreeMap<String, Graph>) -> Self {
        Self { graphs }
    }
}

/// Builder for [`GraphDef`].
#[derive(Debug, Default)]
pub struct GraphDefBuilder {
    graphs: BTreeMap<String, Graph>,
}

impl GraphDefBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a graph built using a closure.
    pub fn graph<F>(mut self, key: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(GraphBuilder) -> GraphBuilder,
    {
        self.graphs.insert(key.into(), f(GraphBuilder::new()).build());
        self
    }

    /// Add a pre-built graph.
    pub fn graph_def(mut self, key: impl Into<String>, graph: Graph) -> Self {
        self.graphs.insert(key.into(), graph);
        self
    }

    /// Build the definition.
    pub fn build(self) -> GraphDef {
        GraphDef {
            graphs: self.graphs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_builder_keeps_metric_order() {
        let g = Graph::builder()
            .label("Load")
            .unit("float")
            .metric("load1", |m| m)
            .metric("load5", |m| m)
            .metric_def(Metric::new("load15"))
            .build();

        let names: Vec<&str> = g.metrics.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["load1", "load5", "load15"]);
        assert_eq!(g.label, "Load");
        assert_eq!(g.unit, "float");
    }

    #[test]
    fn has_diff_detects_any_counter() {
        let gauges = GraphDef::builder()
            .graph("hoge", |g| g.metric("hoge1", |m| m.label("hoge1")))
            .build();
        assert!(!gauges.has_diff());

        let counters = GraphDef::builder()
            .graph("hoge", |g| g.metric("hoge1", |m| m.label("hoge1")))
            .graph("fuga", |g| g.metric("fuga1", |m| m.diff(true)))
            .build();
        assert!(counters.has_diff());
    }

    #[test]
    fn empty_definition_has_no_diff() {
        let def = GraphDef::new();
        assert!(def.is_empty());
        assert!(!def.has_diff());
    }

    #[test]
    fn iterates_in_key_order() {
        let def = GraphDef::builder()
            .graph("b", |g| g)
            .graph("a", |g| g)
            .graph("", |g| g)
            .build();

        let keys: Vec<&str> = def.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["", "a", "b"]);
        assert!(def.get("a").is_some());
        assert!(def.get("c").is_none());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_definition_document() {
        use crate::MetricType;

        let def = GraphDef::builder()
            .graph("memcached.cmd", |g| {
                g.label("Memcached Command").unit("integer").metric("cmd_get", |m| {
                    m.label("Get").diff(true).metric_type(MetricType::Uint64)
                })
            })
            .build();

        let json = serde_json::to_string(&def).unwrap();
        assert_eq!(
            json,
            r#"{"graphs":{"memcached.cmd":{"label":"Memcached Command","unit":"integer","metrics":[{"name":"cmd_get","label":"Get","stacked":false}]}}}"#
        );
    }
}
