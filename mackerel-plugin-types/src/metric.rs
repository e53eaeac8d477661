//! Metric declarations.

use alloc::string::String;

/// Numeric representation a metric is emitted in.
///
/// Integer kinds are printed as decimal integers and use wrapping
/// arithmetic for counter deltas; `Float` is printed with six fractional
/// digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MetricType {
    /// Unsigned 32-bit integer.
    Uint32,
    /// Unsigned 64-bit integer.
    Uint64,
    /// 64-bit float.
    #[default]
    Float,
}

/// Declaration of a single metric within a [`Graph`](crate::Graph).
///
/// The name is either a literal reading key or a pattern containing the
/// wildcard markers `*` / `#`, each standing for exactly one `.`-separated
/// segment.
///
/// Only `name`, `label` and `stacked` are part of the definition document;
/// the remaining fields drive value output.
///
/// # Example
///
/// ```rust
/// use mackerel_plugin_types::{Metric, MetricType};
///
/// let metric = Metric::builder("cmd_get")
///     .label("Get")
///     .diff(true)
///     .metric_type(MetricType::Uint64)
///     .build();
///
/// assert!(metric.diff);
/// assert_eq!(metric.metric_type, MetricType::Uint64);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Metric {
    /// Reading key or wildcard pattern.
    pub name: String,

    /// Display label. Defaults to the title-cased name when empty.
    pub label: String,

    /// Whether the metric is a cumulative counter to be emitted as a
    /// per-minute rate.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub diff: bool,

    /// Numeric representation.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub metric_type: MetricType,

    /// Whether the graph stacks this metric.
    pub stacked: bool,

    /// Multiplier applied after rate adjustment. `0.0` disables scaling.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub scale: f64,

    /// Look the reading up under `<graph key>.<name>` instead of `<name>`.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub absolute_name: bool,
}

impl Metric {
    /// Create a plain gauge metric with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Create a builder for a metric with the given name.
    pub fn builder(name: impl Into<String>) -> MetricBuilder {
        MetricBuilder::new(name)
    }

    /// Whether a non-zero scale factor is declared.
    pub fn is_scaled(&self) -> bool {
        self.scale != 0.0
    }
}

/// Builder for [`Metric`].
#[derive(Debug)]
pub struct MetricBuilder {
    metric: Metric,
}

impl MetricBuilder {
    /// Create a new builder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            metric: Metric::new(name),
        }
    }

    /// Set the display label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.metric.label = label.into();
        self
    }

    /// Mark the metric as a counter.
    pub fn diff(mut self, diff: bool) -> Self {
        self.metric.diff = diff;
        self
    }

    /// Set the numeric representation.
    pub fn metric_type(mut self, ty: MetricType) -> Self {
        self.metric.metric_type = ty;
        self
    }

    /// Stack the metric in its graph.
    pub fn stacked(mut self, stacked: bool) -> Self {
        self.metric.stacked = stacked;
        self
    }

    /// Set the scale factor.
    pub fn scale(mut self, scale: f64) -> Self {
        self.metric.scale = scale;
        self
    }

    /// Resolve the reading under `<graph key>.<name>`.
    pub fn absolute_name(mut self, absolute: bool) -> Self {
        self.metric.absolute_name = absolute;
        self
    }

    /// Build the metric.
    pub fn build(self) -> Metric {
        self.metric
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_a_float_gauge() {
        let m = Metric::new("load1");
        assert_eq!(m.name, "load1");
        assert!(m.label.is_empty());
        assert!(!m.diff);
        assert_eq!(m.metric_type, MetricType::Float);
        assert!(!m.is_scaled());
        assert!(!m.absolute_name);
    }

    #[test]
    fn builder_sets_every_field() {
        let m = Metric::builder("bytes")
            .label("Bytes")
            .diff(true)
            .metric_type(MetricType::Uint32)
            .stacked(true)
            .scale(8.0)
            .absolute_name(true)
            .build();

        assert_eq!(m.label, "Bytes");
        assert!(m.diff);
        assert_eq!(m.metric_type, MetricType::Uint32);
        assert!(m.stacked);
        assert_eq!(m.scale, 8.0);
        assert!(m.is_scaled());
        assert!(m.absolute_name);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_only_definition_fields() {
        let m = Metric::builder("cmd_get")
            .label("Get")
            .diff(true)
            .metric_type(MetricType::Uint64)
            .scale(2.0)
            .build();

        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, r#"{"name":"cmd_get","label":"Get","stacked":false}"#);
    }
}
