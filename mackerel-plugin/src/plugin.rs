//! The capability set a plugin provides.

use mackerel_plugin_types::{GraphDef, Readings};

use crate::error::FetchError;

/// Trait implemented by every plugin.
///
/// A plugin knows how to fetch its current readings and how to describe
/// the graphs they belong to. Everything else (state, rates, output) is
/// handled by [`MackerelPlugin`](crate::MackerelPlugin).
///
/// # Example
///
/// ```
/// use mackerel_plugin::{FetchError, GraphDef, Plugin, Readings, Value};
///
/// struct Uptime;
///
/// impl Plugin for Uptime {
///     fn fetch_metrics(&self) -> Result<Readings, FetchError> {
///         let mut readings = Readings::new();
///         readings.insert("seconds".into(), Value::F64(3600.0));
///         Ok(readings)
///     }
///
///     fn graph_definition(&self) -> GraphDef {
///         GraphDef::builder()
///             .graph("uptime", |g| g.unit("float").metric("seconds", |m| m))
///             .build()
///     }
///
///     fn metric_key_prefix(&self) -> Option<&str> {
///         Some("uptime")
///     }
/// }
/// ```
pub trait Plugin {
    /// Fetch the current readings.
    ///
    /// A failure aborts the run.
    fn fetch_metrics(&self) -> Result<Readings, FetchError>;

    /// Describe the graphs and metrics this plugin emits.
    fn graph_definition(&self) -> GraphDef;

    /// Namespace prepended to every graph key and metric name.
    ///
    /// Plugins without a prefix emit names relative to the agent root, and
    /// their state file is named after the executable instead.
    fn metric_key_prefix(&self) -> Option<&str> {
        None
    }
}
