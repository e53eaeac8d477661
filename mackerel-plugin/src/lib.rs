//! # mackerel-plugin
//!
//! Helper for writing mackerel agent plugins.
//!
//! A plugin is an executable the agent runs once per interval. It prints
//! one `name<TAB>value<TAB>timestamp` line per metric, or, when the agent
//! sets `MACKEREL_AGENT_PLUGIN_META`, a JSON document describing its
//! graphs. This crate handles everything except fetching the readings:
//! counter rates, wraparound detection, the state file kept between runs,
//! wildcard metric names, key prefixes and the definition document.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mackerel_plugin::{FetchError, GraphDef, MackerelPlugin, MetricType, Plugin, Readings, Value};
//!
//! struct Interfaces;
//!
//! impl Plugin for Interfaces {
//!     fn fetch_metrics(&self) -> Result<Readings, FetchError> {
//!         let mut readings = Readings::new();
//!         readings.insert("interface.eth0.rx_bytes".into(), Value::U64(123_456));
//!         readings.insert("interface.eth1.rx_bytes".into(), Value::U64(654_321));
//!         Ok(readings)
//!     }
//!
//!     fn graph_definition(&self) -> GraphDef {
//!         GraphDef::builder()
//!             .graph("interface.#", |g| {
//!                 g.label("Interface")
//!                     .unit("bytes/sec")
//!                     .metric("rx_bytes", |m| {
//!                         m.diff(true).metric_type(MetricType::Uint64)
//!                     })
//!             })
//!             .build()
//!     }
//! }
//!
//! fn main() -> mackerel_plugin::Result<()> {
//!     MackerelPlugin::new(Interfaces).run()
//! }
//! ```
//!
//! ## Environment
//!
//! - `MACKEREL_AGENT_PLUGIN_META`: non-empty to print definitions
//! - `MACKEREL_PLUGIN_WORKDIR`: directory for state files (defaults to the
//!   system temporary directory)

mod definition;
mod error;
mod helper;
mod output;
mod path;
mod plugin;
pub mod rate;
pub mod resolve;
pub mod state;

pub use definition::{agent_definition, write_definitions, DEFINITION_HEADER};
pub use error::{Error, FetchError, RateError, Result};
pub use helper::{unix_now, MackerelPlugin, MackerelPluginBuilder, META_ENV};
pub use output::{format_value, write_value};
pub use path::{generate_tempfile_path, plugin_workdir, sanitize, state_file_name, WORKDIR_ENV};
pub use plugin::Plugin;

// Re-export types for convenience
pub use mackerel_plugin_types::{
    last_diff_key, title, Graph, GraphBuilder, GraphDef, GraphDefBuilder, Metric, MetricBuilder,
    MetricType, Readings, Snapshot, SnapshotBuilder, Value,
};
