//! # mackerel-plugin-types
//!
//! Core types shared by mackerel agent plugins: the raw [`Value`] a plugin
//! reports, the [`Metric`] / [`Graph`] declarations that describe how those
//! readings are emitted, and the [`Snapshot`] persisted between runs to
//! turn cumulative counters into rates.
//!
//! ## Features
//!
//! - `std` (default): Standard library support
//! - `serde`: (de)serialization of values and of the definition document
//!
//! ## Example
//!
//! ```rust
//! use mackerel_plugin_types::{GraphDef, MetricType, Readings, Value};
//!
//! let def = GraphDef::builder()
//!     .graph("memcached.cmd", |g| {
//!         g.label("Memcached Command")
//!             .unit("integer")
//!             .metric("cmd_get", |m| {
//!                 m.label("Get").diff(true).metric_type(MetricType::Uint64)
//!             })
//!     })
//!     .graph("memcached.conn", |g| {
//!         g.unit("integer").metric("curr_connections", |m| m)
//!     })
//!     .build();
//!
//! let mut readings = Readings::new();
//! readings.insert("cmd_get".into(), Value::U64(1000));
//! readings.insert("curr_connections".into(), Value::from("12"));
//!
//! assert!(def.has_diff());
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod graph;
mod label;
mod metric;
mod snapshot;
mod value;

pub use graph::*;
pub use label::*;
pub use metric::*;
pub use snapshot::*;
pub use value::*;
