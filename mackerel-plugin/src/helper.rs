//! The MackerelPlugin type driving one plugin invocation.

use std::env;
use std::ffi::OsStr;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use mackerel_plugin_types::{Metric, Snapshot};
use tracing::{debug, info, warn};

use crate::definition;
use crate::error::{Error, Result};
use crate::output;
use crate::path;
use crate::plugin::Plugin;
use crate::resolve;
use crate::state;

/// Environment variable the agent sets when it asks for graph definitions.
pub const META_ENV: &str = "MACKEREL_AGENT_PLUGIN_META";

/// Current Unix time in seconds.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Runs a [`Plugin`] the way the agent expects.
///
/// The agent invokes a plugin executable once per interval. Each run
/// fetches fresh readings, turns counters into per-minute rates against the
/// previous run's readings (kept in a state file), prints one line per
/// metric and saves the readings for the next run. When the agent sets
/// `MACKEREL_AGENT_PLUGIN_META`, the run prints graph definitions instead.
///
/// # Example
///
/// ```rust,no_run
/// use mackerel_plugin::{FetchError, GraphDef, MackerelPlugin, MetricType, Plugin, Readings, Value};
///
/// struct Memcached;
///
/// impl Plugin for Memcached {
///     fn fetch_metrics(&self) -> Result<Readings, FetchError> {
///         let mut readings = Readings::new();
///         readings.insert("cmd_get".into(), Value::U64(1000));
///         Ok(readings)
///     }
///
///     fn graph_definition(&self) -> GraphDef {
///         GraphDef::builder()
///             .graph("cmd", |g| {
///                 g.unit("integer").metric("cmd_get", |m| {
///                     m.diff(true).metric_type(MetricType::Uint64)
///                 })
///             })
///             .build()
///     }
///
///     fn metric_key_prefix(&self) -> Option<&str> {
///         Some("memcached")
///     }
/// }
///
/// fn main() -> mackerel_plugin::Result<()> {
///     MackerelPlugin::new(Memcached).run()
/// }
/// ```
#[derive(Debug)]
pub struct MackerelPlugin<P> {
    plugin: P,
    tempfile: PathBuf,
    has_diff: bool,
}

impl<P: Plugin> MackerelPlugin<P> {
    /// Wrap `plugin` with default settings.
    ///
    /// The state file path is derived from the plugin's prefix and the
    /// process command line.
    pub fn new(plugin: P) -> Self {
        Self::builder(plugin).build()
    }

    /// Create a builder for configuring the helper.
    pub fn builder(plugin: P) -> MackerelPluginBuilder<P> {
        MackerelPluginBuilder::new(plugin)
    }

    /// The wrapped plugin.
    pub fn plugin(&self) -> &P {
        &self.plugin
    }

    /// Path of the state file.
    pub fn tempfile(&self) -> &Path {
        &self.tempfile
    }

    /// Whether the plugin declares any counter.
    ///
    /// Without counters the state file is never read or written.
    pub fn has_diff(&self) -> bool {
        self.has_diff
    }

    fn key_prefix(&self) -> Option<&str> {
        self.plugin.metric_key_prefix().filter(|p| !p.is_empty())
    }

    /// Load the previous run's snapshot.
    ///
    /// Returns an empty snapshot when the plugin has no counters or the
    /// state file does not exist yet.
    pub fn fetch_last_values(&self) -> Result<Snapshot> {
        if !self.has_diff {
            return Ok(Snapshot::default());
        }
        state::load(&self.tempfile)
    }

    /// Like [`fetch_last_values`](Self::fetch_last_values), but fails with
    /// [`Error::StateRecentlyUpdated`] when the state is less than a second
    /// older than `now`.
    pub fn fetch_last_values_guarded(&self, now: i64) -> Result<Snapshot> {
        if !self.has_diff {
            return Ok(Snapshot::default());
        }
        state::load_guarded(&self.tempfile, now)
    }

    /// Persist `snapshot` for the next run. A no-op without counters.
    pub fn save_values(&self, snapshot: &Snapshot) -> Result<()> {
        if !self.has_diff {
            return Ok(());
        }
        state::save(&self.tempfile, snapshot)
    }

    /// Print definitions or values to stdout, depending on
    /// `MACKEREL_AGENT_PLUGIN_META`.
    pub fn run(&self) -> Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.run_with(&mut out, env::var_os(META_ENV).as_deref())
    }

    /// Write definitions when `meta` (the value of
    /// `MACKEREL_AGENT_PLUGIN_META`) is set and non-empty, values otherwise.
    pub fn run_with<W: Write>(&self, w: &mut W, meta: Option<&OsStr>) -> Result<()> {
        if meta.is_some_and(|v| !v.is_empty()) {
            self.output_definitions(w)
        } else {
            self.output_values(w)
        }
    }

    /// Write the graph definition document.
    pub fn output_definitions<W: Write>(&self, w: &mut W) -> Result<()> {
        definition::write_definitions(w, &self.plugin.graph_definition(), self.key_prefix())
    }

    /// Fetch, compute and write one line per metric, timestamped now.
    pub fn output_values<W: Write>(&self, w: &mut W) -> Result<()> {
        self.output_values_at(w, unix_now())
    }

    /// Fetch, compute and write one line per metric, timestamped `now`.
    ///
    /// A state file that cannot be read is ignored, so every counter is
    /// skipped for this run. A state file written less than a second ago
    /// suppresses output altogether and is left untouched.
    pub fn output_values_at<W: Write>(&self, w: &mut W, now: i64) -> Result<()> {
        let readings = self.plugin.fetch_metrics().map_err(Error::Fetch)?;
        let mut current = Snapshot::new(readings, now);

        let last = match self.fetch_last_values_guarded(now) {
            Ok(last) => last,
            Err(Error::StateRecentlyUpdated) => {
                info!(path = %self.tempfile.display(), "state was recently updated, skipping output");
                return Ok(());
            }
            Err(e) => {
                warn!(path = %self.tempfile.display(), error = %e, "ignoring unreadable state file");
                Snapshot::default()
            }
        };

        let def = self.plugin.graph_definition();
        for (key, graph) in def.iter() {
            for metric in &graph.metrics {
                self.output_metric(w, key, metric, &mut current, &last)?;
            }
        }

        self.save_values(&current)
    }

    fn output_metric<W: Write>(
        &self,
        w: &mut W,
        graph_key: &str,
        metric: &Metric,
        current: &mut Snapshot,
        last: &Snapshot,
    ) -> Result<()> {
        let series = resolve::resolve(graph_key, metric, &current.values)?;
        if series.is_empty() {
            debug!(graph = %graph_key, metric = %metric.name, "no readings");
        }

        // wildcard matches are emitted under the matched key as is
        let prefix = if resolve::is_wildcard(graph_key, &metric.name) {
            None
        } else {
            self.key_prefix()
        };

        for s in series {
            let Some(value) = output::format_value(metric, &s.key, current, last) else {
                continue;
            };
            let name = match prefix {
                Some(prefix) => format!("{prefix}.{}", s.name),
                None => s.name,
            };
            output::write_value(w, &name, &value, current.timestamp)?;
        }
        Ok(())
    }
}

/// Builder for configuring a [`MackerelPlugin`].
#[derive(Debug)]
pub struct MackerelPluginBuilder<P> {
    plugin: P,
    tempfile: Option<PathBuf>,
    args: Option<Vec<String>>,
}

impl<P: Plugin> MackerelPluginBuilder<P> {
    /// Create a new builder.
    pub fn new(plugin: P) -> Self {
        Self {
            plugin,
            tempfile: None,
            args: None,
        }
    }

    /// Use an explicit state file path.
    pub fn tempfile(mut self, path: impl Into<PathBuf>) -> Self {
        self.tempfile = Some(path.into());
        self
    }

    /// Use a state file with this name inside the plugin work directory.
    pub fn tempfile_basename(mut self, name: impl AsRef<Path>) -> Self {
        self.tempfile = Some(path::plugin_workdir().join(name));
        self
    }

    /// Command line the default state file name is derived from.
    ///
    /// Defaults to the process arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    /// Build the helper.
    pub fn build(self) -> MackerelPlugin<P> {
        let has_diff = self.plugin.graph_definition().has_diff();

        let tempfile = self.tempfile.unwrap_or_else(|| {
            let args = self.args.unwrap_or_else(|| env::args().collect());
            let prefix = self.plugin.metric_key_prefix().filter(|p| !p.is_empty());
            path::generate_tempfile_path(prefix, &args)
        });
        debug!(path = %tempfile.display(), has_diff, "plugin state file");

        MackerelPlugin {
            plugin: self.plugin,
            tempfile,
            has_diff,
        }
    }
}
