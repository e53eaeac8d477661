//! Kernel activity from `/proc/stat` and `/proc/loadavg`.
//!
//! CPU time, context switches, forks and interrupts are cumulative counters
//! reported as per-minute rates. Runnable/blocked process counts and load
//! averages are gauges.

use std::fs;
use std::path::PathBuf;

use mackerel_plugin::{FetchError, GraphDef, MetricBuilder, MetricType, Plugin, Readings, Value};
use thiserror::Error;
use tracing::debug;

/// CPU time fields in `/proc/stat` column order.
pub const CPU_FIELDS: [&str; 8] = [
    "user", "nice", "system", "idle", "iowait", "irq", "softirq", "steal",
];

/// Errors parsing proc files.
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    /// A required line is missing.
    #[error("missing {0} line")]
    MissingLine(&'static str),

    /// A field is not a number.
    #[error("invalid {field}: {value:?}")]
    InvalidField {
        /// Field name.
        field: String,
        /// Offending text.
        value: String,
    },
}

/// Jiffies spent in each CPU state, in [`CPU_FIELDS`] order.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CpuTimes(pub [u64; 8]);

/// Parsed `/proc/stat`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KernelStat {
    /// Aggregate over all CPUs.
    pub total: CpuTimes,
    pub ctxt: u64,
    pub processes: u64,
    pub intr: u64,
    pub procs_running: u64,
    pub procs_blocked: u64,
}

/// Parse `/proc/stat` content.
///
/// Only the aggregate `cpu` line is kept. Older kernels report fewer CPU
/// columns; missing ones count as zero.
pub fn parse_stat(content: &str) -> Result<KernelStat, ParseError> {
    let mut stat = KernelStat::default();
    let mut seen_total = false;

    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some((&label, rest)) = parts.split_first() else {
            continue;
        };

        if label == "cpu" {
            stat.total = parse_cpu_times(rest)?;
            seen_total = true;
            continue;
        }

        let slot = match label {
            "ctxt" => &mut stat.ctxt,
            "processes" => &mut stat.processes,
            "intr" => &mut stat.intr,
            "procs_running" => &mut stat.procs_running,
            "procs_blocked" => &mut stat.procs_blocked,
            _ => continue,
        };
        *slot = parse_u64(label, rest.first().copied().unwrap_or_default())?;
    }

    if !seen_total {
        return Err(ParseError::MissingLine("cpu"));
    }
    Ok(stat)
}

fn parse_u64(field: &str, value: &str) -> Result<u64, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidField {
        field: field.to_string(),
        value: value.to_string(),
    })
}

fn parse_cpu_times(columns: &[&str]) -> Result<CpuTimes, ParseError> {
    let mut times = [0u64; 8];
    for (i, field) in CPU_FIELDS.iter().enumerate() {
        if let Some(value) = columns.get(i) {
            times[i] = parse_u64(field, value)?;
        }
    }
    Ok(CpuTimes(times))
}

/// Parsed `/proc/loadavg`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoadAvg {
    pub load1: f64,
    pub load5: f64,
    pub load15: f64,
}

/// Parse `/proc/loadavg` content.
pub fn parse_loadavg(content: &str) -> Result<LoadAvg, ParseError> {
    let parts: Vec<&str> = content.split_whitespace().collect();
    if parts.len() < 3 {
        return Err(ParseError::MissingLine("loadavg"));
    }

    let parse = |field: &str, value: &str| {
        value.parse::<f64>().map_err(|_| ParseError::InvalidField {
            field: field.to_string(),
            value: value.to_string(),
        })
    };

    Ok(LoadAvg {
        load1: parse("load1", parts[0])?,
        load5: parse("load5", parts[1])?,
        load15: parse("load15", parts[2])?,
    })
}

fn counter(m: MetricBuilder) -> MetricBuilder {
    m.diff(true).metric_type(MetricType::Uint64).absolute_name(true)
}

/// Plugin reporting kernel activity from a proc filesystem.
#[derive(Debug, Clone)]
pub struct ProcStat {
    root: PathBuf,
    prefix: String,
}

impl ProcStat {
    /// Read from `root` (normally `/proc`), emitting under `prefix`.
    pub fn new(root: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            prefix: prefix.into(),
        }
    }

    fn read(&self, name: &str) -> std::io::Result<String> {
        let path = self.root.join(name);
        debug!(path = %path.display(), "reading");
        fs::read_to_string(path)
    }
}

/// Readings for one `/proc/stat` and `/proc/loadavg` pair.
pub fn readings(stat: &KernelStat, load: &LoadAvg) -> Readings {
    let mut readings = Readings::new();

    for (field, value) in CPU_FIELDS.iter().zip(stat.total.0) {
        readings.insert(format!("cpu.{field}"), Value::U64(value));
    }

    readings.insert("kernel.context_switches".into(), Value::U64(stat.ctxt));
    readings.insert("kernel.forks".into(), Value::U64(stat.processes));
    readings.insert("kernel.interrupts".into(), Value::U64(stat.intr));
    readings.insert("procs.running".into(), Value::U64(stat.procs_running));
    readings.insert("procs.blocked".into(), Value::U64(stat.procs_blocked));

    readings.insert("loadavg.load1".into(), Value::F64(load.load1));
    readings.insert("loadavg.load5".into(), Value::F64(load.load5));
    readings.insert("loadavg.load15".into(), Value::F64(load.load15));

    readings
}

impl Plugin for ProcStat {
    fn fetch_metrics(&self) -> Result<Readings, FetchError> {
        let stat = parse_stat(&self.read("stat")?)?;
        let load = parse_loadavg(&self.read("loadavg")?)?;
        Ok(readings(&stat, &load))
    }

    fn graph_definition(&self) -> GraphDef {
        GraphDef::builder()
            .graph("cpu", |mut g| {
                g = g.label("CPU Time").unit("integer");
                for field in CPU_FIELDS {
                    g = g.metric(field, |m| counter(m).stacked(true));
                }
                g
            })
            .graph("kernel", |g| {
                g.label("Kernel Activity")
                    .unit("integer")
                    .metric("context_switches", counter)
                    .metric("forks", counter)
                    .metric("interrupts", counter)
            })
            .graph("procs", |g| {
                g.label("Processes")
                    .unit("integer")
                    .metric("running", |m| {
                        m.metric_type(MetricType::Uint64).absolute_name(true)
                    })
                    .metric("blocked", |m| {
                        m.metric_type(MetricType::Uint64).absolute_name(true)
                    })
            })
            .graph("loadavg", |g| {
                g.label("Load Average")
                    .unit("float")
                    .metric("load1", |m| m.label("1 min").absolute_name(true))
                    .metric("load5", |m| m.label("5 min").absolute_name(true))
                    .metric("load15", |m| m.label("15 min").absolute_name(true))
            })
            .build()
    }

    fn metric_key_prefix(&self) -> Option<&str> {
        Some(&self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use mackerel_plugin::MackerelPlugin;
    use tempfile::TempDir;

    const STAT: &str = "\
cpu  10000 500 3000 80000 1000 200 100 0 0 0
cpu0 6000 250 1500 40000 500 100 50 0 0 0
cpu1 4000 250 1500 40000 500 100 50 0 0 0
intr 123456 10 0 0 3
ctxt 500000
btime 1700000000
processes 4200
procs_running 3
procs_blocked 1
softirq 98765 0 1 2
";

    const LOADAVG: &str = "0.52 0.58 0.59 2/1234 5678\n";

    fn proc_root(stat: &str, loadavg: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("stat"), stat).unwrap();
        fs::write(dir.path().join("loadavg"), loadavg).unwrap();
        dir
    }

    fn run_at(root: &Path, state: &Path, now: i64) -> String {
        let plugin = MackerelPlugin::builder(ProcStat::new(root, "procstat"))
            .tempfile(state)
            .build();
        let mut buf = Vec::new();
        plugin.output_values_at(&mut buf, now).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_parse_stat() {
        let stat = parse_stat(STAT).unwrap();
        assert_eq!(stat.total.0, [10000, 500, 3000, 80000, 1000, 200, 100, 0]);
        assert_eq!(stat.ctxt, 500000);
        assert_eq!(stat.processes, 4200);
        assert_eq!(stat.intr, 123456);
        assert_eq!(stat.procs_running, 3);
        assert_eq!(stat.procs_blocked, 1);
    }

    #[test]
    fn short_cpu_lines_pad_with_zero() {
        let stat = parse_stat("cpu 1 2 3 4\n").unwrap();
        assert_eq!(stat.total.0, [1, 2, 3, 4, 0, 0, 0, 0]);
    }

    #[test]
    fn stat_without_cpu_line_is_an_error() {
        assert_eq!(parse_stat("ctxt 5\n"), Err(ParseError::MissingLine("cpu")));
    }

    #[test]
    fn stat_with_garbage_is_an_error() {
        assert_eq!(
            parse_stat("cpu 1 2 3 4\nctxt lots\n"),
            Err(ParseError::InvalidField {
                field: "ctxt".into(),
                value: "lots".into(),
            })
        );
    }

    #[test]
    fn test_parse_loadavg() {
        let load = parse_loadavg(LOADAVG).unwrap();
        assert_eq!(load.load1, 0.52);
        assert_eq!(load.load5, 0.58);
        assert_eq!(load.load15, 0.59);

        assert!(parse_loadavg("0.1 0.2").is_err());
        assert!(parse_loadavg("a b c").is_err());
    }

    #[test]
    fn readings_use_dotted_keys() {
        let stat = parse_stat(STAT).unwrap();
        let load = parse_loadavg(LOADAVG).unwrap();
        let r = readings(&stat, &load);

        assert_eq!(r.get("cpu.user"), Some(&Value::U64(10000)));
        assert!(!r.keys().any(|k| k.contains("cpu0")));
        assert_eq!(r.get("kernel.forks"), Some(&Value::U64(4200)));
        assert_eq!(r.get("loadavg.load15"), Some(&Value::F64(0.59)));
    }

    #[test]
    fn definition_declares_counters() {
        let def = ProcStat::new("/proc", "procstat").graph_definition();
        assert!(def.has_diff());
        assert_eq!(def.len(), 4);
        assert_eq!(def.get("cpu").map(|g| g.metrics.len()), Some(8));
    }

    #[test]
    fn missing_proc_files_fail_fetch() {
        let dir = TempDir::new().unwrap();
        assert!(ProcStat::new(dir.path(), "procstat").fetch_metrics().is_err());
    }

    #[test]
    fn second_run_reports_rates() {
        let state_dir = TempDir::new().unwrap();
        let state = state_dir.path().join("state");

        let first = proc_root(STAT, LOADAVG);
        let out = run_at(first.path(), &state, 1000);
        assert!(out.contains("procstat.loadavg.load1\t0.520000\t1000\n"));
        assert!(out.contains("procstat.procs.running\t3\t1000\n"));
        assert!(!out.contains("procstat.kernel.forks"));

        let later = STAT
            .replace("processes 4200", "processes 4260")
            .replace("cpu  10000", "cpu  10120");
        let second = proc_root(&later, LOADAVG);
        let out = run_at(second.path(), &state, 1060);
        assert!(out.contains("procstat.kernel.forks\t60.000000\t1060\n"));
        assert!(out.contains("procstat.kernel.context_switches\t0.000000\t1060\n"));
        assert!(out.contains("procstat.cpu.user\t120.000000\t1060\n"));
        assert!(out.contains("procstat.cpu.idle\t0.000000\t1060\n"));
    }
}
