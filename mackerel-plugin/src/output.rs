//! Turning readings into agent value lines.
//!
//! Every emitted metric is one line of `name<TAB>value<TAB>timestamp`.
//! Integers print in decimal, floats with six fractional digits.

use std::io::{self, Write};

use mackerel_plugin_types::{Metric, MetricType, Snapshot, Value};
use tracing::{debug, warn};

use crate::rate;

/// Write one value line.
///
/// Values that cannot be represented (a non-finite float, or text that was
/// never parsed) are logged and skipped.
pub fn write_value<W: Write>(w: &mut W, name: &str, value: &Value, timestamp: i64) -> io::Result<()> {
    match value {
        Value::U32(v) => writeln!(w, "{name}\t{v}\t{timestamp}"),
        Value::U64(v) => writeln!(w, "{name}\t{v}\t{timestamp}"),
        Value::F64(v) if v.is_finite() => writeln!(w, "{name}\t{v:.6}\t{timestamp}"),
        Value::F64(v) => {
            warn!(metric = %name, value = %v, "skipping non-finite value");
            Ok(())
        }
        Value::Str(s) => {
            warn!(metric = %name, value = %s, "skipping unparsed value");
            Ok(())
        }
    }
}

/// Compute the value to emit for the reading stored under `key`.
///
/// The reading is interpreted as the metric's declared type (unparseable
/// text counts as zero). Counters become a per-minute rate against `last`,
/// and the rate is recorded in `current` for the next run's wraparound
/// check. Returns `None` when the reading is absent or no rate can be
/// computed.
pub fn format_value(metric: &Metric, key: &str, current: &mut Snapshot, last: &Snapshot) -> Option<Value> {
    let ty = metric.metric_type;
    let raw = current.get(key)?;

    let mut value = raw.parse_as(ty).unwrap_or_else(|e| {
        warn!(metric = %key, error = %e, "unparseable reading, using zero");
        Value::zero(ty)
    });

    if metric.diff {
        let Some(last_value) = last.get(key) else {
            debug!(metric = %key, "does not exist at last fetch");
            return None;
        };
        let last_diff = last.last_diff(key).unwrap_or(0.0);

        match rate::calc_rate(ty, &value, current.timestamp, last_value, last.timestamp, last_diff) {
            Ok(diff) => {
                current.set_last_diff(key, diff);
                value = Value::F64(diff);
            }
            Err(e) => {
                warn!(metric = %key, error = %e, "cannot compute rate");
                return None;
            }
        }
    }

    if metric.is_scaled() {
        value = scale(&value, ty, metric.scale);
    }

    Some(value)
}

/// Multiply by `factor`. Integer kinds use the factor truncated to an
/// integer and wrap on overflow.
fn scale(value: &Value, ty: MetricType, factor: f64) -> Value {
    match ty {
        MetricType::Uint32 => Value::U32(value.to_u32().wrapping_mul(factor as u32)),
        MetricType::Uint64 => Value::U64(value.to_u64().wrapping_mul(factor as u64)),
        MetricType::Float => Value::F64(value.to_f64() * factor),
    }
}
