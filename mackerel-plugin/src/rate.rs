//! Per-minute rates from cumulative counters.
//!
//! A counter's rate is `(current - last) * 60 / elapsed_seconds`. Floats
//! treat any decrease as a reset. The unsigned variants subtract with
//! wraparound and accept a decrease when the wrapped rate stays within ten
//! times the previously observed rate, which distinguishes a counter that
//! overflowed from one that restarted at zero.

use mackerel_plugin_types::{MetricType, Value};

use crate::error::RateError;

/// Readings older than this many seconds are too stale to compute a rate.
pub const MAX_ELAPSED_SECS: i64 = 600;

/// A wrapped counter is trusted only while its rate stays below
/// `last_diff * WRAP_TOLERANCE`.
const WRAP_TOLERANCE: f64 = 10.0;

fn elapsed_secs(now: i64, last_time: i64) -> Result<f64, RateError> {
    let elapsed = now - last_time;
    if elapsed > MAX_ELAPSED_SECS {
        return Err(RateError::TooLongDuration(elapsed));
    }
    if elapsed <= 0 {
        return Err(RateError::NonPositiveDuration(elapsed));
    }
    Ok(elapsed as f64)
}

/// Rate of a float counter.
///
/// Any decrease is reported as [`RateError::CounterReset`].
pub fn calc_diff(value: f64, now: i64, last_value: f64, last_time: i64) -> Result<f64, RateError> {
    let elapsed = elapsed_secs(now, last_time)?;

    let diff = (value - last_value) * 60.0 / elapsed;
    if last_value <= value {
        Ok(diff)
    } else {
        Err(RateError::CounterReset)
    }
}

/// Rate of a 32-bit counter that may wrap around.
pub fn calc_diff_u32(
    value: u32,
    now: i64,
    last_value: u32,
    last_time: i64,
    last_diff: f64,
) -> Result<f64, RateError> {
    let elapsed = elapsed_secs(now, last_time)?;

    let diff = f64::from(value.wrapping_sub(last_value)) * 60.0 / elapsed;
    accept_wrapped(last_value <= value, diff, last_diff)
}

/// Rate of a 64-bit counter that may wrap around.
pub fn calc_diff_u64(
    value: u64,
    now: i64,
    last_value: u64,
    last_time: i64,
    last_diff: f64,
) -> Result<f64, RateError> {
    let elapsed = elapsed_secs(now, last_time)?;

    let diff = value.wrapping_sub(last_value) as f64 * 60.0 / elapsed;
    accept_wrapped(last_value <= value, diff, last_diff)
}

fn accept_wrapped(increased: bool, diff: f64, last_diff: f64) -> Result<f64, RateError> {
    if increased || diff < last_diff * WRAP_TOLERANCE {
        Ok(diff)
    } else {
        Err(RateError::CounterReset)
    }
}

/// Rate of `value` against `last_value`, interpreted as `ty`.
///
/// `last_diff` is the rate computed on the previous run, `0.0` when there
/// was none.
pub fn calc_rate(
    ty: MetricType,
    value: &Value,
    now: i64,
    last_value: &Value,
    last_time: i64,
    last_diff: f64,
) -> Result<f64, RateError> {
    match ty {
        MetricType::Uint32 => calc_diff_u32(
            value.to_u32(),
            now,
            last_value.to_u32(),
            last_time,
            last_diff,
        ),
        MetricType::Uint64 => calc_diff_u64(
            value.to_u64(),
            now,
            last_value.to_u64(),
            last_time,
            last_diff,
        ),
        MetricType::Float => calc_diff(value.to_f64(), now, last_value.to_f64(), last_time),
    }
}
