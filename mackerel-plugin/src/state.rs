//! Persisting the previous run's readings.
//!
//! The state file is a flat JSON object: every raw reading, every
//! `.last_diff.<name>` rate, and the snapshot time under `_lastTime`.
//!
//! ```json
//! {".last_diff.cmd_get":500.0,"_lastTime":1437227240,"cmd_get":1000}
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use mackerel_plugin_types::{Readings, Snapshot, Value};
use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use crate::error::{Error, Result};

/// Key holding the snapshot time.
pub const LAST_TIME_KEY: &str = "_lastTime";

/// Load the snapshot stored at `path`.
///
/// A missing file is not an error: it yields an empty snapshot with
/// timestamp `0`, as on a plugin's very first run. Entries that are neither
/// numbers nor strings are ignored.
pub fn load(path: &Path) -> Result<Snapshot> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "no state file yet");
            return Ok(Snapshot::default());
        }
        Err(e) => return Err(e.into()),
    };

    let doc: Map<String, JsonValue> = serde_json::from_str(&content)?;

    let mut timestamp = 0;
    let mut values = Readings::new();
    for (key, raw) in doc {
        if key == LAST_TIME_KEY {
            timestamp = parse_timestamp(&raw);
            continue;
        }
        match serde_json::from_value::<Value>(raw) {
            Ok(value) => {
                values.insert(key, value);
            }
            Err(_) => debug!(key = %key, "skipping non-numeric state entry"),
        }
    }

    Ok(Snapshot::new(values, timestamp))
}

fn parse_timestamp(raw: &JsonValue) -> i64 {
    match raw {
        JsonValue::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        _ => 0,
    }
}

/// Load the snapshot at `path`, refusing one written less than a second
/// before `now`.
///
/// Two invocations that close together would compute a rate over a
/// sub-second interval; the later one gets
/// [`Error::StateRecentlyUpdated`] instead.
pub fn load_guarded(path: &Path, now: i64) -> Result<Snapshot> {
    let snapshot = load(path)?;
    if now - snapshot.timestamp < 1 {
        return Err(Error::StateRecentlyUpdated);
    }
    Ok(snapshot)
}

/// Overwrite `path` with `snapshot`.
///
/// NaN and infinite values have no JSON representation and are dropped.
pub fn save(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let mut snapshot = snapshot.clone();
    let dropped = snapshot.retain_finite();
    if dropped > 0 {
        debug!(dropped, "dropped non-finite values from state");
    }

    let mut doc = Map::new();
    for (key, value) in snapshot.iter() {
        doc.insert(key.clone(), serde_json::to_value(value)?);
    }
    doc.insert(LAST_TIME_KEY.to_string(), JsonValue::from(snapshot.timestamp));

    let mut json = serde_json::to_string(&doc)?;
    json.push('\n');
    fs::write(path, json)?;

    debug!(path = %path.display(), entries = doc.len(), "saved state");
    Ok(())
}
