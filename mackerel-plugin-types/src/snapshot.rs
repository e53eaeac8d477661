//! Snapshot - the readings of one run together with their timestamp.

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::String;

use crate::Value;

/// Readings keyed by metric name.
pub type Readings = BTreeMap<String, Value>;

/// Key prefix under which the last computed rate of a counter is kept.
pub const LAST_DIFF_PREFIX: &str = ".last_diff.";

/// Auxiliary key holding the last computed rate of `name`.
pub fn last_diff_key(name: &str) -> String {
    format!("{LAST_DIFF_PREFIX}{name}")
}

/// A point-in-time set of readings.
///
/// One snapshot is produced per run from the freshly fetched readings; the
/// previous run's snapshot is loaded back from disk to compute counter
/// rates. Besides raw readings it carries one `.last_diff.<name>` entry per
/// counter that produced a rate, used to tell a wrapped counter from a
/// reset one.
///
/// Saving and loading keeps each number but not its integer width: a
/// `U64` small enough for 32 bits comes back as `U32`. Compare integers
/// through [`Value::to_u64`] rather than by variant.
///
/// # Example
///
/// ```rust
/// use mackerel_plugin_types::{Snapshot, Value};
///
/// let snapshot = Snapshot::builder()
///     .timestamp(1437227240)
///     .value("cmd_get", 1000u64)
///     .last_diff("cmd_get", 300.0)
///     .build();
///
/// assert_eq!(snapshot.get("cmd_get"), Some(&Value::U64(1000)));
/// assert_eq!(snapshot.last_diff("cmd_get"), Some(300.0));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    /// Unix timestamp in seconds when the readings were taken.
    ///
    /// `0` for a snapshot that was never persisted.
    pub timestamp: i64,

    /// Raw readings plus `.last_diff.` entries.
    pub values: Readings,
}

impl Snapshot {
    /// Create a snapshot from fetched readings.
    pub fn new(values: Readings, timestamp: i64) -> Self {
        Self { timestamp, values }
    }

    /// Create an empty snapshot with a specific timestamp.
    pub fn with_timestamp(timestamp: i64) -> Self {
        Self {
            timestamp,
            values: BTreeMap::new(),
        }
    }

    /// Create a builder for constructing snapshots.
    pub fn builder() -> SnapshotBuilder {
        SnapshotBuilder::new()
    }

    /// Check if the snapshot holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of stored values, auxiliary entries included.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Get the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Check if `key` was present when the snapshot was taken.
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Store a value under `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// The last rate computed for counter `name`, if any.
    pub fn last_diff(&self, name: &str) -> Option<f64> {
        self.values.get(&last_diff_key(name)).map(Value::to_f64)
    }

    /// Record the rate just computed for counter `name`.
    pub fn set_last_diff(&mut self, name: &str, rate: f64) {
        self.values.insert(last_diff_key(name), Value::F64(rate));
    }

    /// Drop every NaN and infinite value.
    ///
    /// Returns the number of values removed.
    pub fn retain_finite(&mut self) -> usize {
        let before = self.values.len();
        self.values.retain(|_, v| v.is_finite());
        before - self.values.len()
    }

    /// Iterate over all stored values.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }
}

/// Builder for constructing `Snapshot` instances.
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    timestamp: i64,
    values: Readings,
}

impl SnapshotBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the timestamp (seconds since Unix epoch).
    pub fn timestamp(mut self, ts: i64) -> Self {
        self.timestamp = ts;
        self
    }

    /// Add a raw value.
    pub fn value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Add a last computed rate for counter `name`.
    pub fn last_diff(mut self, name: &str, rate: f64) -> Self {
        self.values.insert(last_diff_key(name), Value::F64(rate));
        self
    }

    /// Build the snapshot.
    pub fn build(self) -> Snapshot {
        Snapshot {
            timestamp: self.timestamp,
            values: self.values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_builder() {
        let snapshot = Snapshot::builder()
            .timestamp(1437227240)
            .value("foo.1.bar", 500u64)
            .value("label", "17")
            .last_diff("foo.1.bar", 2.0)
            .build();

        assert_eq!(snapshot.timestamp, 1437227240);
        assert_eq!(snapshot.len(), 3);
        assert!(snapshot.contains_key("foo.1.bar"));
        assert!(snapshot.contains_key(".last_diff.foo.1.bar"));
        assert_eq!(snapshot.get("label"), Some(&Value::from("17")));
    }

    #[test]
    fn default_snapshot_is_empty_at_epoch() {
        let snapshot = Snapshot::default();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.timestamp, 0);
    }

    #[test]
    fn last_diff_key_is_prefixed() {
        assert_eq!(last_diff_key("cmd_get"), ".last_diff.cmd_get");
    }

    #[test]
    fn last_diff_absent_until_set() {
        let mut snapshot = Snapshot::with_timestamp(10);
        snapshot.insert("cmd_get", 1000u64);
        assert_eq!(snapshot.last_diff("cmd_get"), None);

        snapshot.set_last_diff("cmd_get", 42.5);
        assert_eq!(snapshot.last_diff("cmd_get"), Some(42.5));
    }

    #[test]
    fn last_diff_accepts_integer_values() {
        let snapshot = Snapshot::builder()
            .value(".last_diff.cmd_get", 300u32)
            .build();
        assert_eq!(snapshot.last_diff("cmd_get"), Some(300.0));
    }

    #[test]
    fn retain_finite_drops_nan_and_infinities() {
        let mut snapshot = Snapshot::builder()
            .value("key1", 3.0)
            .value("key2", f64::INFINITY)
            .value("key3", f64::NEG_INFINITY)
            .value("key4", f64::NAN)
            .value("key5", u64::MAX)
            .build();

        assert_eq!(snapshot.retain_finite(), 3);
        let keys: alloc::vec::Vec<&str> = snapshot.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["key1", "key5"]);
    }
}
