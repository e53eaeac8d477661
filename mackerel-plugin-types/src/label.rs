//! Default display labels.

use alloc::string::String;

/// Derive a display label from a graph key or metric name.
///
/// `.` and `_` become spaces and the first letter of every word is
/// upper-cased. Other letters are left untouched, so `testP.fuga` becomes
/// `TestP Fuga`.
///
/// ```rust
/// use mackerel_plugin_types::title;
///
/// assert_eq!(title("memcached.cmd_get"), "Memcached Cmd Get");
/// ```
pub fn title(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut word_start = true;

    for c in s.chars() {
        let c = if c == '.' || c == '_' { ' ' } else { c };
        if word_start && c.is_alphabetic() {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        word_start = !c.is_alphanumeric();
    }

    out
}
