//! Default location of the state file.
//!
//! Invocations of the same plugin with different arguments (two database
//! ports, say) must not share state, so the file name carries a hash of the
//! command line.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use sha1::{Digest, Sha1};

/// Environment variable overriding the directory state files live in.
pub const WORKDIR_ENV: &str = "MACKEREL_PLUGIN_WORKDIR";

const FILE_PREFIX: &str = "mackerel-plugin-";

/// Directory holding state files: `$MACKEREL_PLUGIN_WORKDIR` if set and
/// non-empty, the system temporary directory otherwise.
pub fn plugin_workdir() -> PathBuf {
    workdir_from(env::var_os(WORKDIR_ENV))
}

fn workdir_from(value: Option<OsString>) -> PathBuf {
    match value {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => env::temp_dir(),
    }
}

/// Replace every character outside `[A-Za-z0-9_.-]` with `_`.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// File name of the state file for a plugin invoked with `args`.
///
/// `args[0]` is the executable; its base name stands in for `prefix` when
/// the plugin has none. The remaining arguments are joined with single
/// spaces and hashed, so the name is stable across runs with the same
/// command line.
pub fn state_file_name(prefix: Option<&str>, args: &[String]) -> String {
    let prefix = match prefix {
        Some(prefix) => prefix.to_string(),
        None => {
            let command = args.first().map(String::as_str).unwrap_or_default();
            let base = Path::new(command)
                .file_name()
                .map(|name| name.to_string_lossy())
                .unwrap_or_default();
            let base = sanitize(&base);
            base.strip_prefix(FILE_PREFIX).unwrap_or(&base).to_string()
        }
    };

    let joined = args.get(1..).unwrap_or_default().join(" ");
    let digest = Sha1::digest(joined.as_bytes());

    format!("{FILE_PREFIX}{prefix}-{digest:x}")
}

/// Full default path of the state file, inside [`plugin_workdir`].
pub fn generate_tempfile_path(prefix: Option<&str>, args: &[String]) -> PathBuf {
    plugin_workdir().join(state_file_name(prefix, args))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn name_without_arguments_hashes_empty_string() {
        assert_eq!(
            state_file_name(Some("foo"), &args(&["mackerel-plugin-foo"])),
            "mackerel-plugin-foo-da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
    }

    #[test]
    fn name_hashes_remaining_arguments() {
        assert_eq!(
            state_file_name(
                Some("mysql"),
                &args(&["mackerel-plugin-mysql", "-host", "hostname1", "-port", "3306"])
            ),
            "mackerel-plugin-mysql-9045504f8fadd7ddcc8962ec1d9fc70e3f7ba627"
        );
    }

    #[test]
    fn different_arguments_get_different_files() {
        let a = state_file_name(Some("mysql"), &args(&["p", "-port", "3306"]));
        let b = state_file_name(Some("mysql"), &args(&["p", "-port", "3307"]));
        assert_ne!(a, b);
    }

    #[test]
    fn executable_name_stands_in_for_prefix() {
        assert_eq!(
            state_file_name(None, &args(&["/usr/bin/mackerel-plugin-foo"])),
            "mackerel-plugin-foo-da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
        assert_eq!(
            state_file_name(None, &args(&["./my plugin"])),
            "mackerel-plugin-my_plugin-da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
    }

    #[test]
    fn empty_command_line_still_yields_a_name() {
        assert_eq!(
            state_file_name(None, &[]),
            "mackerel-plugin--da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
    }

    #[test]
    fn sanitize_replaces_unsafe_characters() {
        assert_eq!(sanitize("foo-bar_1.2"), "foo-bar_1.2");
        assert_eq!(sanitize("a b/c:d"), "a_b_c_d");
        assert_eq!(sanitize("ü"), "_");
    }

    #[test]
    fn workdir_prefers_override() {
        assert_eq!(
            workdir_from(Some(OsString::from("/var/tmp/foo"))),
            PathBuf::from("/var/tmp/foo")
        );
    }

    #[test]
    fn workdir_falls_back_to_temp_dir() {
        assert_eq!(workdir_from(None), env::temp_dir());
        assert_eq!(workdir_from(Some(OsString::new())), env::temp_dir());
    }

    #[test]
    fn tempfile_path_lives_in_workdir() {
        let path = generate_tempfile_path(Some("foo"), &args(&["p"]));
        assert_eq!(path.parent(), Some(plugin_workdir().as_path()));
    }
}
