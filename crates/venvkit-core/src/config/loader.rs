//! Environment variable loading.
//!
//! Fallback chains are kept here so callers never repeat `or_else` ladders.

use std::env;
use std::path::Path;

/// Parse one `.env` line into `(key, value)`.
///
/// Blank lines and `#` comments yield `None`. Surrounding quotes are stripped and
/// an unquoted trailing `# comment` is dropped.
pub fn parse_dotenv_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").unwrap_or(line);
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let mut value = line[eq_pos + 1..].trim();
    if let Some(hash_pos) = value.find('#') {
        let before_hash = value[..hash_pos].trim_end();
        if !before_hash.contains('"') && !before_hash.contains('\'') {
            value = before_hash;
        }
    }
    if value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')))
    {
        value = &value[1..value.len() - 1];
    }
    if key.is_empty() {
        return None;
    }
    Some((key, value))
}

/// Load `<dir>/.env` into the process environment without overriding variables
/// that are already set. Returns how many variables were applied.
pub fn load_dotenv_from_dir(dir: &Path) -> usize {
    let path = dir.join(".env");
    let Ok(content) = std::fs::read_to_string(&path) else {
        return 0;
    };
    let mut applied = 0;
    for (key, value) in content.lines().filter_map(parse_dotenv_line) {
        if env::var_os(key).is_none() {
            env::set_var(key, value);
            applied += 1;
        }
    }
    if applied > 0 {
        tracing::debug!(path = %path.display(), applied, "loaded .env");
    }
    applied
}

/// Load `.env` from the current directory, once per process.
pub fn load_dotenv() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let dir = env::current_dir().unwrap_or_else(|_| std::path::PathBuf::from("."));
        load_dotenv_from_dir(&dir);
    });
}

/// Read the primary key or the first set alias, falling back to `default`.
/// Empty values count as unset.
pub fn env_or<F>(primary: &str, aliases: &[&str], default: F) -> String
where
    F: FnOnce() -> String,
{
    env_optional(primary, aliases).unwrap_or_else(default)
}

/// Raw value of `primary`, else of the first alias that is set.
fn lookup(primary: &str, aliases: &[&str]) -> Option<String> {
    std::iter::once(primary)
        .chain(aliases.iter().copied())
        .find_map(|key| env::var(key).ok())
}

/// Trimmed value of `primary` or an alias. Blank counts as unset.
pub fn env_optional(primary: &str, aliases: &[&str]) -> Option<String> {
    let value = lookup(primary, aliases)?;
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// `0`, `false`, `no` and `off` (any case) disable the flag; any other value
/// enables it. Unset keys give `default`.
pub fn env_bool(primary: &str, aliases: &[&str], default: bool) -> bool {
    lookup(primary, aliases).map_or(default, |raw| {
        let raw = raw.trim().to_ascii_lowercase();
        !matches!(raw.as_str(), "0" | "false" | "no" | "off")
    })
}
