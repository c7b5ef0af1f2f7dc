use std::{
    collections::{HashMap, HashSet},
    fs,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::error::ConfigError;

/// An env-style `KEY=value` file, e.g. `.env`.
///
/// Rewrites are read-modify-write: only the lines for the updated keys change,
/// comments and unrelated entries are kept in place, and keys that are not
/// present yet are appended.
#[derive(Debug, Clone)]
pub struct EnvFile {
    path: PathBuf,
}

impl EnvFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse every entry. A missing file reads as empty.
    pub fn read(&self) -> Result<HashMap<String, String>, ConfigError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let iter = dotenvy::from_path_iter(&self.path).map_err(|source| self.parse_err(source))?;
        iter.map(|item| item.map_err(|source| self.parse_err(source)))
            .collect()
    }

    /// Read a single key, treating blank values as absent.
    pub fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        Ok(self.read()?.remove(key).filter(|v| !v.trim().is_empty()))
    }

    /// Set `entries` in place, preserving every other line.
    pub fn update(&self, entries: &[(&str, &str)]) -> Result<(), ConfigError> {
        let existing = match fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: self.path.clone(),
                    source,
                });
            },
        };

        let rendered = render_update(&existing, entries);
        self.write(&rendered)?;
        debug!(
            path = %self.path.display(),
            keys = entries.len(),
            "updated env file"
        );
        Ok(())
    }

    fn write(&self, contents: &str) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(&self.path, contents).map_err(write_err)?;

        // Holds client secret and tokens.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))
                .map_err(write_err)?;
        }
        Ok(())
    }

    fn parse_err(&self, source: dotenvy::Error) -> ConfigError {
        ConfigError::Parse {
            path: self.path.clone(),
            source,
        }
    }
}

fn render_update(existing: &str, entries: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(existing.len() + 128);
    let mut written: HashSet<&str> = HashSet::new();

    for line in existing.lines() {
        let replacement = line_key(line).and_then(|(prefix, key)| {
            entries
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(k, v)| (prefix, *k, *v))
        });
        match replacement {
            Some((prefix, key, value)) => {
                out.push_str(prefix);
                out.push_str(&format_entry(key, value));
                written.insert(key);
            },
            None => out.push_str(line),
        }
        out.push('\n');
    }

    for (key, value) in entries {
        if written.insert(key) {
            out.push_str(&format_entry(key, value));
            out.push('\n');
        }
    }
    out
}

/// Split an assignment line into its `export ` prefix and key.
fn line_key(line: &str) -> Option<(&str, &str)> {
    let trimmed = line.trim_start();
    if trimmed.starts_with('#') {
        return None;
    }
    let (prefix, rest) = match trimmed.strip_prefix("export ") {
        Some(rest) => ("export ", rest),
        None => ("", trimmed),
    };
    let (key, _) = rest.split_once('=')?;
    let key = key.trim();
    (!key.is_empty()).then_some((prefix, key))
}

fn format_entry(key: &str, value: &str) -> String {
    let needs_quotes = value
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '#' | '"' | '\'' | '\\' | '$'));
    if !needs_quotes {
        format!("{key}={value}")
    } else if !value.contains('\'') {
        // Single quotes are literal: no escapes, no `$` expansion.
        format!("{key}='{value}'")
    } else {
        let escaped = value
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('$', "\\$");
        format!("{key}=\"{escaped}\"")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let env = EnvFile::new(dir.path().join(".env"));
        assert!(env.read().unwrap().is_empty());
        assert!(env.get("SCHWAB_CLIENT_ID").unwrap().is_none());
    }

    #[test]
    fn update_preserves_unrelated_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(
            &path,
            "# brokerage\nSCHWAB_CLIENT_ID=abc\nSCHWAB_ACCESS_TOKEN=old\nOTHER=keep_me\n",
        )
        .unwrap();

        let env = EnvFile::new(&path);
        env.update(&[("SCHWAB_ACCESS_TOKEN", "new.token@")])
            .unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert_eq!(
            raw,
            "# brokerage\nSCHWAB_CLIENT_ID=abc\nSCHWAB_ACCESS_TOKEN=new.token@\nOTHER=keep_me\n"
        );
        let map = env.read().unwrap();
        assert_eq!(map["SCHWAB_ACCESS_TOKEN"], "new.token@");
        assert_eq!(map["SCHWAB_CLIENT_ID"], "abc");
    }

    #[test]
    fn update_appends_missing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(&path, "SCHWAB_CLIENT_ID=abc").unwrap();

        let env = EnvFile::new(&path);
        env.update(&[("SCHWAB_ACCESS_TOKEN", "a1"), ("SCHWAB_REFRESH_TOKEN", "r1")])
            .unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert_eq!(
            raw,
            "SCHWAB_CLIENT_ID=abc\nSCHWAB_ACCESS_TOKEN=a1\nSCHWAB_REFRESH_TOKEN=r1\n"
        );
    }

    #[test]
    fn update_keeps_export_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(&path, "export SCHWAB_REFRESH_TOKEN=old\n").unwrap();

        EnvFile::new(&path)
            .update(&[("SCHWAB_REFRESH_TOKEN", "new")])
            .unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "export SCHWAB_REFRESH_TOKEN=new\n"
        );
    }

    #[test]
    fn values_with_spaces_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let env = EnvFile::new(dir.path().join("nested").join(".env"));
        env.update(&[("NOTE", "two words # not a comment")])
            .unwrap();
        assert_eq!(
            env.get("NOTE").unwrap().as_deref(),
            Some("two words # not a comment")
        );
    }

    #[test]
    fn quote_and_dollar_round_trip_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let env = EnvFile::new(dir.path().join(".env"));
        let value = r#"it's$QUOTEBRIDGE_UNSET_VAR "x" \ end"#;
        env.update(&[("TOKEN", value)]).unwrap();
        assert_eq!(env.get("TOKEN").unwrap().as_deref(), Some(value));
    }

    #[test]
    fn commented_key_is_not_replaced() {
        let out = render_update("#SCHWAB_ACCESS_TOKEN=x\n", &[("SCHWAB_ACCESS_TOKEN", "y")]);
        assert_eq!(out, "#SCHWAB_ACCESS_TOKEN=x\nSCHWAB_ACCESS_TOKEN=y\n");
    }

    #[cfg(unix)]
    #[test]
    fn update_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        EnvFile::new(&path).update(&[("K", "v")]).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
