use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::schema::QuoteBridgeConfig;

/// Standard config file name, checked project-local first, then user-global.
const CONFIG_FILENAME: &str = "quotebridge.toml";

/// Load config from the given TOML file.
pub fn load_config(path: &Path) -> anyhow::Result<QuoteBridgeConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    toml::from_str(&raw).map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))
}

/// Discover and load config from standard locations, then apply
/// `QUOTEBRIDGE_*` environment overrides.
///
/// Search order:
/// 1. `./quotebridge.toml` (project-local)
/// 2. `~/.config/quotebridge/quotebridge.toml` (user-global)
///
/// Falls back to `QuoteBridgeConfig::default()` when nothing is found or the
/// file is unreadable.
pub fn discover_and_load() -> QuoteBridgeConfig {
    let mut config = match find_config_file() {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(&path).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                QuoteBridgeConfig::default()
            })
        },
        None => {
            debug!("no config file found, using defaults");
            QuoteBridgeConfig::default()
        },
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config
}

/// Override individual fields from `QUOTEBRIDGE_BASE_URL`,
/// `QUOTEBRIDGE_REDIRECT_URI`, `QUOTEBRIDGE_TOKEN_URL` and `QUOTEBRIDGE_ENV_FILE`.
pub fn apply_env_overrides(
    config: &mut QuoteBridgeConfig,
    lookup: impl Fn(&str) -> Option<String>,
) {
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("QUOTEBRIDGE_BASE_URL") {
        config.api.base_url = v;
    }
    if let Some(v) = get("QUOTEBRIDGE_REDIRECT_URI") {
        config.oauth.redirect_uri = v;
    }
    if let Some(v) = get("QUOTEBRIDGE_TOKEN_URL") {
        config.oauth.token_url = Some(v);
    }
    if let Some(v) = get("QUOTEBRIDGE_ENV_FILE") {
        config.env_file = PathBuf::from(v);
    }
}

fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILENAME);
    if local.exists() {
        return Some(local);
    }
    config_dir()
        .map(|dir| dir.join(CONFIG_FILENAME))
        .filter(|p| p.exists())
}

/// Returns `~/.config/quotebridge/` on all platforms.
pub fn config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().join(".config").join("quotebridge"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn load_config_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(
            &path,
            "env_file = \"/tmp/brokerage.env\"\n[api]\nrequest_timeout_secs = 5\n",
        )
        .unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.env_file, PathBuf::from("/tmp/brokerage.env"));
        assert_eq!(cfg.api.request_timeout_secs, 5);
    }

    #[test]
    fn load_config_reports_path_on_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[api\n").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
    }

    #[test]
    fn env_overrides_apply_non_blank_values() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("QUOTEBRIDGE_BASE_URL", "http://localhost:8080"),
            ("QUOTEBRIDGE_REDIRECT_URI", "  "),
            ("QUOTEBRIDGE_ENV_FILE", "secrets.env"),
        ]);
        let mut cfg = QuoteBridgeConfig::default();
        apply_env_overrides(&mut cfg, |k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(cfg.api.base_url, "http://localhost:8080");
        assert_eq!(cfg.oauth.redirect_uri, "https://127.0.0.1");
        assert_eq!(cfg.env_file, PathBuf::from("secrets.env"));
        assert!(cfg.oauth.token_url.is_none());
    }
}
