//! User configuration loading and on-disk path resolution.
//!
//! Configuration lives at `~/.config/pipsea/config.toml` (falling back to
//! `$XDG_CONFIG_HOME` when `HOME` is unavailable). A missing or malformed
//! file silently yields the defaults: the application must start even on a
//! pristine machine.

use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Default package index base URL.
pub const DEFAULT_MIRROR: &str = "https://pypi.org";

/// User configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Package manager selection.
    pub package_manager: PackageManagerConfig,
    /// Package index connection settings.
    pub pypi: PypiConfig,
}

/// Preferred package manager, e.g. `"uv"`, `"pip"`, `"pip3"`; empty means
/// auto-detect.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PackageManagerConfig {
    /// Binary name to prefer when resolving the manager.
    pub preferred: String,
}

/// Package index connection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PypiConfig {
    /// Base URL of the index; defaults to [`DEFAULT_MIRROR`].
    pub mirror: String,
}

impl Default for PypiConfig {
    fn default() -> Self {
        Self {
            mirror: DEFAULT_MIRROR.to_string(),
        }
    }
}

/// Resolve an XDG base directory from environment or default to `$HOME` plus
/// the given segments.
fn xdg_base_dir(var: &str, home_default: &[&str]) -> PathBuf {
    if let Ok(p) = env::var(var)
        && !p.trim().is_empty()
    {
        return PathBuf::from(p);
    }
    let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    let mut base = PathBuf::from(home);
    for seg in home_default {
        base = base.join(seg);
    }
    base
}

/// Return `$HOME/.config/pipsea`, ensuring it exists. `None` when `HOME` is
/// unset or the directory cannot be created.
fn home_config_dir() -> Option<PathBuf> {
    if let Ok(home) = env::var("HOME") {
        let dir = Path::new(&home).join(".config").join("pipsea");
        if std::fs::create_dir_all(&dir).is_ok() {
            return Some(dir);
        }
    }
    None
}

/// Config directory for pipsea (ensured to exist).
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(dir) = home_config_dir() {
        return dir;
    }
    let base = xdg_base_dir("XDG_CONFIG_HOME", &[".config"]);
    let dir = base.join("pipsea");
    let _ = std::fs::create_dir_all(&dir);
    dir
}

/// Logs directory under config: `~/.config/pipsea/logs` (ensured to exist).
#[must_use]
pub fn logs_dir() -> PathBuf {
    let dir = config_dir().join("logs");
    let _ = std::fs::create_dir_all(&dir);
    dir
}

/// Load the user configuration, falling back to defaults when the file is
/// missing or unreadable.
#[must_use]
pub fn load() -> Config {
    let path = config_dir().join("config.toml");
    let Ok(data) = std::fs::read_to_string(&path) else {
        return Config::default();
    };
    let mut cfg: Config = toml::from_str(&data).unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), error = %e, "malformed config; using defaults");
        Config::default()
    });
    if cfg.pypi.mirror.trim().is_empty() {
        cfg.pypi.mirror = DEFAULT_MIRROR.to_string();
    }
    cfg
}

#[cfg(test)]
mod tests {
    use super::*;

    /// What: A full config file parses into all fields.
    #[test]
    fn config_parses_all_sections() {
        let cfg: Config = toml::from_str(
            r#"
            [package_manager]
            preferred = "uv"

            [pypi]
            mirror = "https://mirror.example.com"
            "#,
        )
        .expect("valid config");
        assert_eq!(cfg.package_manager.preferred, "uv");
        assert_eq!(cfg.pypi.mirror, "https://mirror.example.com");
    }

    /// What: Missing sections fall back to defaults.
    #[test]
    fn config_defaults_missing_sections() {
        let cfg: Config = toml::from_str("[package_manager]\npreferred = \"pip\"\n")
            .expect("valid config");
        assert_eq!(cfg.package_manager.preferred, "pip");
        assert_eq!(cfg.pypi.mirror, DEFAULT_MIRROR);
    }

    /// What: An empty document is the default configuration.
    #[test]
    fn config_empty_is_default() {
        let cfg: Config = toml::from_str("").expect("valid config");
        assert!(cfg.package_manager.preferred.is_empty());
        assert_eq!(cfg.pypi.mirror, DEFAULT_MIRROR);
    }
}
