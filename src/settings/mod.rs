//! Plugin Settings
//!
//! The small settings file kept next to the rule file: a debug-logging
//! flag, the remote rule fetch feature flag, and the trusted-domain
//! whitelist for it. A missing or unparseable file falls back to defaults
//! (logged); settings problems never abort the responder.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Lower the default log filter to debug
    pub debug_logging: bool,
    /// Allow fetching rule sets over HTTP(S)
    pub remote_fetch_enabled: bool,
    /// Hostnames remote rule sets may be fetched from
    pub trusted_domains: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug_logging: false,
            remote_fetch_enabled: false,
            trusted_domains: Vec::new(),
        }
    }
}

impl Settings {
    /// True when `host` is on the trusted-domain whitelist.
    pub fn trusts(&self, host: &str) -> bool {
        self.trusted_domains
            .iter()
            .any(|domain| domain.eq_ignore_ascii_case(host))
    }

    /// Load settings from `path`, falling back to defaults when the file is
    /// missing or unparseable.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(raw) => match json5::from_str(&raw) {
                Ok(settings) => settings,
                Err(err) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %err,
                        "settings file unparseable; using defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no settings file; using defaults");
                Self::default()
            }
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "settings file unreadable; using defaults"
                );
                Self::default()
            }
        }
    }

    /// Persist settings with whole-file replace semantics (tmp + rename).
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        let tmp_path = path.with_extension("json.tmp");
        {
            let mut file = std::fs::File::create(&tmp_path)?;
            file.write_all(content.as_bytes())?;
            file.write_all(b"\n")?;
        }
        std::fs::rename(&tmp_path, path)
    }
}

/// Shared, hot-reloadable settings snapshot.
pub struct SettingsStore {
    path: PathBuf,
    current: RwLock<Settings>,
}

impl SettingsStore {
    /// Load from `path` immediately; the result (defaults on failure)
    /// becomes the initial snapshot.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = RwLock::new(Settings::load(&path));
        Self { path, current }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn current(&self) -> Settings {
        self.current.read().clone()
    }

    /// Re-read the file and swap the snapshot. The reload entry point for
    /// file-change notifications.
    pub fn reload(&self) -> Settings {
        let settings = Settings::load(&self.path);
        *self.current.write() = settings.clone();
        tracing::info!(path = %self.path.display(), "settings reloaded");
        settings
    }

    /// Persist `settings` and swap the snapshot. On write failure the
    /// snapshot is left unchanged and stays authoritative.
    pub fn update(&self, settings: Settings) -> std::io::Result<()> {
        if let Err(err) = settings.save(&self.path) {
            tracing::error!(
                path = %self.path.display(),
                error = %err,
                "failed to save settings; in-memory settings now diverge from disk"
            );
            return Err(err);
        }
        *self.current.write() = settings;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load(&dir.path().join("settings.json"));
        assert_eq!(settings, Settings::default());
        assert!(!settings.remote_fetch_enabled);
    }

    #[test]
    fn test_unparseable_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not json at all {{{").unwrap();
        assert_eq!(Settings::load(&path), Settings::default());
    }

    #[test]
    fn test_partial_file_uses_field_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ debug_logging: true }"#).unwrap();

        let settings = Settings::load(&path);
        assert!(settings.debug_logging);
        assert!(!settings.remote_fetch_enabled);
        assert!(settings.trusted_domains.is_empty());
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));

        let settings = Settings {
            debug_logging: true,
            remote_fetch_enabled: true,
            trusted_domains: vec!["rules.example.org".to_string()],
        };
        store.update(settings.clone()).unwrap();
        assert_eq!(store.current(), settings);

        let reread = SettingsStore::new(store.path());
        assert_eq!(reread.current(), settings);
    }

    #[test]
    fn test_reload_picks_up_external_edit() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(&path);
        assert!(!store.current().debug_logging);

        std::fs::write(&path, r#"{ "debug_logging": true }"#).unwrap();
        let reloaded = store.reload();
        assert!(reloaded.debug_logging);
        assert!(store.current().debug_logging);
    }

    #[test]
    fn test_trusts_is_case_insensitive() {
        let settings = Settings {
            debug_logging: false,
            remote_fetch_enabled: true,
            trusted_domains: vec!["Rules.Example.ORG".to_string()],
        };
        assert!(settings.trusts("rules.example.org"));
        assert!(!settings.trusts("evil.example.org"));
    }
}
