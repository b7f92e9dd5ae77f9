use directories::BaseDirs;
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tg_core::{history::DEFAULT_CAPACITY, ClientOptions};
use thiserror::Error;
use tracing::{debug, info, warn};

// A zero interval would send the keepalive on every tick.
const MIN_IDLE_SECS: u64 = 1;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid value for {key}: {value:?}")]
    Env { key: &'static str, value: String },
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ClientFileConfig {
    pub history_capacity: Option<usize>,
    pub reconnect_attempts: Option<u32>,
    pub idle_interval_secs: Option<u64>,
    pub title: Option<String>,
    pub options: Option<ClientOptions>,
    pub local: Option<LocalFileConfig>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct LocalFileConfig {
    pub greeting: Option<String>,
    pub latency_ms: Option<u64>,
}

/// Settings for the built-in offline runtime.
#[derive(Clone, Debug)]
pub struct LocalConfig {
    pub greeting: String,
    pub latency: Duration,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            greeting: "Welcome to the local sandbox. Type 'help' for commands.".to_string(),
            latency: Duration::from_millis(40),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub history_capacity: usize,
    pub reconnect_attempts: u32,
    pub idle_interval: Duration,
    pub title: String,
    pub options: ClientOptions,
    pub local: LocalConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_CAPACITY,
            reconnect_attempts: 3,
            idle_interval: Duration::from_secs(180),
            title: "Evennia".to_string(),
            options: ClientOptions::default(),
            local: LocalConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn from_env_and_file() -> Result<Self, ConfigError> {
        let path = Self::config_path();
        Self::load(path.as_deref(), |k| env::var(k).ok())
    }

    /// Defaults, then the TOML file at `path` (if it exists), then env overrides.
    pub fn load(
        path: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut cfg = ClientConfig::default();

        if let Some(path) = path {
            if path.exists() {
                let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                let file_cfg: ClientFileConfig =
                    toml::from_str(&raw).map_err(|source| ConfigError::Parse {
                        path: path.to_path_buf(),
                        source,
                    })?;
                cfg.merge_file(file_cfg);
                info!(target: "transport", "loaded config from {}", path.display());
            } else {
                debug!(target: "transport", "no config file at {}", path.display());
            }
        }

        if let Some(v) = env("TG_HISTORY_SIZE") {
            cfg.history_capacity = parse_env("TG_HISTORY_SIZE", v)?;
        }
        if let Some(v) = env("TG_RECONNECT_ATTEMPTS") {
            cfg.reconnect_attempts = parse_env("TG_RECONNECT_ATTEMPTS", v)?;
        }
        if let Some(v) = env("TG_IDLE_SECS") {
            let secs: u64 = parse_env("TG_IDLE_SECS", v.clone())?;
            if secs < MIN_IDLE_SECS {
                return Err(ConfigError::Env {
                    key: "TG_IDLE_SECS",
                    value: v,
                });
            }
            cfg.idle_interval = Duration::from_secs(secs);
        }
        if let Some(v) = env("TG_DEBUG") {
            cfg.options.debug_enabled = matches!(v.trim(), "1" | "true" | "yes" | "on");
        }
        Ok(cfg)
    }

    fn merge_file(&mut self, file_cfg: ClientFileConfig) {
        if let Some(n) = file_cfg.history_capacity {
            self.history_capacity = n;
        }
        if let Some(n) = file_cfg.reconnect_attempts {
            self.reconnect_attempts = n;
        }
        if let Some(secs) = file_cfg.idle_interval_secs {
            if secs < MIN_IDLE_SECS {
                warn!(target: "transport", "idle_interval_secs = {} raised to {}", secs, MIN_IDLE_SECS);
            }
            self.idle_interval = Duration::from_secs(secs.max(MIN_IDLE_SECS));
        }
        if let Some(t) = file_cfg.title {
            self.title = t;
        }
        if let Some(o) = file_cfg.options {
            self.options = o;
        }
        if let Some(local) = file_cfg.local {
            if let Some(g) = local.greeting {
                self.local.greeting = g;
            }
            if let Some(ms) = local.latency_ms {
                self.local.latency = Duration::from_millis(ms);
            }
        }
    }

    pub fn config_path() -> Option<PathBuf> {
        let base = BaseDirs::new()?;
        let p = if cfg!(target_os = "windows") {
            base.home_dir().join(".tg").join("config.toml")
        } else {
            base.config_dir().join("tg").join("config.toml")
        };
        Some(p)
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Env { key, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_without_file() {
        let cfg = ClientConfig::load(None, no_env).unwrap();
        assert_eq!(cfg.history_capacity, 21);
        assert_eq!(cfg.reconnect_attempts, 3);
        assert_eq!(cfg.idle_interval, Duration::from_secs(180));
        assert_eq!(cfg.options, ClientOptions::default());
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        let cfg = ClientConfig::load(Some(&path), no_env).unwrap();
        assert_eq!(cfg.title, "Evennia");
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
history_capacity = 5
idle_interval_secs = 30
title = "TG"

[options]
debug_enabled = true
play_sound_on_message = true

[local]
latency_ms = 0
"#,
        )
        .unwrap();
        let cfg = ClientConfig::load(Some(&path), no_env).unwrap();
        assert_eq!(cfg.history_capacity, 5);
        assert_eq!(cfg.reconnect_attempts, 3);
        assert_eq!(cfg.idle_interval, Duration::from_secs(30));
        assert_eq!(cfg.title, "TG");
        assert!(cfg.options.debug_enabled);
        assert!(cfg.options.play_sound_on_message);
        assert!(cfg.options.help_popup);
        assert_eq!(cfg.local.latency, Duration::ZERO);
    }

    #[test]
    fn env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "history_capacity = 5\n").unwrap();
        let vars: HashMap<&str, &str> = [("TG_HISTORY_SIZE", "40"), ("TG_DEBUG", "on")].into();
        let cfg = ClientConfig::load(Some(&path), |k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(cfg.history_capacity, 40);
        assert!(cfg.options.debug_enabled);
    }

    #[test]
    fn malformed_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "history_capacity = \"lots\"\n").unwrap();
        let err = ClientConfig::load(Some(&path), no_env).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn bad_env_number_is_reported() {
        let err = ClientConfig::load(None, |k| {
            (k == "TG_IDLE_SECS").then(|| "soon".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::Env { key: "TG_IDLE_SECS", .. }));
    }

    #[test]
    fn zero_idle_interval_is_refused() {
        let err = ClientConfig::load(None, |k| (k == "TG_IDLE_SECS").then(|| "0".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Env { key: "TG_IDLE_SECS", .. }));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "idle_interval_secs = 0\n").unwrap();
        let cfg = ClientConfig::load(Some(&path), no_env).unwrap();
        assert_eq!(cfg.idle_interval, Duration::from_secs(MIN_IDLE_SECS));
    }
}
