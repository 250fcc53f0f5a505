use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::infra::metrics::MetricsServerConfig;

const CONFIG_DIR_ENV: &str = "APP_CONFIG_DIR";
const CONFIG_PROFILE_ENV: &str = "APP_CONFIG_PROFILE";
const DEFAULT_CONFIG_DIR: &str = "config";
const DEFAULT_PROFILE: &str = "default";

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8080/api";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub request_timeout_ms: Option<u64>,
    pub metrics_addr: Option<String>,
    pub metrics_auth_token: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let base_dir = env::var(CONFIG_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_DIR));
        Self::load_from_dir(&base_dir)
    }

    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let mut config = AppConfig::default();
        let mut overlays = Vec::new();

        if dir.exists() {
            let mut profiles = Vec::new();
            profiles.push(DEFAULT_PROFILE.to_string());
            if let Ok(active_profile) = env::var(CONFIG_PROFILE_ENV) {
                if !active_profile.trim().is_empty() && active_profile != DEFAULT_PROFILE {
                    profiles.push(active_profile);
                }
            }
            profiles.push("local".to_string());

            for profile in profiles {
                let candidate = dir.join(format!("{profile}.toml"));
                if let Some(overlay) = ConfigOverlay::from_file(&candidate)? {
                    overlays.push(overlay);
                }
            }
        }

        overlays.push(ConfigOverlay::from_env());

        for overlay in overlays {
            config.apply_overlay(overlay);
        }

        Ok(config)
    }

    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    pub fn client_config(&self) -> owui_client::ClientConfig {
        owui_client::ClientConfig {
            api_url: self.api_url().to_string(),
            api_key: self.api_key.clone(),
            timeout: self.request_timeout_ms.map(Duration::from_millis),
        }
    }

    pub fn metrics_server_config(&self) -> Result<Option<MetricsServerConfig>> {
        let addr = match self.metrics_addr.as_ref() {
            Some(addr) => addr
                .parse::<SocketAddr>()
                .with_context(|| format!("parse METRICS_ADDR '{}'", addr))?,
            None => return Ok(None),
        };
        Ok(Some(MetricsServerConfig {
            addr,
            auth_token: self.metrics_auth_token.clone(),
        }))
    }

    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        if let Some(value) = overlay.api_url {
            self.api_url = Some(value);
        }
        if let Some(value) = overlay.api_key {
            self.api_key = Some(value);
        }
        if let Some(value) = overlay.request_timeout_ms {
            self.request_timeout_ms = Some(value);
        }
        if let Some(value) = overlay.metrics_addr {
            self.metrics_addr = Some(value);
        }
        if let Some(value) = overlay.metrics_auth_token {
            self.metrics_auth_token = Some(value);
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigOverlay {
    api_url: Option<String>,
    api_key: Option<String>,
    request_timeout_ms: Option<u64>,
    metrics_addr: Option<String>,
    metrics_auth_token: Option<String>,
}

impl ConfigOverlay {
    fn from_file(path: &Path) -> Result<Option<Self>> {
        if !path.is_file() {
            return Ok(None);
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let overlay: Self = toml::from_str(&contents)
            .with_context(|| format!("parse config file {}", path.display()))?;
        Ok(Some(overlay))
    }

    fn from_env() -> Self {
        Self {
            api_url: env::var("OWUI_API_URL").ok(),
            api_key: env::var("OWUI_API_KEY").ok(),
            request_timeout_ms: env::var("OWUI_REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok()),
            metrics_addr: env::var("METRICS_ADDR").ok(),
            metrics_auth_token: env::var("METRICS_AUTH_TOKEN").ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn with_env<F: FnOnce()>(vars: &[(&str, Option<&str>)], f: F) {
        let _guard = ENV_MUTEX.lock().expect("env mutex");
        let snapshot: Vec<(String, Option<String>)> = vars
            .iter()
            .map(|(k, _)| (k.to_string(), env::var(k).ok()))
            .collect();
        for (key, value) in vars {
            match value {
                Some(val) => unsafe {
                    // SAFETY: tests run serially within helper and restore prior state.
                    env::set_var(key, val);
                },
                None => unsafe {
                    env::remove_var(key);
                },
            }
        }
        f();
        for (key, value) in snapshot {
            match value {
                Some(val) => unsafe {
                    env::set_var(&key, val);
                },
                None => unsafe {
                    env::remove_var(&key);
                },
            }
        }
    }

    #[test]
    fn load_from_dir_without_files_uses_defaults() -> Result<()> {
        let dir = tempdir()?;
        with_env(
            &[
                ("OWUI_API_URL", None),
                ("OWUI_API_KEY", None),
                ("OWUI_REQUEST_TIMEOUT_MS", None),
                ("METRICS_ADDR", None),
                ("METRICS_AUTH_TOKEN", None),
            ],
            || {
                let cfg = AppConfig::load_from_dir(dir.path()).expect("config load");
                assert_eq!(cfg.api_url(), DEFAULT_API_URL);
                assert!(cfg.api_key.is_none());
                assert!(cfg.metrics_server_config().expect("metrics cfg").is_none());
            },
        );
        Ok(())
    }

    #[test]
    fn load_merges_profile_local_and_env() -> Result<()> {
        let dir = tempdir()?;
        std::fs::write(
            dir.path().join("default.toml"),
            "api_url = \"http://10.0.0.1:8080/api\"\n",
        )?;
        std::fs::write(dir.path().join("beta.toml"), "request_timeout_ms = 5000\n")?;
        std::fs::write(
            dir.path().join("local.toml"),
            "metrics_addr = \"127.0.0.1:9100\"\n",
        )?;

        with_env(
            &[
                (CONFIG_PROFILE_ENV, Some("beta")),
                ("OWUI_API_URL", Some("http://127.0.0.1:3000/api")),
                ("OWUI_API_KEY", Some("secret")),
                ("METRICS_AUTH_TOKEN", Some("token")),
            ],
            || {
                let cfg = AppConfig::load_from_dir(dir.path()).expect("config load");
                // env beats local.toml beats profile beats default
                assert_eq!(cfg.api_url(), "http://127.0.0.1:3000/api");
                assert_eq!(cfg.api_key.as_deref(), Some("secret"));
                assert_eq!(cfg.request_timeout_ms, Some(5000));
                let metrics = cfg
                    .metrics_server_config()
                    .expect("metrics cfg")
                    .expect("metrics enabled");
                assert_eq!(metrics.addr, "127.0.0.1:9100".parse().unwrap());
                assert_eq!(metrics.auth_token.as_deref(), Some("token"));
            },
        );
        Ok(())
    }

    #[test]
    fn bad_metrics_addr_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        with_env(&[("METRICS_ADDR", Some("not-an-addr"))], || {
            let cfg = AppConfig::load_from_dir(dir.path()).expect("config load");
            assert!(cfg.metrics_server_config().is_err());
        });
        Ok(())
    }
}
