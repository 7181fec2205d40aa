use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::RwLock;
use std::time::Duration;

fn default_max_images() -> usize {
    3
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_delay_ms() -> u64 {
    2000
}

fn default_doctors_path() -> PathBuf {
    PathBuf::from("data/doctors.json")
}

fn default_portal_source() -> String {
    "Dermatology Portal".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    // Webhook that receives the multipart submission
    #[serde(default)]
    pub webhook_url: String,
    #[serde(default = "default_max_images")]
    pub max_images: usize,
    // Extra attempts after the first one
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_doctors_path")]
    pub doctors_path: PathBuf,
    #[serde(default = "default_portal_source")]
    pub portal_source: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            webhook_url: String::new(),
            max_images: default_max_images(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            doctors_path: default_doctors_path(),
            portal_source: default_portal_source(),
        }
    }
}

lazy_static! {
    pub static ref APP_CONFIG: RwLock<AppConfig> = RwLock::new(AppConfig::default());
}

fn config_file_path() -> PathBuf {
    // Allow override for tests and deployments via env var
    if let Ok(p) = std::env::var("INTAKE_CONFIG_PATH") {
        return PathBuf::from(p);
    }
    PathBuf::from("intake_config.json")
}

impl AppConfig {
    pub fn load_from_file(path: &std::path::Path) -> std::io::Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let s: AppConfig = serde_json::from_str(&data)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        Ok(s)
    }

    pub fn save_to_file(&self, path: &std::path::Path) -> std::io::Result<()> {
        let data = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, data)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Parsed webhook endpoint; an empty or malformed URL is an error.
    pub fn webhook(&self) -> Result<url::Url, url::ParseError> {
        url::Url::parse(self.webhook_url.trim())
    }
}

pub fn load_config_from_disk() {
    let path = config_file_path();
    match AppConfig::load_from_file(&path) {
        Ok(cfg) => {
            if let Ok(mut guard) = APP_CONFIG.write() {
                *guard = cfg;
            }
            log::info!("Loaded intake config from {}", path.to_string_lossy());
        }
        Err(e) => {
            // Keep defaults if missing/unreadable
            log::info!(
                "Using default intake config; cannot load {}: {}",
                path.to_string_lossy(),
                e
            );
        }
    }
}

/// Snapshot of the current process-wide config.
pub fn current() -> AppConfig {
    APP_CONFIG
        .read()
        .map(|c| c.clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config_path(name: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("{}_{}.json", name, std::process::id()));
        p
    }

    #[test]
    fn save_then_load_roundtrip() {
        let path = temp_config_path("intake_config_roundtrip");
        let cfg = AppConfig {
            webhook_url: "https://hooks.example.org/intake".to_string(),
            max_retries: 5,
            ..AppConfig::default()
        };
        cfg.save_to_file(&path).unwrap();

        let loaded = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.webhook_url, cfg.webhook_url);
        assert_eq!(loaded.max_retries, 5);
        assert_eq!(loaded.max_images, 3);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg: AppConfig = serde_json::from_str(r#"{"webhook_url":"https://x.test/h"}"#).unwrap();
        assert_eq!(cfg.max_images, 3);
        assert_eq!(cfg.max_retries, 2);
        assert_eq!(cfg.retry_delay(), Duration::from_secs(2));
        assert_eq!(cfg.doctors_path, PathBuf::from("data/doctors.json"));
        assert_eq!(cfg.portal_source, "Dermatology Portal");
        assert!(cfg.webhook().is_ok());
    }

    #[test]
    fn empty_webhook_is_rejected() {
        assert!(AppConfig::default().webhook().is_err());
    }

    #[test]
    fn garbage_file_is_invalid_data() {
        let path = temp_config_path("intake_config_garbage");
        std::fs::write(&path, "{ not json").unwrap();
        let err = AppConfig::load_from_file(&path).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
        let _ = std::fs::remove_file(path);
    }
}
