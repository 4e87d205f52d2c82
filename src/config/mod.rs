use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

pub mod settings;

pub use settings::{ConnectionSettings, ServerSettings, Settings};

use crate::snmp::{Authentication, Device, KeyConfig};

/// Профиль по умолчанию, если путь не передан аргументом
pub const DEFAULT_PROFILE_PATH: &str = "./profiles/host-resources.yaml";

/// Главная конфигурация приложения
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Опрашиваемое устройство
    pub device: Device,
    /// Версия SNMP и учётные данные
    pub authentication: Authentication,
    /// Базовые настройки
    #[serde(default)]
    pub settings: Settings,
}

impl AppConfig {
    /// Загружает конфигурацию из YAML файла и применяет переменные окружения
    pub fn load(profile_path: impl AsRef<Path>) -> Result<Self> {
        let path = profile_path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Не удалось прочитать файл: {}", path.display()))?;

        let mut config = Self::from_yaml(&content)?;
        config.apply_env(|key| env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yml::from_str(content).context("Не удалось распарсить YAML")
    }

    /// Переопределения SNMP_*; `lookup` подменяется в тестах
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(host) = lookup("SNMP_HOST") {
            self.device.host = host;
        }
        if let Some(port) = lookup("SNMP_PORT") {
            self.device.port = port
                .parse()
                .with_context(|| format!("SNMP_PORT: невалидный порт '{}'", port))?;
        }
        if let Some(timeout) = lookup("SNMP_TIMEOUT") {
            self.settings.connection.timeout = timeout
                .parse()
                .with_context(|| format!("SNMP_TIMEOUT: ожидалось число секунд, получено '{}'", timeout))?;
        }
        if let Some(listen) = lookup("SNMP_LISTEN") {
            self.settings.server.listen = Some(listen);
        }

        let auth = &mut self.authentication;
        if auth.version == 3 {
            if let Some(user) = lookup("SNMP_USERNAME") {
                auth.user = user;
            }
            if let Some(key) = lookup("SNMP_AUTH_PASSWORD") {
                override_key(&mut auth.auth, key);
            }
            if let Some(key) = lookup("SNMP_PRIVACY_PASSWORD") {
                override_key(&mut auth.privacy, key);
            }
        } else if let Some(community) = lookup("SNMP_COMMUNITY") {
            auth.user = community;
        }

        Ok(())
    }

    /// Таймаут одного SNMP запроса
    pub fn get_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.connection.timeout)
    }

    pub fn debug_config(&self) {
        tracing::debug!(
            target_device = %self.device.target(),
            version = self.authentication.version,
            timeout = self.settings.connection.timeout,
            max_repetitions = self.settings.connection.max_repetitions,
            max_errors = self.settings.connection.max_errors,
            listen = ?self.settings.server.listen,
            "конфигурация загружена"
        );
    }
}

/// Ключ подменяется только если протокол уже задан в профиле
fn override_key(slot: &mut Option<KeyConfig>, key: String) {
    if let Some(config) = slot {
        config.key = key;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const V2C_PROFILE: &str = r#"
device:
  host: 127.0.0.1
authentication:
  version: 2
  user: public
"#;

    const V3_PROFILE: &str = r#"
device: { host: 10.1.1.1, port: 1161 }
authentication:
  version: 3
  user: monitor
  auth: { protocol: SHA256, key: authkey123 }
  priv: { protocol: AES128, key: privkey123 }
settings:
  connection: { timeout: 3, max_errors: 5 }
  server: { listen: "0.0.0.0:3000", allowed_hosts: ["10.1.1.1", "10.1.1.2"] }
"#;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn settings_are_optional() {
        let config = AppConfig::from_yaml(V2C_PROFILE).unwrap();
        assert_eq!(config.device.port, 161);
        assert_eq!(config.settings, Settings::default());
        assert_eq!(config.settings.connection.max_repetitions, 25);
        assert_eq!(config.settings.connection.max_errors, 3);
        assert_eq!(config.get_timeout(), Duration::from_secs(10));
        assert!(config.settings.server.listen.is_none());
        assert!(config.settings.server.allowed_hosts.is_none());
    }

    #[test]
    fn parses_v3_profile() {
        let config = AppConfig::from_yaml(V3_PROFILE).unwrap();
        assert_eq!(config.device.target(), "10.1.1.1:1161");
        assert_eq!(config.authentication.privacy.as_ref().unwrap().protocol, "AES128");
        assert_eq!(config.settings.connection.timeout, 3);
        assert_eq!(config.settings.connection.max_repetitions, 25);
        assert_eq!(config.settings.connection.max_errors, 5);
        assert_eq!(config.settings.server.listen.as_deref(), Some("0.0.0.0:3000"));
        assert_eq!(
            config.settings.server.allowed_hosts,
            Some(vec!["10.1.1.1".to_string(), "10.1.1.2".to_string()])
        );
    }

    #[test]
    fn community_override_applies_to_v2c_only() {
        let mut config = AppConfig::from_yaml(V2C_PROFILE).unwrap();
        config
            .apply_env(env(&[("SNMP_COMMUNITY", "s3cret"), ("SNMP_USERNAME", "ignored"), ("SNMP_PORT", "1161")]))
            .unwrap();
        assert_eq!(config.authentication.user, "s3cret");
        assert_eq!(config.device.port, 1161);
    }

    #[test]
    fn v3_overrides_replace_keys() {
        let mut config = AppConfig::from_yaml(V3_PROFILE).unwrap();
        config
            .apply_env(env(&[
                ("SNMP_USERNAME", "ops"),
                ("SNMP_AUTH_PASSWORD", "new-auth"),
                ("SNMP_PRIVACY_PASSWORD", "new-priv"),
                ("SNMP_COMMUNITY", "ignored"),
            ]))
            .unwrap();

        let auth = &config.authentication;
        assert_eq!(auth.user, "ops");
        assert_eq!(auth.auth.as_ref().unwrap().key, "new-auth");
        assert_eq!(auth.privacy.as_ref().unwrap().key, "new-priv");
    }

    #[test]
    fn bad_timeout_is_an_error() {
        let mut config = AppConfig::from_yaml(V2C_PROFILE).unwrap();
        let err = config.apply_env(env(&[("SNMP_TIMEOUT", "soon")])).unwrap_err();
        assert!(err.to_string().contains("SNMP_TIMEOUT"));
    }

    #[test]
    fn missing_file_has_context() {
        let err = AppConfig::load("/nonexistent/profile.yaml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/profile.yaml"));
    }
}
