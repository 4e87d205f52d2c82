use serde::{Deserialize, Serialize};

use crate::snmp::{DEFAULT_MAX_CONSECUTIVE_ERRORS, DEFAULT_MAX_REPETITIONS};

/// Базовые настройки приложения
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Настройки подключения
    #[serde(default)]
    pub connection: ConnectionSettings,
    /// HTTP сервер
    #[serde(default)]
    pub server: ServerSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionSettings {
    /// Таймаут одного SNMP запроса (секунды)
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// max-repetitions для GETBULK
    #[serde(default = "default_max_repetitions")]
    pub max_repetitions: u32,
    /// Ошибочных запросов подряд, после которых обход таблицы прекращается
    #[serde(default = "default_max_errors")]
    pub max_errors: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Адрес для HTTP, например "0.0.0.0:3000". Без него - одноразовый опрос
    #[serde(default)]
    pub listen: Option<String>,
    /// Хосты, которые разрешено опрашивать через HTTP. Без списка - любые
    #[serde(default)]
    pub allowed_hosts: Option<Vec<String>>,
}

fn default_timeout() -> u64 {
    10
}

fn default_max_repetitions() -> u32 {
    DEFAULT_MAX_REPETITIONS
}

fn default_max_errors() -> u32 {
    DEFAULT_MAX_CONSECUTIVE_ERRORS
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            max_repetitions: default_max_repetitions(),
            max_errors: default_max_errors(),
        }
    }
}
