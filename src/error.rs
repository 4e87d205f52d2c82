use thiserror::Error;

/// Ошибки конфигурации: фатальны для попытки опроса, частичного результата нет
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("неподдерживаемая версия SNMP: {0} (ожидается 1, 2 или 3)")]
    UnsupportedVersion(u8),

    #[error("неизвестный протокол {kind}: '{name}'")]
    UnknownProtocol { kind: ProtocolKind, name: String },

    #[error("протокол {name} не поддерживается SNMP движком")]
    UnsupportedProtocol { name: String },

    #[error("privacy протокол задан без протокола аутентификации")]
    PrivacyWithoutAuth,

    #[error("невалидный OID '{0}'")]
    InvalidOid(String),

    #[error("неизвестный символ {module}::{symbol}")]
    UnknownMibSymbol { module: String, symbol: String },

    #[error("пустой список OID для опроса")]
    EmptyIdentifier,
}

/// Вид протокола USM, для сообщений об ошибках
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolKind {
    Auth,
    Priv,
}

impl std::fmt::Display for ProtocolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auth => write!(f, "аутентификации"),
            Self::Priv => write!(f, "шифрования"),
        }
    }
}

/// Строка ответа не соответствует ожиданиям обработчика домена.
///
/// Прерывает обход конкретной группы OID, но не влияет на остальные группы.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("некорректная строка {index}: ожидалось {expected}, получено {found}")]
pub struct MalformedRow {
    /// Номер строки обхода (с 1)
    pub index: usize,
    pub expected: String,
    pub found: String,
}

impl MalformedRow {
    pub fn new(index: usize, expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self {
            index,
            expected: expected.into(),
            found: found.into(),
        }
    }
}

/// Ошибка транспорта (таймаут, недоступный хост, ошибка движка)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("таймаут SNMP запроса к {target}")]
    Timeout { target: String },

    #[error("не удалось открыть SNMP сессию к {target}: {message}")]
    Connect { target: String, message: String },

    #[error("SNMP запрос к {target} не удался: {message}")]
    Request { target: String, message: String },
}
