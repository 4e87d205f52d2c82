use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use super::oid::ObjectId;
use super::security::SecurityContext;
use crate::error::{ConfigError, TransportError};

/// Опрашиваемое устройство
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    161
}

impl Device {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Адрес в виде "host:port"
    pub fn target(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            // IPv6 литерал
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// Значение SNMP, не привязанное к буферу движка
#[derive(Debug, Clone, PartialEq)]
pub enum SnmpValue {
    Integer(i64),
    OctetString(Vec<u8>),
    ObjectIdentifier(ObjectId),
    IpAddress([u8; 4]),
    Counter32(u32),
    /// Gauge32
    Unsigned32(u32),
    Timeticks(u32),
    Counter64(u64),
    Opaque(Vec<u8>),
    Null,
    NoSuchObject,
    NoSuchInstance,
    EndOfMibView,
    /// Типы, которые движок не раскладывает
    Other(String),
}

impl SnmpValue {
    pub fn string(s: &str) -> Self {
        Self::OctetString(s.as_bytes().to_vec())
    }

    /// Числовое значение, если тип числовой
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(v) => Some(*v as f64),
            Self::Counter32(v) | Self::Unsigned32(v) | Self::Timeticks(v) => Some(*v as f64),
            Self::Counter64(v) => Some(*v as f64),
            // Некоторые агенты отдают нагрузку строкой, например "82.5"
            Self::OctetString(_) => self.as_text()?.trim().parse().ok(),
            _ => None,
        }
    }

    /// Текстовое значение OCTET STRING (с обрезкой завершающих NUL)
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::OctetString(bytes) => {
                let trimmed = match bytes.iter().rposition(|b| *b != 0) {
                    Some(last) => &bytes[..=last],
                    None => &[][..],
                };
                Some(String::from_utf8_lossy(trimmed).into_owned())
            }
            _ => None,
        }
    }

    /// noSuchObject / noSuchInstance / endOfMibView
    pub fn is_exception(&self) -> bool {
        matches!(self, Self::NoSuchObject | Self::NoSuchInstance | Self::EndOfMibView)
    }

    /// Имя типа для сообщений об ошибках
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Integer(_) => "INTEGER",
            Self::OctetString(_) => "OCTET STRING",
            Self::ObjectIdentifier(_) => "OBJECT IDENTIFIER",
            Self::IpAddress(_) => "IpAddress",
            Self::Counter32(_) => "Counter32",
            Self::Unsigned32(_) => "Gauge32",
            Self::Timeticks(_) => "TimeTicks",
            Self::Counter64(_) => "Counter64",
            Self::Opaque(_) => "Opaque",
            Self::Null => "NULL",
            Self::NoSuchObject => "noSuchObject",
            Self::NoSuchInstance => "noSuchInstance",
            Self::EndOfMibView => "endOfMibView",
            Self::Other(_) => "unknown",
        }
    }
}

impl fmt::Display for SnmpValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{}", v),
            Self::OctetString(bytes) | Self::Opaque(bytes) => {
                let printable = bytes
                    .iter()
                    .all(|b| b.is_ascii_graphic() || *b == b' ' || *b == b'\t' || *b == 0);
                if printable {
                    write!(f, "{}", self.as_text().unwrap_or_default())
                } else {
                    f.write_str("0x")?;
                    for b in bytes {
                        write!(f, "{:02x}", b)?;
                    }
                    Ok(())
                }
            }
            Self::ObjectIdentifier(oid) => write!(f, "{}", oid),
            Self::IpAddress([a, b, c, d]) => write!(f, "{}.{}.{}.{}", a, b, c, d),
            Self::Counter32(v) | Self::Unsigned32(v) | Self::Timeticks(v) => write!(f, "{}", v),
            Self::Counter64(v) => write!(f, "{}", v),
            Self::Null => f.write_str(""),
            Self::NoSuchObject => f.write_str("No Such Object currently exists at this OID"),
            Self::NoSuchInstance => f.write_str("No Such Instance currently exists at this OID"),
            Self::EndOfMibView => f.write_str("No more variables left in this MIB View"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

/// Пара (OID, значение)
#[derive(Debug, Clone, PartialEq)]
pub struct VarBind {
    pub oid: ObjectId,
    pub value: SnmpValue,
}

impl VarBind {
    pub fn new(oid: ObjectId, value: SnmpValue) -> Self {
        Self { oid, value }
    }
}

impl fmt::Display for VarBind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.oid, self.value)
    }
}

/// Ошибка протокола от агента (RFC 3416 error-status)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorStatus {
    pub code: u32,
    /// Индекс проблемного varbind, с 1; 0 - не указан
    pub index: u32,
}

impl ErrorStatus {
    pub fn name(&self) -> &'static str {
        match self.code {
            0 => "noError",
            1 => "tooBig",
            2 => "noSuchName",
            3 => "badValue",
            4 => "readOnly",
            5 => "genErr",
            6 => "noAccess",
            7 => "wrongType",
            8 => "wrongLength",
            9 => "wrongEncoding",
            10 => "wrongValue",
            11 => "noCreation",
            12 => "inconsistentValue",
            13 => "resourceUnavailable",
            14 => "commitFailed",
            15 => "undoFailed",
            16 => "authorizationError",
            17 => "notWritable",
            18 => "inconsistentName",
            _ => "unknownError",
        }
    }

    /// OID проблемного varbind или "?", если индекс вне диапазона
    pub fn offending_oid(&self, bindings: &[VarBind]) -> String {
        let idx = self.index as usize;
        if idx >= 1 && idx <= bindings.len() {
            bindings[idx - 1].oid.to_string()
        } else {
            "?".to_string()
        }
    }
}

impl fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Один ответ движка на GET/GETNEXT/GETBULK
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub error_status: u32,
    pub error_index: u32,
    pub varbinds: Vec<VarBind>,
}

/// Шаг обхода: ошибка транспорта, ошибка протокола или строка значений
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResponseRow {
    pub error_indication: Option<String>,
    pub error_status: Option<ErrorStatus>,
    /// В порядке запрошенных OID
    pub bindings: Vec<VarBind>,
}

impl ResponseRow {
    pub fn values(bindings: Vec<VarBind>) -> Self {
        Self {
            bindings,
            ..Default::default()
        }
    }

    pub fn transport_error(message: impl Into<String>) -> Self {
        Self {
            error_indication: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn protocol_error(status: ErrorStatus, bindings: Vec<VarBind>) -> Self {
        Self {
            error_status: Some(status),
            bindings,
            ..Default::default()
        }
    }

    pub fn from_response(response: Response) -> Self {
        if response.error_status != 0 {
            Self::protocol_error(
                ErrorStatus {
                    code: response.error_status,
                    index: response.error_index,
                },
                response.varbinds,
            )
        } else {
            Self::values(response.varbinds)
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error_indication.is_none() && self.error_status.is_none()
    }
}

/// Открытая сессия внешнего SNMP движка.
///
/// Закрытие сессии - это Drop.
pub trait SnmpSession: Send {
    fn get(&mut self, oids: &[ObjectId]) -> impl Future<Output = Result<Response, TransportError>> + Send;

    fn get_next(&mut self, oids: &[ObjectId]) -> impl Future<Output = Result<Response, TransportError>> + Send;

    fn get_bulk(
        &mut self,
        oids: &[ObjectId],
        non_repeaters: u32,
        max_repetitions: u32,
    ) -> impl Future<Output = Result<Response, TransportError>> + Send;
}

/// Фабрика сессий внешнего SNMP движка
pub trait Connector: Clone + Send + Sync {
    type Session: SnmpSession;

    fn open(
        &self,
        device: &Device,
        context: &SecurityContext,
    ) -> impl Future<Output = Result<Self::Session, TransportError>> + Send;

    /// Проверка, что движок умеет выразить контекст безопасности
    fn validate(&self, _context: &SecurityContext) -> Result<(), ConfigError> {
        Ok(())
    }
}
