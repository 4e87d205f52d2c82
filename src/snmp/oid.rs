use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::mib::MibRegistry;
use crate::error::ConfigError;

/// Числовой OID, например 1.3.6.1.2.1.25.3.3.1.2
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(Vec<u64>);

impl ObjectId {
    pub fn new(parts: impl Into<Vec<u64>>) -> Self {
        Self(parts.into())
    }

    pub fn parts(&self) -> &[u64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Лежит ли OID в поддереве `root` (сам root тоже считается)
    pub fn starts_with(&self, root: &ObjectId) -> bool {
        self.0.starts_with(&root.0)
    }

    /// OID с добавленными компонентами (например, индекс строки таблицы)
    pub fn child(&self, suffix: &[u64]) -> ObjectId {
        let mut parts = self.0.clone();
        parts.extend_from_slice(suffix);
        ObjectId(parts)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for part in &self.0 {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{}", part)?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for ObjectId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_oid(s)
    }
}

/// Парсит строку OID ("1.3.6.1" или ".1.3.6.1")
pub fn parse_oid(s: &str) -> Result<ObjectId, ConfigError> {
    let parts: Result<Vec<u64>, _> = s
        .trim()
        .split('.')
        .filter(|p| !p.is_empty())
        .map(|p| p.parse::<u64>())
        .collect();

    match parts {
        Ok(parts) if !parts.is_empty() => Ok(ObjectId(parts)),
        _ => Err(ConfigError::InvalidOid(s.to_string())),
    }
}

/// Идентификатор для опроса, задаётся вызывающим явно
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectIdentifier {
    /// Числовая строка, например "1.3.6.1.2.1.25.3.3.1.2"
    Numeric(String),
    /// Символ MIB модуля, например (HOST-RESOURCES-MIB, hrProcessorLoad)
    ModuleSymbol { module: String, symbol: String },
    /// Упорядоченная группа, желательно из одной таблицы
    Group(Vec<ObjectIdentifier>),
}

impl ObjectIdentifier {
    pub fn numeric(oid: impl Into<String>) -> Self {
        Self::Numeric(oid.into())
    }

    pub fn symbol(module: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self::ModuleSymbol {
            module: module.into(),
            symbol: symbol.into(),
        }
    }

    /// Группа символов одного модуля
    pub fn module_group(module: &str, symbols: &[&str]) -> Self {
        Self::Group(symbols.iter().map(|s| Self::symbol(module, *s)).collect())
    }

    /// Разворачивает идентификатор в плоский список числовых OID.
    ///
    /// Вложенные группы раскрываются в порядке объявления.
    pub fn resolve(&self, mibs: &MibRegistry) -> Result<Vec<ObjectId>, ConfigError> {
        let mut out = Vec::new();
        self.resolve_into(mibs, &mut out)?;

        if out.is_empty() {
            return Err(ConfigError::EmptyIdentifier);
        }
        Ok(out)
    }

    fn resolve_into(&self, mibs: &MibRegistry, out: &mut Vec<ObjectId>) -> Result<(), ConfigError> {
        match self {
            Self::Numeric(oid) => out.push(parse_oid(oid)?),
            Self::ModuleSymbol { module, symbol } => out.push(mibs.resolve(module, symbol)?),
            Self::Group(items) => {
                for item in items {
                    item.resolve_into(mibs, out)?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for ObjectIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(oid) => f.write_str(oid),
            Self::ModuleSymbol { module, symbol } => write!(f, "{}::{}", module, symbol),
            Self::Group(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

/// "MODULE::symbol" или числовой OID
impl FromStr for ObjectIdentifier {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some((module, symbol)) = s.split_once("::") {
            if module.is_empty() || symbol.is_empty() {
                return Err(ConfigError::InvalidOid(s.to_string()));
            }
            return Ok(Self::symbol(module, symbol));
        }

        parse_oid(s)?;
        Ok(Self::Numeric(s.to_string()))
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dotted_oid_with_leading_dot() {
        let oid = parse_oid(".1.3.6.1.2.1").unwrap();
        assert_eq!(oid.parts(), &[1, 3, 6, 1, 2, 1]);
        assert_eq!(oid.to_string(), "1.3.6.1.2.1");
    }

    #[test]
    fn rejects_garbage_oid() {
        assert_eq!(
            parse_oid("1.3.six.1"),
            Err(ConfigError::InvalidOid("1.3.six.1".to_string()))
        );
        assert!(parse_oid("").is_err());
    }

    #[test]
    fn subtree_and_ordering() {
        let root = parse_oid("1.3.6.1.2.1.25.2.3.1.3").unwrap();
        let row = root.child(&[7]);
        assert!(row.starts_with(&root));
        assert!(!root.starts_with(&row));
        assert!(root < row);
        // Лексикографический порядок, а не по длине
        assert!(parse_oid("1.3.6.1.2.1.25.2.3.1.3.10").unwrap() < parse_oid("1.3.6.1.2.1.25.2.3.1.4").unwrap());
    }

    #[test]
    fn identifier_from_str() {
        assert_eq!(
            "HOST-RESOURCES-MIB::hrProcessorLoad".parse::<ObjectIdentifier>().unwrap(),
            ObjectIdentifier::symbol("HOST-RESOURCES-MIB", "hrProcessorLoad")
        );
        assert_eq!(
            "1.3.6.1.2.1.1.2.0".parse::<ObjectIdentifier>().unwrap(),
            ObjectIdentifier::numeric("1.3.6.1.2.1.1.2.0")
        );
        assert!("::sysDescr".parse::<ObjectIdentifier>().is_err());
    }

    #[test]
    fn group_resolves_in_order() {
        let mibs = MibRegistry::builtin();
        let group = ObjectIdentifier::Group(vec![
            ObjectIdentifier::module_group("HOST-RESOURCES-MIB", &["hrStorageDescr", "hrStorageSize"]),
            ObjectIdentifier::numeric("1.3.6.1.2.1.25.2.3.1.6"),
        ]);

        let oids = group.resolve(&mibs).unwrap();
        let dotted: Vec<String> = oids.iter().map(|o| o.to_string()).collect();
        assert_eq!(
            dotted,
            vec![
                "1.3.6.1.2.1.25.2.3.1.3",
                "1.3.6.1.2.1.25.2.3.1.5",
                "1.3.6.1.2.1.25.2.3.1.6"
            ]
        );
    }

    #[test]
    fn empty_group_is_rejected() {
        let mibs = MibRegistry::builtin();
        assert_eq!(
            ObjectIdentifier::Group(vec![]).resolve(&mibs),
            Err(ConfigError::EmptyIdentifier)
        );
    }
}
