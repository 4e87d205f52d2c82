use std::collections::HashMap;
use std::sync::LazyLock;

use super::oid::{ObjectId, parse_oid};
use crate::error::ConfigError;

pub const HOST_RESOURCES_MIB: &str = "HOST-RESOURCES-MIB";
pub const SNMPV2_MIB: &str = "SNMPv2-MIB";
pub const IF_MIB: &str = "IF-MIB";

/// Встроенные символы: (модуль, символ, OID)
const BUILTIN_SYMBOLS: &[(&str, &str, &str)] = &[
    // System group
    (SNMPV2_MIB, "system", "1.3.6.1.2.1.1"),
    (SNMPV2_MIB, "sysDescr", "1.3.6.1.2.1.1.1"),
    (SNMPV2_MIB, "sysObjectID", "1.3.6.1.2.1.1.2"),
    (SNMPV2_MIB, "sysUpTime", "1.3.6.1.2.1.1.3"),
    (SNMPV2_MIB, "sysContact", "1.3.6.1.2.1.1.4"),
    (SNMPV2_MIB, "sysName", "1.3.6.1.2.1.1.5"),
    (SNMPV2_MIB, "sysLocation", "1.3.6.1.2.1.1.6"),
    // Interface Table columns
    (IF_MIB, "ifTable", "1.3.6.1.2.1.2.2"),
    (IF_MIB, "ifIndex", "1.3.6.1.2.1.2.2.1.1"),
    (IF_MIB, "ifDescr", "1.3.6.1.2.1.2.2.1.2"),
    (IF_MIB, "ifType", "1.3.6.1.2.1.2.2.1.3"),
    (IF_MIB, "ifMtu", "1.3.6.1.2.1.2.2.1.4"),
    (IF_MIB, "ifSpeed", "1.3.6.1.2.1.2.2.1.5"),
    (IF_MIB, "ifAdminStatus", "1.3.6.1.2.1.2.2.1.7"),
    (IF_MIB, "ifOperStatus", "1.3.6.1.2.1.2.2.1.8"),
    (IF_MIB, "ifInOctets", "1.3.6.1.2.1.2.2.1.10"),
    (IF_MIB, "ifInDiscards", "1.3.6.1.2.1.2.2.1.13"),
    (IF_MIB, "ifOutOctets", "1.3.6.1.2.1.2.2.1.16"),
    (IF_MIB, "ifOutDiscards", "1.3.6.1.2.1.2.2.1.19"),
    (IF_MIB, "ifOutQLen", "1.3.6.1.2.1.2.2.1.21"),
    // Host Resources
    (HOST_RESOURCES_MIB, "hrSystemUptime", "1.3.6.1.2.1.25.1.1"),
    (HOST_RESOURCES_MIB, "hrMemorySize", "1.3.6.1.2.1.25.2.2"),
    // Host Resources Storage Table
    (HOST_RESOURCES_MIB, "hrStorageTable", "1.3.6.1.2.1.25.2.3"),
    (HOST_RESOURCES_MIB, "hrStorageIndex", "1.3.6.1.2.1.25.2.3.1.1"),
    (HOST_RESOURCES_MIB, "hrStorageType", "1.3.6.1.2.1.25.2.3.1.2"),
    (HOST_RESOURCES_MIB, "hrStorageDescr", "1.3.6.1.2.1.25.2.3.1.3"),
    (HOST_RESOURCES_MIB, "hrStorageAllocationUnits", "1.3.6.1.2.1.25.2.3.1.4"),
    (HOST_RESOURCES_MIB, "hrStorageSize", "1.3.6.1.2.1.25.2.3.1.5"),
    (HOST_RESOURCES_MIB, "hrStorageUsed", "1.3.6.1.2.1.25.2.3.1.6"),
    (HOST_RESOURCES_MIB, "hrStorageAllocationFailures", "1.3.6.1.2.1.25.2.3.1.7"),
    // Host Resources Device Table
    (HOST_RESOURCES_MIB, "hrDeviceTable", "1.3.6.1.2.1.25.3.2"),
    (HOST_RESOURCES_MIB, "hrDeviceIndex", "1.3.6.1.2.1.25.3.2.1.1"),
    (HOST_RESOURCES_MIB, "hrDeviceType", "1.3.6.1.2.1.25.3.2.1.2"),
    (HOST_RESOURCES_MIB, "hrDeviceDescr", "1.3.6.1.2.1.25.3.2.1.3"),
    (HOST_RESOURCES_MIB, "hrDeviceStatus", "1.3.6.1.2.1.25.3.2.1.5"),
    (HOST_RESOURCES_MIB, "hrDeviceErrors", "1.3.6.1.2.1.25.3.2.1.6"),
    // Host Resources Processor Table
    (HOST_RESOURCES_MIB, "hrProcessorTable", "1.3.6.1.2.1.25.3.3"),
    (HOST_RESOURCES_MIB, "hrProcessorFrwID", "1.3.6.1.2.1.25.3.3.1.1"),
    (HOST_RESOURCES_MIB, "hrProcessorLoad", "1.3.6.1.2.1.25.3.3.1.2"),
];

static BUILTIN: LazyLock<HashMap<(String, String), ObjectId>> = LazyLock::new(|| {
    BUILTIN_SYMBOLS
        .iter()
        .filter_map(|(module, symbol, oid)| {
            let oid = parse_oid(oid).ok()?;
            Some(((module.to_string(), symbol.to_string()), oid))
        })
        .collect()
});

/// Разрешение символов MIB модулей в числовые OID
#[derive(Debug, Clone, Default)]
pub struct MibRegistry {
    extra: HashMap<(String, String), ObjectId>,
    without_builtin: bool,
}

impl MibRegistry {
    /// Реестр со встроенным набором символов
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Пустой реестр, только явно зарегистрированные символы
    pub fn empty() -> Self {
        Self {
            extra: HashMap::new(),
            without_builtin: true,
        }
    }

    /// Регистрирует (или переопределяет) символ модуля
    pub fn register(&mut self, module: &str, symbol: &str, oid: ObjectId) {
        self.extra
            .insert((module.to_string(), symbol.to_string()), oid);
    }

    pub fn resolve(&self, module: &str, symbol: &str) -> Result<ObjectId, ConfigError> {
        let key = (module.to_string(), symbol.to_string());

        if let Some(oid) = self.extra.get(&key) {
            return Ok(oid.clone());
        }
        if !self.without_builtin
            && let Some(oid) = BUILTIN.get(&key)
        {
            return Ok(oid.clone());
        }

        Err(ConfigError::UnknownMibSymbol {
            module: module.to_string(),
            symbol: symbol.to_string(),
        })
    }
}
