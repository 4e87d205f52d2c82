pub mod client;
pub mod device_profiles;
pub mod mib;
#[cfg(any(test, feature = "testing"))]
pub mod mock;
pub mod oid;
pub mod poller;
pub mod security;
pub mod session;
pub mod walk;

pub use client::Snmp2Connector;
pub use device_profiles::{DeviceDetector, DeviceProfile};
pub use mib::{HOST_RESOURCES_MIB, MibRegistry, SNMPV2_MIB};
pub use oid::{ObjectId, ObjectIdentifier, parse_oid};
pub use poller::Poller;
pub use security::{
    AuthProtocol, Authentication, CommunityVersion, KeyConfig, PrivProtocol, SecurityContext,
};
pub use session::{
    Connector, Device, ErrorStatus, Response, ResponseRow, SnmpSession, SnmpValue, VarBind,
};
pub use walk::{BulkWalk, DEFAULT_MAX_CONSECUTIVE_ERRORS, DEFAULT_MAX_REPETITIONS, RowSource};

use std::time::Duration;

use crate::error::ConfigError;

/// Poller поверх snmp2 с заданным таймаутом запроса, размером GETBULK
/// и допустимым числом ошибок подряд в обходе
pub fn create_poller(
    device: Device,
    authentication: &Authentication,
    timeout: Duration,
    max_repetitions: u32,
    max_errors: u32,
) -> Result<Poller, ConfigError> {
    let poller = Poller::with_connector(device, authentication, Snmp2Connector::new(timeout))?;
    Ok(poller
        .with_max_repetitions(max_repetitions)
        .with_max_errors(max_errors))
}
