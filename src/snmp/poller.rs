use tracing::{debug, warn};

use super::client::Snmp2Connector;
use super::mib::MibRegistry;
use super::oid::ObjectIdentifier;
use super::security::{Authentication, SecurityContext};
use super::session::{Connector, Device, ResponseRow, SnmpSession};
use super::walk::{BulkWalk, DEFAULT_MAX_CONSECUTIVE_ERRORS, DEFAULT_MAX_REPETITIONS};
use crate::error::ConfigError;

/// Точка доступа к устройству: контекст безопасности + движок SNMP.
///
/// ```ignore
/// let poller = Poller::new(device, &authentication)?;
/// let mut walk = poller.bulk_walk(&ObjectIdentifier::symbol("HOST-RESOURCES-MIB", "hrProcessorLoad"))?;
/// while let Some(row) = walk.next().await { ... }
/// ```
#[derive(Debug, Clone)]
pub struct Poller<C: Connector = Snmp2Connector> {
    device: Device,
    context: SecurityContext,
    connector: C,
    mibs: MibRegistry,
    max_repetitions: u32,
    max_errors: u32,
}

impl Poller<Snmp2Connector> {
    /// Poller поверх snmp2 с таймаутом по умолчанию
    pub fn new(device: Device, authentication: &Authentication) -> Result<Self, ConfigError> {
        Self::with_connector(device, authentication, Snmp2Connector::default())
    }
}

impl<C: Connector> Poller<C> {
    pub fn with_connector(
        device: Device,
        authentication: &Authentication,
        connector: C,
    ) -> Result<Self, ConfigError> {
        let context = SecurityContext::build(authentication)?;
        connector.validate(&context)?;

        debug!(device = %device.target(), version = context.version_label(), "контекст безопасности готов");

        Ok(Self {
            device,
            context,
            connector,
            mibs: MibRegistry::builtin(),
            max_repetitions: DEFAULT_MAX_REPETITIONS,
            max_errors: DEFAULT_MAX_CONSECUTIVE_ERRORS,
        })
    }

    pub fn with_max_repetitions(mut self, max_repetitions: u32) -> Self {
        self.max_repetitions = max_repetitions.max(1);
        self
    }

    /// Сколько запросов подряд может упасть, прежде чем обход сдастся
    pub fn with_max_errors(mut self, max_errors: u32) -> Self {
        self.max_errors = max_errors.max(1);
        self
    }

    pub fn with_mibs(mut self, mibs: MibRegistry) -> Self {
        self.mibs = mibs;
        self
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn context(&self) -> &SecurityContext {
        &self.context
    }

    pub fn mibs(&self) -> &MibRegistry {
        &self.mibs
    }

    pub fn max_repetitions(&self) -> u32 {
        self.max_repetitions
    }

    pub fn max_errors(&self) -> u32 {
        self.max_errors
    }

    /// Обход GETBULK по одному OID, символу MIB или группе.
    ///
    /// OID группы лучше брать из одной таблицы: более короткое поддерево
    /// завершит обход раньше остальных колонок.
    pub fn bulk_walk(&self, oids: &ObjectIdentifier) -> Result<BulkWalk<C>, ConfigError> {
        let roots = oids.resolve(&self.mibs)?;

        Ok(BulkWalk::new(
            self.connector.clone(),
            self.device.clone(),
            self.context.clone(),
            roots,
            self.max_repetitions,
            self.max_errors,
        ))
    }

    /// Одиночный GET. Только для старых агентов без GETBULK, предпочитайте bulk_walk.
    pub async fn legacy_get(&self, oid: &ObjectIdentifier) -> Result<ResponseRow, ConfigError> {
        let oids = oid.resolve(&self.mibs)?;

        let mut session = match self.connector.open(&self.device, &self.context).await {
            Ok(session) => session,
            Err(e) => {
                warn!(device = %self.device.target(), "GET: {}", e);
                return Ok(ResponseRow::transport_error(e.to_string()));
            }
        };

        let row = match session.get(&oids).await {
            Ok(response) => ResponseRow::from_response(response),
            Err(e) => ResponseRow::transport_error(e.to_string()),
        };
        Ok(row)
    }
}
