use anyhow::{Result, anyhow};
use tracing::{debug, warn};

use crate::snmp::{Connector, DeviceDetector, DeviceProfile, ObjectIdentifier, Poller, SnmpValue};

/// SNMPv2-MIB::sysObjectID.0
const SYS_OBJECT_ID: &str = "1.3.6.1.2.1.1.2.0";

/// Модуль для работы с информацией об устройстве
pub struct DeviceInfo;

impl DeviceInfo {
    /// Получает sysObjectID устройства
    pub async fn get_sys_object_id<C: Connector>(poller: &Poller<C>) -> Result<String> {
        let row = poller
            .legacy_get(&ObjectIdentifier::numeric(SYS_OBJECT_ID))
            .await?;

        if let Some(indication) = row.error_indication {
            return Err(anyhow!("Ошибка получения sysObjectID: {}", indication));
        }
        if let Some(status) = row.error_status {
            return Err(anyhow!("Ошибка получения sysObjectID: {}", status));
        }

        match row.bindings.into_iter().next().map(|vb| vb.value) {
            Some(SnmpValue::ObjectIdentifier(oid)) => Ok(oid.to_string()),
            Some(other) => Err(anyhow!("sysObjectID: ожидался OBJECT IDENTIFIER, получено {}", other.type_name())),
            None => Err(anyhow!("sysObjectID: пустой ответ")),
        }
    }

    /// Определяет тип устройства, при любой ошибке - generic
    pub async fn detect_device_type<C: Connector>(poller: &Poller<C>) -> DeviceProfile {
        match Self::get_sys_object_id(poller).await {
            Ok(sys_object_id) => {
                let profile = DeviceDetector::detect_device_type(&sys_object_id);
                debug!(sys_object_id, device_type = %profile.device_type, "тип устройства определён");
                profile
            }
            Err(e) => {
                warn!(device = %poller.device().target(), "{:#}", e);
                DeviceDetector::generic()
            }
        }
    }
}
