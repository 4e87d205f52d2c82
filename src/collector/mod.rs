use anyhow::Result;
use tracing::info;

pub mod device_info;
pub mod host_resources;
pub mod processor;
pub mod types;

pub use device_info::DeviceInfo;
pub use host_resources::{
    CPU_UTILISATION, CpuLoadHandler, DISK_UTILISATION, HostResourceMib, MEMORY_UTILISATION,
    StorageHandler,
};
pub use processor::{PrintRows, RowHandler, print_metrics, process_metrics};
pub use types::{DomainReport, GroupFailure, MetricRecord, MetricsResult, MonitoringResult};

use crate::snmp::{Connector, Poller};

/// Коллектор для сбора SNMP данных
pub struct SnmpCollector;

impl SnmpCollector {
    /// Собирает все данные с устройства: тип устройства + HOST-RESOURCES-MIB
    // TODO: Добавить сбор IF-MIB (ifTable уже есть в реестре MIB)
    pub async fn collect_all<C: Connector>(poller: &Poller<C>) -> Result<MonitoringResult> {
        let device = DeviceInfo::detect_device_type(poller).await;
        let host_resources = HostResourceMib::new(poller).poll_metrics().await?;

        info!(
            device = %poller.device().target(),
            device_type = %device.device_type,
            records = host_resources.metrics.total_records(),
            "сбор завершён"
        );

        Ok(MonitoringResult {
            host: poller.device().target(),
            client_type: poller.context().version_label().to_string(),
            device,
            host_resources,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snmp::mock::MockAgent;
    use crate::snmp::{Authentication, Device, SnmpValue};

    #[tokio::test]
    async fn collect_all_combines_device_and_metrics() {
        let agent = MockAgent::new();
        agent
            .insert(
                "1.3.6.1.2.1.1.2.0",
                SnmpValue::ObjectIdentifier("1.3.6.1.4.1.2011.2.23".parse().unwrap()),
            )
            .with_processor_load(&[12])
            .with_storage(&[("Physical memory", 4096, 1024)]);

        let poller = Poller::with_connector(
            Device::new("192.0.2.20", 161),
            &Authentication::community(2, "public"),
            agent.clone(),
        )
        .unwrap();

        let result = SnmpCollector::collect_all(&poller).await.unwrap();

        assert_eq!(result.host, "192.0.2.20:161");
        assert_eq!(result.client_type, "SNMPv2c");
        assert_eq!(result.device.device_type, "huawei");
        assert_eq!(result.host_resources.metrics.get(CPU_UTILISATION).len(), 1);
        assert_eq!(result.host_resources.metrics.get(MEMORY_UTILISATION)[0].value, 25.0);
        assert!(result.host_resources.metrics.get(DISK_UTILISATION).is_empty());
    }
}
