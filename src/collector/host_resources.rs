//! Метрики HOST-RESOURCES-MIB: загрузка CPU, память/swap, диски.
//!
//! Reference: http://www.net-snmp.org/docs/mibs/host.html
//!
//! TODO: разбивка по отдельным дисковым томам

use tracing::{info, warn};

use super::processor::{RowHandler, process_metrics};
use super::types::{DomainReport, GroupFailure, MetricRecord, MetricsResult};
use crate::error::{ConfigError, MalformedRow};
use crate::snmp::{Connector, HOST_RESOURCES_MIB, ObjectIdentifier, Poller, VarBind};

pub const CPU_UTILISATION: &str = "cpu_utilisation";
pub const MEMORY_UTILISATION: &str = "memory_utilisation";
pub const DISK_UTILISATION: &str = "disk_utilisation";

const CPU_KEY: &str = "cpu";
const MEMORY_KEY: &str = "memory";
const DISK_KEY: &str = "disk";

const CPU_COLUMNS: &[&str] = &["hrProcessorLoad"];
const STORAGE_COLUMNS: &[&str] = &["hrStorageDescr", "hrStorageSize", "hrStorageUsed"];

/// Подстроки описания, по которым запись относится к памяти
const MEMORY_TYPES: &[&str] = &["memory", "swap space", "ram"];

/// hrProcessorLoad: одна метрика на процессор, измерение Index = номер строки
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuLoadHandler;

impl RowHandler<MetricsResult> for CpuLoadHandler {
    fn handle(&self, index: usize, bindings: &[VarBind], acc: &mut MetricsResult) -> Result<(), MalformedRow> {
        let [load] = bindings else {
            return Err(MalformedRow::new(
                index,
                "1 binding (hrProcessorLoad)",
                format!("{} bindings", bindings.len()),
            ));
        };
        let value = numeric(index, load, "hrProcessorLoad")?;

        acc.push(CPU_KEY, MetricRecord::absolute(value, "Index", index.to_string()));
        Ok(())
    }
}

/// hrStorageTable: утилизация = used / size * 100, память отдельно от дисков
#[derive(Debug, Clone, Copy, Default)]
pub struct StorageHandler;

impl RowHandler<MetricsResult> for StorageHandler {
    fn handle(&self, index: usize, bindings: &[VarBind], acc: &mut MetricsResult) -> Result<(), MalformedRow> {
        let [descr, size, used] = bindings else {
            return Err(MalformedRow::new(
                index,
                "3 bindings (hrStorageDescr, hrStorageSize, hrStorageUsed)",
                format!("{} bindings", bindings.len()),
            ));
        };

        let name = descr.value.as_text().ok_or_else(|| {
            MalformedRow::new(index, "OCTET STRING hrStorageDescr", descr.value.type_name())
        })?;
        let size = numeric(index, size, "hrStorageSize")?;
        let used = numeric(index, used, "hrStorageUsed")?;

        // Например, неиспользуемый swap: 0 занято из 0
        let utilisation = if size > 0.0 { used / size * 100.0 } else { 0.0 };

        let key = if is_memory(&name) { MEMORY_KEY } else { DISK_KEY };
        acc.push(key, MetricRecord::absolute(utilisation, "Storage", name));
        Ok(())
    }
}

fn numeric(index: usize, vb: &VarBind, column: &str) -> Result<f64, MalformedRow> {
    vb.value
        .as_f64()
        .ok_or_else(|| MalformedRow::new(index, format!("numeric {}", column), vb.value.type_name()))
}

/// Относится ли описание хранилища к памяти (RAM, swap)
pub fn is_memory(description: &str) -> bool {
    let lower = description.to_lowercase();
    MEMORY_TYPES.iter().any(|t| lower.contains(t))
}

/// Опрос HOST-RESOURCES-MIB.
///
/// ```ignore
/// let hr_mib = HostResourceMib::new(&poller);
/// let report = hr_mib.poll_metrics().await?;
/// ```
pub struct HostResourceMib<'a, C: Connector> {
    poller: &'a Poller<C>,
}

impl<'a, C: Connector> HostResourceMib<'a, C> {
    pub fn new(poller: &'a Poller<C>) -> Self {
        Self { poller }
    }

    pub fn cpu_oids() -> ObjectIdentifier {
        ObjectIdentifier::module_group(HOST_RESOURCES_MIB, CPU_COLUMNS)
    }

    pub fn storage_oids() -> ObjectIdentifier {
        ObjectIdentifier::module_group(HOST_RESOURCES_MIB, STORAGE_COLUMNS)
    }

    /// Опрашивает CPU и хранилища, две группы обходятся параллельно.
    ///
    /// В результате всегда есть ключи cpu_utilisation, memory_utilisation,
    /// disk_utilisation. Некорректная строка в одной группе попадает в
    /// failures и не мешает второй группе.
    pub async fn poll_metrics(&self) -> Result<DomainReport, ConfigError> {
        let mut cpu_walk = self.poller.bulk_walk(&Self::cpu_oids())?;
        let mut storage_walk = self.poller.bulk_walk(&Self::storage_oids())?;

        let (cpu, storage) = tokio::join!(
            process_metrics::<_, MetricsResult, _>(&mut cpu_walk, &CpuLoadHandler),
            process_metrics::<_, MetricsResult, _>(&mut storage_walk, &StorageHandler),
        );

        let mut report = DomainReport::default();
        let mut cpu = self.settle("hrProcessorTable", cpu, &mut report.failures);
        let mut storage = self.settle("hrStorageTable", storage, &mut report.failures);

        report.metrics.insert(CPU_UTILISATION, cpu.take(CPU_KEY));
        report.metrics.insert(MEMORY_UTILISATION, storage.take(MEMORY_KEY));
        report.metrics.insert(DISK_UTILISATION, storage.take(DISK_KEY));

        info!(
            device = %self.poller.device().target(),
            cpu = report.metrics.get(CPU_UTILISATION).len(),
            memory = report.metrics.get(MEMORY_UTILISATION).len(),
            disk = report.metrics.get(DISK_UTILISATION).len(),
            failures = report.failures.len(),
            "HOST-RESOURCES-MIB опрошен"
        );

        Ok(report)
    }

    fn settle(
        &self,
        group: &str,
        result: Result<MetricsResult, MalformedRow>,
        failures: &mut Vec<GroupFailure>,
    ) -> MetricsResult {
        match result {
            Ok(metrics) => metrics,
            Err(e) => {
                warn!(device = %self.poller.device().target(), group, "{}", e);
                failures.push(GroupFailure {
                    group: group.to_string(),
                    error: e.to_string(),
                });
                MetricsResult::default()
            }
        }
    }
}
