use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::snmp::DeviceProfile;

/// Одна метрика: значение + измерения
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub value: f64,
    /// Например {"Storage": "Physical Memory"}
    pub dimension: BTreeMap<String, String>,
    /// Абсолютное значение, а не дельта
    pub is_absolute_number: bool,
}

impl MetricRecord {
    /// Абсолютная метрика с одним измерением
    pub fn absolute(value: f64, dimension: &str, label: impl Into<String>) -> Self {
        Self {
            value,
            dimension: BTreeMap::from([(dimension.to_string(), label.into())]),
            is_absolute_number: true,
        }
    }
}

/// Ключ домена -> упорядоченный список метрик
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricsResult(BTreeMap<String, Vec<MetricRecord>>);

impl MetricsResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Добавляет метрику в конец списка ключа
    pub fn push(&mut self, key: &str, record: MetricRecord) {
        self.0.entry(key.to_string()).or_default().push(record);
    }

    pub fn get(&self, key: &str) -> &[MetricRecord] {
        self.0.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Забирает список ключа (пустой, если ключа нет)
    pub fn take(&mut self, key: &str) -> Vec<MetricRecord> {
        self.0.remove(key).unwrap_or_default()
    }

    pub fn insert(&mut self, key: &str, records: Vec<MetricRecord>) {
        self.0.insert(key.to_string(), records);
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Общее число метрик по всем ключам
    pub fn total_records(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn into_inner(self) -> BTreeMap<String, Vec<MetricRecord>> {
        self.0
    }
}

/// Группа OID, обход которой был прерван
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupFailure {
    pub group: String,
    pub error: String,
}

/// Результат опроса одного домена MIB
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainReport {
    pub metrics: MetricsResult,
    pub failures: Vec<GroupFailure>,
}

/// Полный результат мониторинга устройства
#[derive(Debug, Clone)]
pub struct MonitoringResult {
    pub host: String,
    pub client_type: String,
    pub device: DeviceProfile,
    pub host_resources: DomainReport,
}
