use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::collector::{MetricRecord, MonitoringResult};

/// JSON структура для отдачи монолиту
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringResultJson {
    pub host: String,
    pub client_type: String,
    pub device_type: String,
    pub device_description: String,
    pub timestamp: String,
    pub summary: ResultSummary,
    pub metrics: BTreeMap<String, Vec<MetricRecord>>,
    pub errors: Vec<ErrorInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultSummary {
    /// Число метрик по каждому ключу
    pub records: BTreeMap<String, usize>,
    pub total_records: usize,
    pub failed_groups: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub item_type: String, // "group"
    pub item_name: String,
    pub error_message: String,
}

/// JSON форматтер для результатов мониторинга
pub struct JsonFormatter;

impl JsonFormatter {
    /// Конвертирует результат мониторинга в JSON
    pub fn format_monitoring_result(result: &MonitoringResult) -> MonitoringResultJson {
        let timestamp = chrono::Utc::now().to_rfc3339();
        let report = &result.host_resources;

        let records = report
            .metrics
            .keys()
            .map(|key| (key.to_string(), report.metrics.get(key).len()))
            .collect();

        let summary = ResultSummary {
            records,
            total_records: report.metrics.total_records(),
            failed_groups: report.failures.len(),
        };

        let errors = report
            .failures
            .iter()
            .map(|failure| ErrorInfo {
                item_type: "group".to_string(),
                item_name: failure.group.clone(),
                error_message: failure.error.clone(),
            })
            .collect();

        MonitoringResultJson {
            host: result.host.clone(),
            client_type: result.client_type.clone(),
            device_type: result.device.device_type.clone(),
            device_description: result.device.description.clone(),
            timestamp,
            summary,
            metrics: report.metrics.clone().into_inner(),
            errors,
        }
    }

    /// Сериализует результат в JSON строку
    pub fn to_json_string(result: &MonitoringResult) -> anyhow::Result<String> {
        let json_result = Self::format_monitoring_result(result);
        serde_json::to_string_pretty(&json_result)
            .map_err(|e| anyhow::anyhow!("Ошибка сериализации в JSON: {}", e))
    }

    /// Сериализует результат в компактный JSON
    pub fn to_json_compact(result: &MonitoringResult) -> anyhow::Result<String> {
        let json_result = Self::format_monitoring_result(result);
        serde_json::to_string(&json_result)
            .map_err(|e| anyhow::anyhow!("Ошибка сериализации в JSON: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{DomainReport, GroupFailure, MetricsResult};
    use crate::snmp::DeviceDetector;
    use serde_json::Value;

    fn sample() -> MonitoringResult {
        let mut metrics = MetricsResult::new();
        metrics.insert("cpu_utilisation", vec![MetricRecord::absolute(75.0, "Index", "1")]);
        metrics.insert(
            "memory_utilisation",
            vec![MetricRecord::absolute(50.0, "Storage", "Physical Memory")],
        );
        metrics.insert("disk_utilisation", vec![]);

        MonitoringResult {
            host: "10.0.0.1:161".to_string(),
            client_type: "SNMPv2c".to_string(),
            device: DeviceDetector::detect_device_type("1.3.6.1.4.1.8072.3.2.10"),
            host_resources: DomainReport {
                metrics,
                failures: vec![GroupFailure {
                    group: "hrStorageTable".to_string(),
                    error: "некорректная строка 2".to_string(),
                }],
            },
        }
    }

    #[test]
    fn report_shape() {
        let json: Value = serde_json::from_str(&JsonFormatter::to_json_string(&sample()).unwrap()).unwrap();

        assert_eq!(json["host"], "10.0.0.1:161");
        assert_eq!(json["device_type"], "linux");
        assert_eq!(json["device_description"], "Linux Net-SNMP Agent");
        assert!(chrono::DateTime::parse_from_rfc3339(json["timestamp"].as_str().unwrap()).is_ok());

        assert_eq!(json["summary"]["records"]["cpu_utilisation"], 1);
        assert_eq!(json["summary"]["records"]["disk_utilisation"], 0);
        assert_eq!(json["summary"]["total_records"], 2);
        assert_eq!(json["summary"]["failed_groups"], 1);

        let cpu = &json["metrics"]["cpu_utilisation"][0];
        assert_eq!(cpu["value"], 75.0);
        assert_eq!(cpu["dimension"]["Index"], "1");
        assert_eq!(cpu["is_absolute_number"], true);
        assert_eq!(json["metrics"]["disk_utilisation"], Value::Array(vec![]));

        assert_eq!(json["errors"][0]["item_name"], "hrStorageTable");
    }

    #[test]
    fn compact_is_single_line() {
        let compact = JsonFormatter::to_json_compact(&sample()).unwrap();
        assert!(!compact.contains('\n'));
    }
}
