use serde::Serialize;

/// Информация об устройстве
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceProfile {
    pub device_type: String,
    pub description: String,
}

/// Enterprise префиксы sysObjectID
const VENDOR_PREFIXES: &[(&str, &str, &str)] = &[
    ("1.3.6.1.4.1.8072.", "linux", "Linux Net-SNMP Agent"),
    ("1.3.6.1.4.1.9.", "cisco", "Cisco Device"),
    ("1.3.6.1.4.1.11.", "hp", "HP Device"),
    ("1.3.6.1.4.1.2636.", "juniper", "Juniper Device"),
    ("1.3.6.1.4.1.2011.", "huawei", "Huawei Device"),
];

/// Детектор типа устройства
pub struct DeviceDetector;

impl DeviceDetector {
    /// Определяет тип устройства по sysObjectID
    pub fn detect_device_type(sys_object_id: &str) -> DeviceProfile {
        let sys_object_id = sys_object_id.trim().trim_start_matches('.');

        VENDOR_PREFIXES
            .iter()
            .find(|(prefix, _, _)| sys_object_id.starts_with(prefix))
            .map(|(_, device_type, description)| DeviceProfile {
                device_type: device_type.to_string(),
                description: description.to_string(),
            })
            .unwrap_or_else(Self::generic)
    }

    pub fn generic() -> DeviceProfile {
        DeviceProfile {
            device_type: "generic".to_string(),
            description: "Unknown Device".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_known_vendors() {
        assert_eq!(DeviceDetector::detect_device_type("1.3.6.1.4.1.8072.3.2.10").device_type, "linux");
        assert_eq!(DeviceDetector::detect_device_type(".1.3.6.1.4.1.9.1.516").device_type, "cisco");
        assert_eq!(DeviceDetector::detect_device_type("1.3.6.1.4.1.2636.1.1.1.2.29").device_type, "juniper");
    }

    #[test]
    fn prefix_must_end_at_component_boundary() {
        // 1.3.6.1.4.1.99 - не Cisco
        assert_eq!(DeviceDetector::detect_device_type("1.3.6.1.4.1.99.1").device_type, "generic");
        assert_eq!(DeviceDetector::detect_device_type("").device_type, "generic");
    }
}
