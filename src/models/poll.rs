use serde::Deserialize;

use crate::snmp::{Authentication, Device};

/// Тело POST /host-resources
#[derive(Debug, Deserialize)]
pub struct PollRequest {
    pub device: Device,
    pub authentication: Authentication,
}
