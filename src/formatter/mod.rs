pub mod json;

pub use json::{ErrorInfo, JsonFormatter, MonitoringResultJson, ResultSummary};
