pub mod collector;
pub mod config;
pub mod error;
pub mod formatter;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod snmp;

pub use error::{ConfigError, MalformedRow, TransportError};
