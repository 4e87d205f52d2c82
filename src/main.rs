use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use hostres_poller::collector::SnmpCollector;
use hostres_poller::config::{AppConfig, DEFAULT_PROFILE_PATH};
use hostres_poller::formatter::JsonFormatter;
use hostres_poller::handlers::AppState;
use hostres_poller::routes::create_router;
use hostres_poller::snmp::{Snmp2Connector, create_poller};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hostres_poller=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let profile_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_PROFILE_PATH.to_string());
    let config = AppConfig::load(&profile_path)?;
    config.debug_config();

    match config.settings.server.listen.clone() {
        Some(listen) => serve(&config, &listen).await,
        None => poll_once(&config).await,
    }
}

/// Одноразовый опрос, JSON в stdout
async fn poll_once(config: &AppConfig) -> Result<()> {
    let poller = create_poller(
        config.device.clone(),
        &config.authentication,
        config.get_timeout(),
        config.settings.connection.max_repetitions,
        config.settings.connection.max_errors,
    )?;

    let result = SnmpCollector::collect_all(&poller).await?;

    match JsonFormatter::to_json_string(&result) {
        Ok(json) => println!("{}", json),
        Err(e) => error!("Ошибка JSON сериализации: {}", e),
    }

    Ok(())
}

async fn serve(config: &AppConfig, listen: &str) -> Result<()> {
    let state = AppState {
        connector: Snmp2Connector::new(config.get_timeout()),
        max_repetitions: config.settings.connection.max_repetitions,
        max_errors: config.settings.connection.max_errors,
        allowed_hosts: config.settings.server.allowed_hosts.clone(),
    };

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("Не удалось занять адрес {}", listen))?;
    info!(listen, "HTTP сервер запущен");

    axum::serve(listener, create_router(state))
        .await
        .context("HTTP сервер остановился с ошибкой")
}
