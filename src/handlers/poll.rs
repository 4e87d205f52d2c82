use axum::{Json, extract::State, http::StatusCode};
use tracing::warn;

use crate::collector::SnmpCollector;
use crate::formatter::{JsonFormatter, MonitoringResultJson};
use crate::models::PollRequest;
use crate::snmp::{Connector, Poller};

/// Общее состояние HTTP обработчиков.
///
/// Аутентификации на HTTP нет: любой клиент, достучавшийся до сервиса,
/// заставляет его слать SNMP на указанный в теле адрес. Сервис
/// рассчитан на доверенную сеть; `allowed_hosts` сужает круг целей.
#[derive(Debug, Clone)]
pub struct AppState<C: Connector> {
    pub connector: C,
    pub max_repetitions: u32,
    pub max_errors: u32,
    /// Разрешённые цели опроса. `None` - любые
    pub allowed_hosts: Option<Vec<String>>,
}

impl<C: Connector> AppState<C> {
    /// Можно ли опрашивать этот хост
    pub fn permits(&self, host: &str) -> bool {
        match &self.allowed_hosts {
            Some(hosts) => hosts.iter().any(|allowed| allowed.eq_ignore_ascii_case(host)),
            None => true,
        }
    }
}

/// POST /host-resources: разовый опрос устройства из тела запроса
pub async fn handle_host_resources<C: Connector + 'static>(
    State(state): State<AppState<C>>,
    Json(request): Json<PollRequest>,
) -> Result<Json<MonitoringResultJson>, (StatusCode, String)> {
    if !state.permits(&request.device.host) {
        warn!(host = %request.device.host, "цель опроса не в списке разрешённых");
        return Err((
            StatusCode::FORBIDDEN,
            format!("опрос {} не разрешён", request.device.host),
        ));
    }

    let poller = Poller::with_connector(request.device, &request.authentication, state.connector)
        .map_err(|e| {
            warn!("отклонён запрос опроса: {}", e);
            (StatusCode::BAD_REQUEST, e.to_string())
        })?
        .with_max_repetitions(state.max_repetitions)
        .with_max_errors(state.max_errors);

    let result = SnmpCollector::collect_all(&poller)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", e)))?;

    Ok(Json(JsonFormatter::format_monitoring_result(&result)))
}
