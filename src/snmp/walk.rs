use std::collections::VecDeque;
use std::future::Future;

use tracing::{debug, warn};

use super::oid::ObjectId;
use super::security::SecurityContext;
use super::session::{Connector, Device, ErrorStatus, Response, ResponseRow, SnmpSession};

/// Число повторений в одном GETBULK: баланс между количеством запросов и размером ответа
pub const DEFAULT_MAX_REPETITIONS: u32 = 25;

/// GETBULK без non-repeaters: все запрошенные OID - колонки таблицы
pub const NON_REPEATERS: u32 = 0;

/// Сколько запросов подряд может завершиться ошибкой, прежде чем обход остановится
pub const DEFAULT_MAX_CONSECUTIVE_ERRORS: u32 = 3;

/// noSuchName: в SNMPv1 так агент сообщает о конце MIB на GETNEXT
const V1_NO_SUCH_NAME: u32 = 2;

/// Ленивая последовательность строк ответа
pub trait RowSource: Send {
    fn next_row(&mut self) -> impl Future<Output = Option<ResponseRow>> + Send;
}

impl RowSource for std::vec::IntoIter<ResponseRow> {
    async fn next_row(&mut self) -> Option<ResponseRow> {
        self.next()
    }
}

impl RowSource for VecDeque<ResponseRow> {
    async fn next_row(&mut self) -> Option<ResponseRow> {
        self.pop_front()
    }
}

/// Обход таблицы через GETBULK (или GETNEXT для SNMPv1).
///
/// Сессия открывается при первом запросе строки и закрывается при
/// завершении обхода или при drop. Обход заканчивается, когда любая колонка
/// выходит из своего поддерева или агент отвечает endOfMibView.
///
/// Ошибка транспорта или протокола отдаётся отдельной строкой, после чего
/// запрос повторяется с той же позиции. После `max_errors` ошибок подряд
/// обход останавливается. Не удалось открыть сессию - обход завершён сразу.
pub struct BulkWalk<C: Connector> {
    connector: C,
    device: Device,
    context: SecurityContext,
    roots: Vec<ObjectId>,
    current: Vec<ObjectId>,
    max_repetitions: u32,
    max_errors: u32,
    consecutive_errors: u32,
    session: Option<C::Session>,
    buffered: VecDeque<ResponseRow>,
    requests: usize,
    rows: usize,
    finished: bool,
}

impl<C: Connector> BulkWalk<C> {
    pub(crate) fn new(
        connector: C,
        device: Device,
        context: SecurityContext,
        roots: Vec<ObjectId>,
        max_repetitions: u32,
        max_errors: u32,
    ) -> Self {
        Self {
            connector,
            device,
            context,
            current: roots.clone(),
            roots,
            max_repetitions: max_repetitions.max(1),
            max_errors: max_errors.max(1),
            consecutive_errors: 0,
            session: None,
            buffered: VecDeque::new(),
            requests: 0,
            rows: 0,
            finished: false,
        }
    }

    /// Открыта ли сейчас сессия
    pub fn is_session_open(&self) -> bool {
        self.session.is_some()
    }

    /// Следующая строка или None в конце таблицы
    pub async fn next(&mut self) -> Option<ResponseRow> {
        loop {
            if let Some(row) = self.buffered.pop_front() {
                return Some(row);
            }
            if self.finished {
                return None;
            }
            self.fetch().await;
        }
    }

    /// Собирает все оставшиеся строки
    pub async fn collect(mut self) -> Vec<ResponseRow> {
        let mut rows = Vec::new();
        while let Some(row) = self.next().await {
            rows.push(row);
        }
        rows
    }

    async fn fetch(&mut self) {
        if self.session.is_none() {
            match self.connector.open(&self.device, &self.context).await {
                Ok(session) => self.session = Some(session),
                Err(e) => {
                    self.fail(ResponseRow::transport_error(e.to_string()));
                    return;
                }
            }
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };

        self.requests += 1;
        let result = if self.context.is_v1() {
            session.get_next(&self.current).await
        } else {
            session
                .get_bulk(&self.current, NON_REPEATERS, self.max_repetitions)
                .await
        };

        match result {
            Ok(response) => self.accept(response),
            Err(e) => self.request_failed(ResponseRow::transport_error(e.to_string())),
        }
    }

    fn accept(&mut self, response: Response) {
        if response.error_status != 0 {
            if self.context.is_v1() && response.error_status == V1_NO_SUCH_NAME {
                debug!(device = %self.device.target(), rows = self.rows, "конец MIB (noSuchName)");
                self.finish();
                return;
            }
            let status = ErrorStatus {
                code: response.error_status,
                index: response.error_index,
            };
            self.request_failed(ResponseRow::protocol_error(status, response.varbinds));
            return;
        }
        self.consecutive_errors = 0;

        let width = self.roots.len();
        let mut accepted = 0;
        let mut varbinds = response.varbinds.into_iter();

        loop {
            let row: Vec<_> = varbinds.by_ref().take(width).collect();
            if row.len() < width {
                // Неполная строка в конце пачки: продолжим с последней полной
                break;
            }

            for (column, vb) in row.iter().enumerate() {
                if vb.value.is_exception() || !vb.oid.starts_with(&self.roots[column]) {
                    debug!(
                        device = %self.device.target(),
                        rows = self.rows,
                        requests = self.requests,
                        "обход завершён на {}",
                        vb.oid
                    );
                    self.finish();
                    return;
                }
                if vb.oid <= self.current[column] {
                    warn!(
                        device = %self.device.target(),
                        "агент вернул невозрастающий OID {} после {}, обход остановлен",
                        vb.oid,
                        self.current[column]
                    );
                    self.finish();
                    return;
                }
            }

            for (column, vb) in row.iter().enumerate() {
                self.current[column] = vb.oid.clone();
            }
            self.rows += 1;
            accepted += 1;
            self.buffered.push_back(ResponseRow::values(row));
        }

        if accepted == 0 {
            self.finish();
        }
    }

    fn fail(&mut self, row: ResponseRow) {
        self.buffered.push_back(row);
        self.finish();
    }

    /// Строка с ошибкой; курсор не сдвигается, следующий запрос с той же позиции
    fn request_failed(&mut self, row: ResponseRow) {
        self.buffered.push_back(row);
        self.consecutive_errors += 1;

        if self.consecutive_errors >= self.max_errors {
            warn!(
                device = %self.device.target(),
                errors = self.consecutive_errors,
                rows = self.rows,
                "ошибки подряд, обход остановлен"
            );
            self.finish();
        }
    }

    fn finish(&mut self) {
        self.finished = true;
        self.session = None;
    }
}

impl<C: Connector> RowSource for BulkWalk<C> {
    async fn next_row(&mut self) -> Option<ResponseRow> {
        self.next().await
    }
}
