//! Программируемый SNMP агент в памяти для тестов.
//!
//! Реализует семантику GET/GETNEXT/GETBULK над отсортированным деревом OID
//! и умеет подсовывать таймауты и ошибки протокола на заданных запросах.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::{Arc, Mutex, MutexGuard};

use super::oid::{ObjectId, parse_oid};
use super::security::SecurityContext;
use super::session::{Connector, Device, Response, SnmpSession, SnmpValue, VarBind};
use crate::error::TransportError;

/// Сбой, подставляемый вместо ответа на конкретный запрос
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockFault {
    Timeout,
    ErrorStatus { code: u32, index: u32 },
}

/// Тип запроса, записанного агентом
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestKind {
    Get,
    GetNext,
    GetBulk {
        non_repeaters: u32,
        max_repetitions: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub kind: RequestKind,
    pub oids: Vec<ObjectId>,
}

#[derive(Debug, Default)]
struct MockAgentInner {
    data: BTreeMap<ObjectId, SnmpValue>,
    /// Номер запроса (с 1) -> сбой
    faults: HashMap<usize, MockFault>,
    requests: Vec<RecordedRequest>,
    refuse_connect: Option<String>,
    /// Ограничение числа varbind в ответе GETBULK (обрезанные ответы)
    bulk_limit: Option<usize>,
    /// SNMPv1: конец MIB сообщается через noSuchName
    v1_semantics: bool,
    sessions_opened: usize,
    sessions_live: usize,
}

/// Агент в памяти; клоны разделяют состояние
#[derive(Debug, Clone, Default)]
pub struct MockAgent {
    inner: Arc<Mutex<MockAgentInner>>,
}

impl MockAgent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Агент со SNMPv1 поведением для GETNEXT/GET
    pub fn v1() -> Self {
        let agent = Self::default();
        agent.state().v1_semantics = true;
        agent
    }

    fn state(&self) -> MutexGuard<'_, MockAgentInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Добавляет значение по числовому OID; невалидный OID игнорируется
    pub fn insert(&self, oid: &str, value: SnmpValue) -> &Self {
        if let Ok(oid) = parse_oid(oid) {
            self.state().data.insert(oid, value);
        }
        self
    }

    /// hrProcessorLoad для процессоров с индексами, начиная с 196608 (как у Net-SNMP)
    pub fn with_processor_load(&self, loads: &[i64]) -> &Self {
        for (i, load) in loads.iter().enumerate() {
            self.insert(
                &format!("1.3.6.1.2.1.25.3.3.1.2.{}", 196608 + i),
                SnmpValue::Integer(*load),
            );
        }
        self
    }

    /// hrStorageTable: (описание, размер, занято), индексы с 1
    pub fn with_storage(&self, entries: &[(&str, i64, i64)]) -> &Self {
        for (i, (descr, size, used)) in entries.iter().enumerate() {
            let index = i + 1;
            self.insert(
                &format!("1.3.6.1.2.1.25.2.3.1.1.{}", index),
                SnmpValue::Integer(index as i64),
            );
            self.insert(&format!("1.3.6.1.2.1.25.2.3.1.3.{}", index), SnmpValue::string(descr));
            self.insert(&format!("1.3.6.1.2.1.25.2.3.1.4.{}", index), SnmpValue::Integer(4096));
            self.insert(&format!("1.3.6.1.2.1.25.2.3.1.5.{}", index), SnmpValue::Integer(*size));
            self.insert(&format!("1.3.6.1.2.1.25.2.3.1.6.{}", index), SnmpValue::Integer(*used));
        }
        self
    }

    /// Сбой на запросе с номером `request` (с 1, сквозная нумерация по всем сессиям)
    pub fn fail_request(&self, request: usize, fault: MockFault) -> &Self {
        self.state().faults.insert(request, fault);
        self
    }

    pub fn refuse_connections(&self, message: &str) -> &Self {
        self.state().refuse_connect = Some(message.to_string());
        self
    }

    pub fn limit_bulk_varbinds(&self, limit: usize) -> &Self {
        self.state().bulk_limit = Some(limit);
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state().requests.clone()
    }

    pub fn sessions_opened(&self) -> usize {
        self.state().sessions_opened
    }

    /// Сессии, которые ещё не были закрыты (drop)
    pub fn sessions_live(&self) -> usize {
        self.state().sessions_live
    }

    fn handle(&self, kind: RequestKind, oids: &[ObjectId]) -> Result<Response, TransportError> {
        let mut state = self.state();
        state.requests.push(RecordedRequest {
            kind: kind.clone(),
            oids: oids.to_vec(),
        });

        let number = state.requests.len();
        match state.faults.get(&number) {
            Some(MockFault::Timeout) => {
                return Err(TransportError::Timeout {
                    target: "mock".to_string(),
                });
            }
            Some(MockFault::ErrorStatus { code, index }) => {
                return Ok(Response {
                    error_status: *code,
                    error_index: *index,
                    varbinds: oids
                        .iter()
                        .map(|oid| VarBind::new(oid.clone(), SnmpValue::Null))
                        .collect(),
                });
            }
            None => {}
        }

        match kind {
            RequestKind::Get => Ok(state.get(oids)),
            RequestKind::GetNext => Ok(state.get_next(oids)),
            RequestKind::GetBulk {
                non_repeaters,
                max_repetitions,
            } => Ok(state.get_bulk(oids, non_repeaters, max_repetitions)),
        }
    }
}

impl MockAgentInner {
    fn successor(&self, oid: &ObjectId) -> Option<(ObjectId, SnmpValue)> {
        self.data
            .range((Bound::Excluded(oid.clone()), Bound::Unbounded))
            .next()
            .map(|(k, v)| (k.clone(), v.clone()))
    }

    fn get(&self, oids: &[ObjectId]) -> Response {
        let mut varbinds = Vec::with_capacity(oids.len());
        for (i, oid) in oids.iter().enumerate() {
            match self.data.get(oid) {
                Some(value) => varbinds.push(VarBind::new(oid.clone(), value.clone())),
                None if self.v1_semantics => return no_such_name(oids, i),
                None => varbinds.push(VarBind::new(oid.clone(), SnmpValue::NoSuchObject)),
            }
        }
        ok(varbinds)
    }

    fn get_next(&self, oids: &[ObjectId]) -> Response {
        let mut varbinds = Vec::with_capacity(oids.len());
        for (i, oid) in oids.iter().enumerate() {
            match self.successor(oid) {
                Some((next, value)) => varbinds.push(VarBind::new(next, value)),
                None if self.v1_semantics => return no_such_name(oids, i),
                None => varbinds.push(VarBind::new(oid.clone(), SnmpValue::EndOfMibView)),
            }
        }
        ok(varbinds)
    }

    fn get_bulk(&self, oids: &[ObjectId], non_repeaters: u32, max_repetitions: u32) -> Response {
        let split = (non_repeaters as usize).min(oids.len());
        let mut varbinds = self.get_next(&oids[..split]).varbinds;

        let mut cursor: Vec<ObjectId> = oids[split..].to_vec();
        for _ in 0..max_repetitions {
            if cursor.is_empty() {
                break;
            }
            let mut all_ended = true;
            for slot in cursor.iter_mut() {
                match self.successor(slot) {
                    Some((next, value)) => {
                        varbinds.push(VarBind::new(next.clone(), value));
                        *slot = next;
                        all_ended = false;
                    }
                    None => varbinds.push(VarBind::new(slot.clone(), SnmpValue::EndOfMibView)),
                }
            }
            if all_ended {
                break;
            }
        }

        if let Some(limit) = self.bulk_limit {
            varbinds.truncate(limit);
        }
        ok(varbinds)
    }
}

fn ok(varbinds: Vec<VarBind>) -> Response {
    Response {
        error_status: 0,
        error_index: 0,
        varbinds,
    }
}

fn no_such_name(oids: &[ObjectId], position: usize) -> Response {
    Response {
        error_status: 2,
        error_index: position as u32 + 1,
        varbinds: oids
            .iter()
            .map(|oid| VarBind::new(oid.clone(), SnmpValue::Null))
            .collect(),
    }
}

/// Сессия к агенту в памяти
pub struct MockSession {
    agent: MockAgent,
}

impl Drop for MockSession {
    fn drop(&mut self) {
        let mut state = self.agent.state();
        state.sessions_live = state.sessions_live.saturating_sub(1);
    }
}

impl SnmpSession for MockSession {
    async fn get(&mut self, oids: &[ObjectId]) -> Result<Response, TransportError> {
        self.agent.handle(RequestKind::Get, oids)
    }

    async fn get_next(&mut self, oids: &[ObjectId]) -> Result<Response, TransportError> {
        self.agent.handle(RequestKind::GetNext, oids)
    }

    async fn get_bulk(
        &mut self,
        oids: &[ObjectId],
        non_repeaters: u32,
        max_repetitions: u32,
    ) -> Result<Response, TransportError> {
        self.agent.handle(
            RequestKind::GetBulk {
                non_repeaters,
                max_repetitions,
            },
            oids,
        )
    }
}

impl Connector for MockAgent {
    type Session = MockSession;

    async fn open(&self, device: &Device, _context: &SecurityContext) -> Result<MockSession, TransportError> {
        let mut state = self.state();
        if let Some(message) = &state.refuse_connect {
            return Err(TransportError::Connect {
                target: device.target(),
                message: message.clone(),
            });
        }
        state.sessions_opened += 1;
        state.sessions_live += 1;
        drop(state);

        Ok(MockSession { agent: self.clone() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(s: &str) -> ObjectId {
        parse_oid(s).unwrap()
    }

    #[test]
    fn bulk_interleaves_columns() {
        let agent = MockAgent::new();
        agent.with_storage(&[("Physical Memory", 1000, 500), ("/", 2000, 100)]);

        let response = agent
            .handle(
                RequestKind::GetBulk {
                    non_repeaters: 0,
                    max_repetitions: 2,
                },
                &[oid("1.3.6.1.2.1.25.2.3.1.3"), oid("1.3.6.1.2.1.25.2.3.1.5")],
            )
            .unwrap();

        let got: Vec<String> = response.varbinds.iter().map(|vb| vb.oid.to_string()).collect();
        assert_eq!(
            got,
            vec![
                "1.3.6.1.2.1.25.2.3.1.3.1",
                "1.3.6.1.2.1.25.2.3.1.5.1",
                "1.3.6.1.2.1.25.2.3.1.3.2",
                "1.3.6.1.2.1.25.2.3.1.5.2",
            ]
        );
    }

    #[test]
    fn get_next_past_end_of_mib() {
        let agent = MockAgent::new();
        agent.insert("1.3.6.1.2.1.1.1.0", SnmpValue::string("Linux"));

        let response = agent.handle(RequestKind::GetNext, &[oid("1.3.6.1.2.1.1.1.0")]).unwrap();
        assert_eq!(response.varbinds[0].value, SnmpValue::EndOfMibView);

        let v1 = MockAgent::v1();
        let response = v1.handle(RequestKind::GetNext, &[oid("1.3.6.1.2.1.1.1.0")]).unwrap();
        assert_eq!((response.error_status, response.error_index), (2, 1));
    }

    #[test]
    fn faults_by_request_number() {
        let agent = MockAgent::new();
        agent.insert("1.3.6.1.2.1.1.1.0", SnmpValue::string("Linux"));
        agent.fail_request(2, MockFault::Timeout);

        let first = agent.handle(RequestKind::Get, &[oid("1.3.6.1.2.1.1.1.0")]);
        let second = agent.handle(RequestKind::Get, &[oid("1.3.6.1.2.1.1.1.0")]);
        assert!(first.is_ok());
        assert!(matches!(second, Err(TransportError::Timeout { .. })));
        assert_eq!(agent.requests().len(), 2);
    }
}
