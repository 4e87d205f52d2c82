use std::time::Duration;

use snmp2::v3::{Auth, Security};
use snmp2::{AsyncSession, Oid, Pdu, Value};
use tokio::time::timeout;
use tracing::debug;

use super::oid::ObjectId;
use super::security::{AuthProtocol, CommunityVersion, PrivProtocol, SecurityContext};
use super::session::{Connector, Device, Response, SnmpSession, SnmpValue, VarBind};
use crate::error::{ConfigError, TransportError};

/// Таймаут одного SNMP запроса по умолчанию (секунды)
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Стартовый request-id для новых сессий
const STARTING_REQ_ID: i32 = 2;

/// Движок SNMP на базе snmp2::AsyncSession
#[derive(Debug, Clone)]
pub struct Snmp2Connector {
    timeout: Duration,
}

impl Default for Snmp2Connector {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }
}

impl Snmp2Connector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

/// Открытая сессия snmp2; сокет закрывается при drop
pub struct Snmp2Session {
    session: AsyncSession,
    target: String,
    timeout: Duration,
}

impl Connector for Snmp2Connector {
    type Session = Snmp2Session;

    fn validate(&self, context: &SecurityContext) -> Result<(), ConfigError> {
        if let SecurityContext::Usm {
            privacy: Some((protocol, _)),
            ..
        } = context
        {
            engine_cipher(*protocol)?;
        }
        Ok(())
    }

    async fn open(&self, device: &Device, context: &SecurityContext) -> Result<Snmp2Session, TransportError> {
        let target = device.target();
        let connect_error = |message: String| TransportError::Connect {
            target: target.clone(),
            message,
        };

        let connect = async {
            match context {
                SecurityContext::Community {
                    version: CommunityVersion::V1,
                    community,
                } => AsyncSession::new_v1(target.as_str(), community, STARTING_REQ_ID)
                    .await
                    .map_err(|e| connect_error(e.to_string())),
                SecurityContext::Community {
                    version: CommunityVersion::V2c,
                    community,
                } => AsyncSession::new_v2c(target.as_str(), community, STARTING_REQ_ID)
                    .await
                    .map_err(|e| connect_error(e.to_string())),
                SecurityContext::Usm { user, auth, privacy } => {
                    let security = usm_security(user, auth, privacy)
                        .map_err(|e| connect_error(e.to_string()))?;
                    let mut session = AsyncSession::new_v3(target.as_str(), STARTING_REQ_ID, security)
                        .await
                        .map_err(|e| connect_error(e.to_string()))?;
                    // Engine discovery (engine id, boots, time)
                    session
                        .init()
                        .await
                        .map_err(|e| connect_error(format!("{:?}", e)))?;
                    Ok(session)
                }
            }
        };

        let session = match timeout(self.timeout, connect).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(TransportError::Timeout {
                    target: target.clone(),
                });
            }
        };

        debug!(device = %target, "SNMP сессия открыта");
        Ok(Snmp2Session {
            session,
            target,
            timeout: self.timeout,
        })
    }
}

fn request_error(target: &str, message: String) -> TransportError {
    TransportError::Request {
        target: target.to_string(),
        message,
    }
}

fn timeout_error(target: &str) -> TransportError {
    TransportError::Timeout {
        target: target.to_string(),
    }
}

/// Дописывает ответ на один OID к склеенному ответу. На ошибке протокола
/// ставит статус с индексом позиции OID в исходном запросе и возвращает false.
fn merge_response(merged: &mut Response, position: usize, response: Response) -> bool {
    merged.varbinds.extend(response.varbinds);
    if response.error_status != 0 {
        merged.error_status = response.error_status;
        merged.error_index = position as u32 + 1;
        return false;
    }
    true
}

impl SnmpSession for Snmp2Session {
    async fn get(&mut self, oids: &[ObjectId]) -> Result<Response, TransportError> {
        // snmp2 отправляет GET по одному OID, склеиваем ответы
        let mut merged = Response {
            error_status: 0,
            error_index: 0,
            varbinds: Vec::with_capacity(oids.len()),
        };

        for (position, oid) in oids.iter().enumerate() {
            let oid = engine_oid(oid).map_err(|e| request_error(&self.target, e))?;
            let response = match timeout(self.timeout, self.session.get(&oid)).await {
                Ok(Ok(pdu)) => convert_pdu(pdu).map_err(|e| request_error(&self.target, e))?,
                Ok(Err(e)) => return Err(request_error(&self.target, format!("GET: {:?}", e))),
                Err(_) => return Err(timeout_error(&self.target)),
            };

            if !merge_response(&mut merged, position, response) {
                break;
            }
        }

        Ok(merged)
    }

    async fn get_next(&mut self, oids: &[ObjectId]) -> Result<Response, TransportError> {
        let mut merged = Response {
            error_status: 0,
            error_index: 0,
            varbinds: Vec::with_capacity(oids.len()),
        };

        for (position, oid) in oids.iter().enumerate() {
            let oid = engine_oid(oid).map_err(|e| request_error(&self.target, e))?;
            let response = match timeout(self.timeout, self.session.getnext(&oid)).await {
                Ok(Ok(pdu)) => convert_pdu(pdu).map_err(|e| request_error(&self.target, e))?,
                Ok(Err(e)) => return Err(request_error(&self.target, format!("GETNEXT: {:?}", e))),
                Err(_) => return Err(timeout_error(&self.target)),
            };

            if !merge_response(&mut merged, position, response) {
                break;
            }
        }

        Ok(merged)
    }

    async fn get_bulk(
        &mut self,
        oids: &[ObjectId],
        non_repeaters: u32,
        max_repetitions: u32,
    ) -> Result<Response, TransportError> {
        let names = oids
            .iter()
            .map(engine_oid)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| request_error(&self.target, e))?;
        let refs: Vec<&Oid<'_>> = names.iter().collect();

        match timeout(
            self.timeout,
            self.session.getbulk(&refs, non_repeaters, max_repetitions),
        )
        .await
        {
            Ok(Ok(pdu)) => convert_pdu(pdu).map_err(|e| request_error(&self.target, e)),
            Ok(Err(e)) => Err(request_error(&self.target, format!("GETBULK: {:?}", e))),
            Err(_) => Err(timeout_error(&self.target)),
        }
    }
}

fn usm_security(
    user: &[u8],
    auth: &Option<(AuthProtocol, Vec<u8>)>,
    privacy: &Option<(PrivProtocol, Vec<u8>)>,
) -> Result<Security, ConfigError> {
    let Some((auth_protocol, auth_key)) = auth else {
        return Ok(Security::new(user, b"").with_auth(Auth::NoAuthNoPriv));
    };

    let security = Security::new(user, auth_key).with_auth_protocol(engine_auth(*auth_protocol));
    let security = match privacy {
        Some((protocol, key)) => security.with_auth(Auth::AuthPriv {
            cipher: engine_cipher(*protocol)?,
            privacy_password: key.clone(),
        }),
        None => security.with_auth(Auth::AuthNoPriv),
    };
    Ok(security)
}

fn engine_auth(protocol: AuthProtocol) -> snmp2::v3::AuthProtocol {
    match protocol {
        AuthProtocol::Md5 => snmp2::v3::AuthProtocol::Md5,
        AuthProtocol::Sha1 => snmp2::v3::AuthProtocol::Sha1,
        AuthProtocol::Sha224 => snmp2::v3::AuthProtocol::Sha224,
        AuthProtocol::Sha256 => snmp2::v3::AuthProtocol::Sha256,
        AuthProtocol::Sha384 => snmp2::v3::AuthProtocol::Sha384,
        AuthProtocol::Sha512 => snmp2::v3::AuthProtocol::Sha512,
    }
}

fn engine_cipher(protocol: PrivProtocol) -> Result<snmp2::v3::Cipher, ConfigError> {
    match protocol {
        PrivProtocol::Des => Ok(snmp2::v3::Cipher::Des),
        PrivProtocol::Aes128 => Ok(snmp2::v3::Cipher::Aes128),
        PrivProtocol::Aes192 => Ok(snmp2::v3::Cipher::Aes192),
        PrivProtocol::Aes256 => Ok(snmp2::v3::Cipher::Aes256),
        PrivProtocol::TripleDes => Err(ConfigError::UnsupportedProtocol {
            name: protocol.to_string(),
        }),
    }
}

fn engine_oid(oid: &ObjectId) -> Result<Oid<'static>, String> {
    let parts = oid.parts().to_vec();
    Oid::from(&parts).map_err(|e| format!("Не удалось создать Oid из '{}': {:?}", oid, e))
}

fn convert_oid(oid: &Oid<'_>) -> Result<ObjectId, String> {
    oid.iter()
        .map(|arcs| ObjectId::new(arcs.collect::<Vec<u64>>()))
        .ok_or_else(|| format!("OID в ответе не помещается в u64: {}", oid))
}

fn convert_pdu(pdu: Pdu<'_>) -> Result<Response, String> {
    let varbinds = pdu
        .varbinds
        .into_iter()
        .map(|(oid, value)| Ok(VarBind::new(convert_oid(&oid)?, convert_value(value)?)))
        .collect::<Result<Vec<_>, String>>()?;

    Ok(Response {
        error_status: pdu.error_status as u32,
        error_index: pdu.error_index as u32,
        varbinds,
    })
}

fn convert_value(value: Value<'_>) -> Result<SnmpValue, String> {
    let value = match value {
        Value::Integer(v) => SnmpValue::Integer(v as i64),
        Value::OctetString(bytes) => SnmpValue::OctetString(bytes.to_vec()),
        Value::ObjectIdentifier(oid) => SnmpValue::ObjectIdentifier(convert_oid(&oid)?),
        Value::IpAddress(ip) => SnmpValue::IpAddress(ip),
        Value::Counter32(v) => SnmpValue::Counter32(v as u32),
        Value::Unsigned32(v) => SnmpValue::Unsigned32(v as u32),
        Value::Timeticks(v) => SnmpValue::Timeticks(v as u32),
        Value::Counter64(v) => SnmpValue::Counter64(v as u64),
        Value::Opaque(bytes) => SnmpValue::Opaque(bytes.to_vec()),
        Value::Null => SnmpValue::Null,
        Value::NoSuchObject => SnmpValue::NoSuchObject,
        Value::NoSuchInstance => SnmpValue::NoSuchInstance,
        Value::EndOfMibView => SnmpValue::EndOfMibView,
        other => SnmpValue::Other(format!("{:?}", other)),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use crate::snmp::oid::parse_oid;
    use crate::snmp::security::Authentication;
    use crate::snmp::session::ResponseRow;

    #[test]
    fn oid_conversion_keeps_dotted_form() {
        let oid = parse_oid("1.3.6.1.2.1.25.3.3.1.2").unwrap();
        let engine = engine_oid(&oid).unwrap();
        assert_eq!(convert_oid(&engine), Ok(oid));
    }

    #[test]
    fn oid_value_conversion_keeps_arcs() {
        let oid = parse_oid("1.3.6.1.4.1.8072.3.2.10").unwrap();
        let engine = engine_oid(&oid).unwrap();
        assert_eq!(
            convert_value(Value::ObjectIdentifier(engine)),
            Ok(SnmpValue::ObjectIdentifier(oid))
        );
    }

    #[test]
    fn oversized_arc_is_an_error() {
        // Дуга больше u64::MAX (2^64) в BER: 0x82 0x80 .. 0x80 0x00
        let mut ber = vec![0x2b];
        ber.push(0x82);
        ber.extend([0x80; 9]);
        ber.push(0x00);
        let oid = Oid::new(ber.into());
        assert!(convert_oid(&oid).is_err());
    }

    fn single(oid: &str, value: SnmpValue, error_status: u32) -> Response {
        Response {
            error_status,
            error_index: if error_status == 0 { 0 } else { 1 },
            varbinds: vec![VarBind::new(parse_oid(oid).unwrap(), value)],
        }
    }

    #[test]
    fn merged_error_points_at_failing_oid() {
        let mut merged = Response {
            error_status: 0,
            error_index: 0,
            varbinds: Vec::new(),
        };

        assert!(merge_response(&mut merged, 0, single("1.3.6.1.2.1.1.1.0", SnmpValue::string("Linux"), 0)));
        assert!(merge_response(&mut merged, 1, single("1.3.6.1.2.1.1.5.0", SnmpValue::string("srv01"), 0)));
        assert!(!merge_response(&mut merged, 2, single("1.3.6.1.2.1.1.9.0", SnmpValue::Null, 2)));

        assert_eq!(merged.varbinds.len(), 3);
        let row = ResponseRow::from_response(merged);
        let status = row.error_status.unwrap();
        assert_eq!(status.index, 3);
        assert_eq!(status.offending_oid(&row.bindings), "1.3.6.1.2.1.1.9.0");
    }

    #[test]
    fn triple_des_is_rejected_up_front() {
        let auth = Authentication::usm("monitor")
            .with_auth("sha", "authpass123")
            .with_privacy("3des", "privpass123");
        let context = SecurityContext::build(&auth).unwrap();

        assert_eq!(
            Snmp2Connector::default().validate(&context),
            Err(ConfigError::UnsupportedProtocol {
                name: "3DES".to_string()
            })
        );
    }

    #[test]
    fn supported_ciphers_pass_validation() {
        let auth = Authentication::usm("monitor")
            .with_auth("sha256", "authpass123")
            .with_privacy("aes256", "privpass123");
        let context = SecurityContext::build(&auth).unwrap();
        assert!(Snmp2Connector::default().validate(&context).is_ok());
    }
}
