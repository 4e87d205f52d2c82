use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ProtocolKind};

/// Параметры аутентификации в том виде, в каком их задаёт вызывающий
#[derive(Clone, Serialize, Deserialize)]
pub struct Authentication {
    /// Версия SNMP: 1, 2 (v2c) или 3
    pub version: u8,
    /// Community для v1/v2c или имя пользователя USM для v3
    pub user: String,
    #[serde(default)]
    pub auth: Option<KeyConfig>,
    #[serde(default, rename = "priv")]
    pub privacy: Option<KeyConfig>,
}

/// Протокол и ключ (auth или priv)
#[derive(Clone, Serialize, Deserialize)]
pub struct KeyConfig {
    pub protocol: String,
    pub key: String,
}

impl Authentication {
    pub fn community(version: u8, community: impl Into<String>) -> Self {
        Self {
            version,
            user: community.into(),
            auth: None,
            privacy: None,
        }
    }

    pub fn usm(user: impl Into<String>) -> Self {
        Self {
            version: 3,
            user: user.into(),
            auth: None,
            privacy: None,
        }
    }

    pub fn with_auth(mut self, protocol: &str, key: &str) -> Self {
        self.auth = Some(KeyConfig {
            protocol: protocol.to_string(),
            key: key.to_string(),
        });
        self
    }

    pub fn with_privacy(mut self, protocol: &str, key: &str) -> Self {
        self.privacy = Some(KeyConfig {
            protocol: protocol.to_string(),
            key: key.to_string(),
        });
        self
    }
}

// Ключи и community не попадают в логи
impl fmt::Debug for Authentication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authentication")
            .field("version", &self.version)
            .field("auth", &self.auth.as_ref().map(|a| &a.protocol))
            .field("priv", &self.privacy.as_ref().map(|p| &p.protocol))
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for KeyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyConfig")
            .field("protocol", &self.protocol)
            .finish_non_exhaustive()
    }
}

/// Протоколы аутентификации USM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthProtocol {
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl fmt::Display for AuthProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Md5 => write!(f, "MD5"),
            Self::Sha1 => write!(f, "SHA"),
            Self::Sha224 => write!(f, "SHA-224"),
            Self::Sha256 => write!(f, "SHA-256"),
            Self::Sha384 => write!(f, "SHA-384"),
            Self::Sha512 => write!(f, "SHA-512"),
        }
    }
}

impl FromStr for AuthProtocol {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "md5" => Ok(Self::Md5),
            "sha" | "sha1" | "sha-1" => Ok(Self::Sha1),
            "sha224" | "sha-224" => Ok(Self::Sha224),
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "sha384" | "sha-384" => Ok(Self::Sha384),
            "sha512" | "sha-512" => Ok(Self::Sha512),
            _ => Err(ConfigError::UnknownProtocol {
                kind: ProtocolKind::Auth,
                name: s.to_string(),
            }),
        }
    }
}

/// Протоколы шифрования USM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivProtocol {
    Des,
    TripleDes,
    Aes128,
    Aes192,
    Aes256,
}

impl fmt::Display for PrivProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Des => write!(f, "DES"),
            Self::TripleDes => write!(f, "3DES"),
            Self::Aes128 => write!(f, "AES"),
            Self::Aes192 => write!(f, "AES-192"),
            Self::Aes256 => write!(f, "AES-256"),
        }
    }
}

impl FromStr for PrivProtocol {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "des" => Ok(Self::Des),
            "3des" | "3des-ede" => Ok(Self::TripleDes),
            "aes" | "aes128" | "aes-128" => Ok(Self::Aes128),
            "aes192" | "aes-192" => Ok(Self::Aes192),
            "aes256" | "aes-256" => Ok(Self::Aes256),
            _ => Err(ConfigError::UnknownProtocol {
                kind: ProtocolKind::Priv,
                name: s.to_string(),
            }),
        }
    }
}

/// Модель обработки сообщений для community-based версий
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommunityVersion {
    V1,
    V2c,
}

/// Проверенный контекст безопасности, готовый для SNMP движка
#[derive(Clone, PartialEq, Eq)]
pub enum SecurityContext {
    Community {
        version: CommunityVersion,
        community: Vec<u8>,
    },
    Usm {
        user: Vec<u8>,
        auth: Option<(AuthProtocol, Vec<u8>)>,
        privacy: Option<(PrivProtocol, Vec<u8>)>,
    },
}

impl SecurityContext {
    /// Строит контекст из параметров вызывающего.
    ///
    /// Неизвестные имена протоколов - ошибка, а не тихий переход на noAuth/noPriv.
    pub fn build(authentication: &Authentication) -> Result<Self, ConfigError> {
        match authentication.version {
            1 => Ok(Self::Community {
                version: CommunityVersion::V1,
                community: authentication.user.as_bytes().to_vec(),
            }),
            2 => Ok(Self::Community {
                version: CommunityVersion::V2c,
                community: authentication.user.as_bytes().to_vec(),
            }),
            3 => {
                let auth = match &authentication.auth {
                    Some(cfg) if !is_none_name(&cfg.protocol, "noauth") => {
                        Some((cfg.protocol.parse::<AuthProtocol>()?, cfg.key.as_bytes().to_vec()))
                    }
                    _ => None,
                };
                let privacy = match &authentication.privacy {
                    Some(cfg) if !is_none_name(&cfg.protocol, "nopriv") => {
                        Some((cfg.protocol.parse::<PrivProtocol>()?, cfg.key.as_bytes().to_vec()))
                    }
                    _ => None,
                };

                if privacy.is_some() && auth.is_none() {
                    return Err(ConfigError::PrivacyWithoutAuth);
                }

                Ok(Self::Usm {
                    user: authentication.user.as_bytes().to_vec(),
                    auth,
                    privacy,
                })
            }
            other => Err(ConfigError::UnsupportedVersion(other)),
        }
    }

    pub fn is_v1(&self) -> bool {
        matches!(
            self,
            Self::Community {
                version: CommunityVersion::V1,
                ..
            }
        )
    }

    /// Короткое имя версии для логов и отчётов
    pub fn version_label(&self) -> &'static str {
        match self {
            Self::Community {
                version: CommunityVersion::V1,
                ..
            } => "SNMPv1",
            Self::Community {
                version: CommunityVersion::V2c,
                ..
            } => "SNMPv2c",
            Self::Usm { .. } => "SNMPv3",
        }
    }
}

fn is_none_name(name: &str, none: &str) -> bool {
    name.trim().eq_ignore_ascii_case(none)
}

impl fmt::Debug for SecurityContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Community { version, .. } => f
                .debug_struct("Community")
                .field("version", version)
                .finish_non_exhaustive(),
            Self::Usm { auth, privacy, .. } => f
                .debug_struct("Usm")
                .field("auth", &auth.as_ref().map(|(p, _)| *p))
                .field("privacy", &privacy.as_ref().map(|(p, _)| *p))
                .finish_non_exhaustive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn community_versions() {
        let v1 = SecurityContext::build(&Authentication::community(1, "public")).unwrap();
        assert!(v1.is_v1());
        assert_eq!(v1.version_label(), "SNMPv1");

        let v2 = SecurityContext::build(&Authentication::community(2, "private")).unwrap();
        assert_eq!(
            v2,
            SecurityContext::Community {
                version: CommunityVersion::V2c,
                community: b"private".to_vec(),
            }
        );
    }

    #[test]
    fn unsupported_version_is_fatal() {
        assert_eq!(
            SecurityContext::build(&Authentication::community(4, "public")),
            Err(ConfigError::UnsupportedVersion(4))
        );
        assert_eq!(
            SecurityContext::build(&Authentication::community(0, "public")),
            Err(ConfigError::UnsupportedVersion(0))
        );
    }

    #[test]
    fn usm_auth_priv() {
        let auth = Authentication::usm("monitor")
            .with_auth("sha256", "authpass123")
            .with_privacy("aes", "privpass123");

        match SecurityContext::build(&auth).unwrap() {
            SecurityContext::Usm { user, auth, privacy } => {
                assert_eq!(user, b"monitor");
                assert_eq!(auth, Some((AuthProtocol::Sha256, b"authpass123".to_vec())));
                assert_eq!(privacy, Some((PrivProtocol::Aes128, b"privpass123".to_vec())));
            }
            other => panic!("ожидался USM, получено {:?}", other),
        }
    }

    #[test]
    fn unknown_auth_protocol_fails_closed() {
        let auth = Authentication::usm("monitor").with_auth("sha3-512", "authpass123");
        assert_eq!(
            SecurityContext::build(&auth),
            Err(ConfigError::UnknownProtocol {
                kind: ProtocolKind::Auth,
                name: "sha3-512".to_string(),
            })
        );
    }

    #[test]
    fn unknown_priv_protocol_fails_closed() {
        let auth = Authentication::usm("monitor")
            .with_auth("md5", "authpass123")
            .with_privacy("blowfish", "privpass123");
        assert!(matches!(
            SecurityContext::build(&auth),
            Err(ConfigError::UnknownProtocol {
                kind: ProtocolKind::Priv,
                ..
            })
        ));
    }

    #[test]
    fn explicit_noauth_nopriv() {
        let auth = Authentication::usm("monitor")
            .with_auth("noauth", "")
            .with_privacy("nopriv", "");
        assert_eq!(
            SecurityContext::build(&auth).unwrap(),
            SecurityContext::Usm {
                user: b"monitor".to_vec(),
                auth: None,
                privacy: None,
            }
        );
    }

    #[test]
    fn privacy_requires_auth() {
        let auth = Authentication::usm("monitor").with_privacy("des", "privpass123");
        assert_eq!(SecurityContext::build(&auth), Err(ConfigError::PrivacyWithoutAuth));
    }

    #[test]
    fn protocol_names_are_case_insensitive() {
        assert_eq!("SHA".parse::<AuthProtocol>().unwrap(), AuthProtocol::Sha1);
        assert_eq!("SHA-512".parse::<AuthProtocol>().unwrap(), AuthProtocol::Sha512);
        assert_eq!("3DES".parse::<PrivProtocol>().unwrap(), PrivProtocol::TripleDes);
        assert_eq!("AES256".parse::<PrivProtocol>().unwrap(), PrivProtocol::Aes256);
    }

    #[test]
    fn debug_hides_secrets() {
        let auth = Authentication::usm("monitor").with_auth("md5", "supersecret");
        let ctx = SecurityContext::build(&auth).unwrap();
        assert!(!format!("{:?}", auth).contains("supersecret"));
        assert!(!format!("{:?}", ctx).contains("supersecret"));
    }

    #[test]
    fn deserializes_priv_section() {
        let yaml = r#"
version: 3
user: monitor
auth: { protocol: sha, key: authpass123 }
priv: { protocol: aes256, key: privpass123 }
"#;
        let auth: Authentication = serde_yml::from_str(yaml).unwrap();
        assert_eq!(auth.privacy.as_ref().map(|p| p.protocol.as_str()), Some("aes256"));
        assert!(SecurityContext::build(&auth).is_ok());
    }
}
