//! Process configuration, read once from the environment at startup.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;
use tonebridge_core::auth::BasicCredentials;
use tonebridge_core::conversation::is_workspace_configured;
use tonebridge_core::tone::ToneMergePolicy;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_ASSISTANT_URL: &str = "https://gateway.watsonplatform.net/assistant/api";
const DEFAULT_ASSISTANT_VERSION: &str = "2017-05-26";
const DEFAULT_TONE_ANALYZER_URL: &str = "https://gateway.watsonplatform.net/tone-analyzer/api";
const DEFAULT_TONE_ANALYZER_VERSION: &str = "2016-05-19";
const DEFAULT_STATIC_DIR: &str = "./public";
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{key} must be a valid {expected}, got '{value}'")]
    InvalidValue {
        key: &'static str,
        expected: &'static str,
        value: String,
    },
    #[error("{service} credentials need both {service}_USERNAME and {service}_PASSWORD")]
    IncompleteCredentials { service: &'static str },
    #[error("LOG_USER and LOG_PASS must both be set when a chat log is enabled")]
    MissingLogCredentials,
    #[error("CHAT_LOG=postgres requires DATABASE_URL")]
    MissingDatabaseUrl,
}

/// HTTP Basic credentials for an upstream service.
#[derive(Clone, PartialEq)]
pub struct ServiceCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for ServiceCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Where and how to reach an upstream service.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceEndpoint {
    pub url: Url,
    pub version: String,
    pub credentials: Option<ServiceCredentials>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatLogBackend {
    Disabled,
    Memory,
    Postgres { database_url: String },
}

impl ChatLogBackend {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, ChatLogBackend::Disabled)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// `None` when unset or still the sample placeholder.
    pub workspace_id: Option<String>,
    pub assistant: ServiceEndpoint,
    pub tone_analyzer: ServiceEndpoint,
    pub tone_policy: ToneMergePolicy,
    pub chat_log: ChatLogBackend,
    pub log_credentials: Option<BasicCredentials>,
    pub static_dir: PathBuf,
    pub cors_origins: Vec<String>,
    pub upstream_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = match get("PORT") {
            Some(raw) => parse_value("PORT", "port number", &raw)?,
            None => DEFAULT_PORT,
        };

        let workspace_id = get("WORKSPACE_ID").filter(|id| is_workspace_configured(Some(id.as_str())));

        let assistant = ServiceEndpoint {
            url: parse_url(
                "ASSISTANT_URL",
                get("ASSISTANT_URL").as_deref().unwrap_or(DEFAULT_ASSISTANT_URL),
            )?,
            version: get("ASSISTANT_VERSION").unwrap_or_else(|| DEFAULT_ASSISTANT_VERSION.to_string()),
            credentials: service_credentials(&get, "ASSISTANT")?,
        };

        let tone_analyzer = ServiceEndpoint {
            url: parse_url(
                "TONE_ANALYZER_URL",
                get("TONE_ANALYZER_URL")
                    .as_deref()
                    .unwrap_or(DEFAULT_TONE_ANALYZER_URL),
            )?,
            version: get("TONE_ANALYZER_VERSION")
                .unwrap_or_else(|| DEFAULT_TONE_ANALYZER_VERSION.to_string()),
            credentials: service_credentials(&get, "TONE_ANALYZER")?,
        };

        let mut tone_policy = ToneMergePolicy::default();
        if let Some(raw) = get("MAINTAIN_TONE_HISTORY") {
            tone_policy = tone_policy.with_history(parse_bool("MAINTAIN_TONE_HISTORY", &raw)?);
        }
        if let Some(raw) = get("TONE_SCORE_THRESHOLD") {
            let threshold: f64 = parse_value("TONE_SCORE_THRESHOLD", "number", &raw)?;
            if !(0.0..=1.0).contains(&threshold) {
                return Err(ConfigError::InvalidValue {
                    key: "TONE_SCORE_THRESHOLD",
                    expected: "number between 0 and 1",
                    value: raw,
                });
            }
            tone_policy = tone_policy.with_threshold(threshold);
        }

        let database_url = get("DATABASE_URL");
        let chat_log = match get("CHAT_LOG").map(|v| v.to_lowercase()).as_deref() {
            Some("memory") => ChatLogBackend::Memory,
            Some("postgres") => ChatLogBackend::Postgres {
                database_url: database_url.ok_or(ConfigError::MissingDatabaseUrl)?,
            },
            Some("off") | Some("none") => ChatLogBackend::Disabled,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "CHAT_LOG",
                    expected: "chat log backend (memory, postgres, off)",
                    value: other.to_string(),
                });
            }
            None => match database_url {
                Some(database_url) => ChatLogBackend::Postgres { database_url },
                None => ChatLogBackend::Disabled,
            },
        };

        let log_credentials = match (get("LOG_USER"), get("LOG_PASS")) {
            (Some(user), Some(pass)) => Some(BasicCredentials::new(user, pass)),
            _ if chat_log.is_enabled() => return Err(ConfigError::MissingLogCredentials),
            _ => None,
        };

        let upstream_timeout = match get("UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_value("UPSTREAM_TIMEOUT_SECS", "number of seconds", &raw)?),
            None => Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
        };

        let cors_origins = get("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            port,
            workspace_id,
            assistant,
            tone_analyzer,
            tone_policy,
            chat_log,
            log_credentials,
            static_dir: get("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR)),
            cors_origins,
            upstream_timeout,
        })
    }
}

/// `<SERVICE>_APIKEY` wins over `<SERVICE>_USERNAME` / `<SERVICE>_PASSWORD`.
fn service_credentials(
    get: &impl Fn(&str) -> Option<String>,
    service: &'static str,
) -> Result<Option<ServiceCredentials>, ConfigError> {
    if let Some(apikey) = get(&format!("{service}_APIKEY")) {
        return Ok(Some(ServiceCredentials {
            username: "apikey".to_string(),
            password: apikey,
        }));
    }

    match (
        get(&format!("{service}_USERNAME")),
        get(&format!("{service}_PASSWORD")),
    ) {
        (Some(username), Some(password)) => Ok(Some(ServiceCredentials { username, password })),
        (None, None) => Ok(None),
        _ => Err(ConfigError::IncompleteCredentials { service }),
    }
}

fn parse_value<T: std::str::FromStr>(
    key: &'static str,
    expected: &'static str,
    raw: &str,
) -> Result<T, ConfigError> {
    raw.parse().map_err(|_| ConfigError::InvalidValue {
        key,
        expected,
        value: raw.to_string(),
    })
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            expected: "boolean",
            value: raw.to_string(),
        }),
    }
}

fn parse_url(key: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let invalid = || ConfigError::InvalidValue {
        key,
        expected: "http(s) URL",
        value: raw.to_string(),
    };
    let url = Url::parse(raw).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid());
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.workspace_id, None);
        assert_eq!(cfg.assistant.version, "2017-05-26");
        assert_eq!(cfg.tone_analyzer.version, "2016-05-19");
        assert_eq!(cfg.tone_policy, ToneMergePolicy::default());
        assert_eq!(cfg.chat_log, ChatLogBackend::Disabled);
        assert!(cfg.log_credentials.is_none());
        assert_eq!(cfg.upstream_timeout, Duration::from_secs(30));
    }

    #[test]
    fn workspace_placeholder_is_treated_as_unset() {
        let cfg = config(&[("WORKSPACE_ID", "<workspace-id>")]).unwrap();
        assert_eq!(cfg.workspace_id, None);
        let cfg = config(&[("WORKSPACE_ID", "abc-123")]).unwrap();
        assert_eq!(cfg.workspace_id.as_deref(), Some("abc-123"));
    }

    #[test]
    fn apikey_takes_precedence_over_username_password() {
        let cfg = config(&[
            ("TONE_ANALYZER_APIKEY", "k-1"),
            ("TONE_ANALYZER_USERNAME", "u"),
            ("TONE_ANALYZER_PASSWORD", "p"),
            ("ASSISTANT_USERNAME", "au"),
            ("ASSISTANT_PASSWORD", "ap"),
        ])
        .unwrap();
        let tone = cfg.tone_analyzer.credentials.unwrap();
        assert_eq!(tone.username, "apikey");
        assert_eq!(tone.password, "k-1");
        let assistant = cfg.assistant.credentials.unwrap();
        assert_eq!(assistant.username, "au");
    }

    #[test]
    fn half_configured_credentials_are_rejected() {
        let err = config(&[("ASSISTANT_USERNAME", "au")]).unwrap_err();
        assert_eq!(err, ConfigError::IncompleteCredentials { service: "ASSISTANT" });
    }

    #[test]
    fn chat_log_requires_basic_auth_credentials() {
        let err = config(&[("CHAT_LOG", "memory")]).unwrap_err();
        assert_eq!(err, ConfigError::MissingLogCredentials);

        let cfg = config(&[("CHAT_LOG", "memory"), ("LOG_USER", "a"), ("LOG_PASS", "b")]).unwrap();
        assert_eq!(cfg.chat_log, ChatLogBackend::Memory);
        assert_eq!(cfg.log_credentials, Some(BasicCredentials::new("a", "b")));
    }

    #[test]
    fn database_url_implies_postgres_chat_log() {
        let cfg = config(&[
            ("DATABASE_URL", "postgres://localhost/chat"),
            ("LOG_USER", "a"),
            ("LOG_PASS", "b"),
        ])
        .unwrap();
        assert_eq!(
            cfg.chat_log,
            ChatLogBackend::Postgres {
                database_url: "postgres://localhost/chat".to_string()
            }
        );

        let err = config(&[("CHAT_LOG", "postgres")]).unwrap_err();
        assert_eq!(err, ConfigError::MissingDatabaseUrl);
    }

    #[test]
    fn tone_policy_options_are_parsed() {
        let cfg = config(&[
            ("MAINTAIN_TONE_HISTORY", "true"),
            ("TONE_SCORE_THRESHOLD", "0.5"),
        ])
        .unwrap();
        assert!(cfg.tone_policy.maintain_history);
        assert_eq!(cfg.tone_policy.score_threshold, Some(0.5));

        assert!(config(&[("TONE_SCORE_THRESHOLD", "1.5")]).is_err());
        assert!(config(&[("MAINTAIN_TONE_HISTORY", "maybe")]).is_err());
    }

    #[test]
    fn invalid_numbers_and_urls_are_rejected() {
        assert!(matches!(
            config(&[("PORT", "http")]),
            Err(ConfigError::InvalidValue { key: "PORT", .. })
        ));
        assert!(matches!(
            config(&[("ASSISTANT_URL", "ftp://example.com")]),
            Err(ConfigError::InvalidValue { key: "ASSISTANT_URL", .. })
        ));
    }

    #[test]
    fn cors_origins_are_split_and_trimmed() {
        let cfg = config(&[("CORS_ORIGINS", "http://a.test, ,http://b.test ")]).unwrap();
        assert_eq!(cfg.cors_origins, vec!["http://a.test", "http://b.test"]);
    }
}
