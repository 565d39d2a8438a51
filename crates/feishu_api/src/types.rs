use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::level_filters::LevelFilter;

/// App credentials handed to the platform when requesting a tenant token.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    app_id: String,
    app_secret: String,
}

impl Credentials {
    pub fn new(app_id: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_secret: app_secret.into(),
        }
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn app_secret(&self) -> &str {
        &self.app_secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("app_id", &self.app_id)
            .field("app_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

/// Process-wide client settings. Fixed once the client is built.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    #[serde(flatten)]
    pub credentials: Credentials,
    /// Open API host, e.g. `https://open.feishu.cn` or `https://open.larksuite.com`
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Verbosity the host installs its tracing subscriber at; see
    /// [`LogLevel::to_level_filter`].
    #[serde(default)]
    pub log_level: LogLevel,
    /// Fetch and cache the tenant token automatically when a call carries no override.
    #[serde(default = "default_auto_refresh")]
    pub auto_refresh_token: bool,
    /// Per-request timeout in milliseconds
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

pub const DEFAULT_BASE_URL: &str = "https://open.feishu.cn";

/// Page size used by paginated endpoints unless the caller sets one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// User id flavour used for record and member lookups.
pub const DEFAULT_USER_ID_TYPE: &str = "open_id";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}
fn default_auto_refresh() -> bool {
    true
}
fn default_timeout() -> u64 {
    10_000
}

impl ClientConfig {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            base_url: default_base_url(),
            log_level: LogLevel::default(),
            auto_refresh_token: default_auto_refresh(),
            timeout_ms: default_timeout(),
        }
    }
}

/// Per-call credential override.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOption {
    pub user_access_token: Option<String>,
    pub tenant_access_token: Option<String>,
}

impl RequestOption {
    pub fn user(token: impl Into<String>) -> Self {
        Self {
            user_access_token: Some(token.into()),
            ..Default::default()
        }
    }

    pub fn tenant(token: impl Into<String>) -> Self {
        Self {
            tenant_access_token: Some(token.into()),
            ..Default::default()
        }
    }

    pub fn user_token(&self) -> Option<&str> {
        non_empty(self.user_access_token.as_deref())
    }

    pub fn tenant_token(&self) -> Option<&str> {
        non_empty(self.tenant_access_token.as_deref())
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|t| !t.is_empty())
}

/// Bearer credential attached to one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessToken {
    Tenant(String),
    User(String),
}

impl AccessToken {
    pub fn bearer(&self) -> &str {
        match self {
            AccessToken::Tenant(t) | AccessToken::User(t) => t,
        }
    }
}

/// Outcome of one API invocation, decoded once at the transport boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum CallResult {
    Success {
        data: Value,
    },
    Failure {
        code: i64,
        message: String,
        log_id: String,
        raw_body: Option<Vec<u8>>,
    },
}

impl CallResult {
    pub fn success(data: Value) -> Self {
        CallResult::Success { data }
    }

    pub fn failure(
        code: i64,
        message: impl Into<String>,
        log_id: impl Into<String>,
        raw_body: Option<Vec<u8>>,
    ) -> Self {
        CallResult::Failure {
            code,
            message: message.into(),
            log_id: log_id.into(),
            raw_body,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CallResult::Success { .. })
    }
}
