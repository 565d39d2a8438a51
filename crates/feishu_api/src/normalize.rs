//! Response normalization — the single place where a `CallResult` becomes
//! either the endpoint payload or an `ApiError`.
//!
//! Failure diagnostics embed the raw server body, pretty-printed when it is
//! JSON, so the platform's own error detail ends up in the log line:
//!
//! ```text
//! create_record failed, code: 1254045, msg: FieldNameNotFound, log_id: 2024...
//! Raw Resp: {
//!     "code": 1254045,
//!     "msg": "FieldNameNotFound"
//! }
//! ```
//!
//! The tenant-token call goes through [`normalize_token`] instead, whose
//! diagnostic carries the message only.

use crate::error::{ApiError, Result};
use crate::types::CallResult;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::Value;

/// Return the success payload, or log and return the failure diagnostic.
pub fn normalize(result: &CallResult, action_name: &str) -> Result<Value> {
    match result {
        CallResult::Success { data } => Ok(data.clone()),
        CallResult::Failure {
            code,
            message,
            log_id,
            raw_body,
        } => {
            let body = render_raw_body(raw_body.as_deref());
            let diagnostic = format!(
                "{action_name} failed, code: {code}, msg: {message}, log_id: {log_id}\n\
                 Raw Resp: {body}"
            );
            tracing::error!("{diagnostic}");
            Err(ApiError::new(diagnostic))
        }
    }
}

/// Token acquired from the internal tenant-token endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantToken {
    pub token: String,
    /// Lifetime in seconds as reported by the platform (0 if absent)
    pub expire_secs: u64,
}

/// Normalize the tenant-token response.
///
/// Auth failures are not guaranteed to carry the structured error body the
/// other endpoints return, so the diagnostic holds the message only.
pub fn normalize_token(result: &CallResult) -> Result<TenantToken> {
    match result {
        CallResult::Failure { message, .. } => Err(ApiError::new(format!(
            "Failed to get tenant token: {message}"
        ))),
        CallResult::Success { data } => {
            let token = data
                .get("tenant_access_token")
                .and_then(Value::as_str)
                .filter(|t| !t.is_empty())
                .ok_or_else(|| {
                    ApiError::new(
                        "Failed to get tenant token: response carried no tenant_access_token",
                    )
                })?;
            let expire_secs = data.get("expire").and_then(Value::as_u64).unwrap_or(0);
            Ok(TenantToken {
                token: token.to_string(),
                expire_secs,
            })
        }
    }
}

/// Render a raw response body for a diagnostic: 4-space pretty JSON when it
/// parses, the decoded text otherwise, empty when there is no body.
pub fn render_raw_body(raw: Option<&[u8]>) -> String {
    let Some(bytes) = raw else {
        return String::new();
    };
    let text = String::from_utf8_lossy(bytes);
    pretty_json(&text).unwrap_or_else(|| text.into_owned())
}

fn pretty_json(text: &str) -> Option<String> {
    let value: Value = serde_json::from_str(text).ok()?;
    let mut out = Vec::with_capacity(text.len() * 2);
    let mut ser = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut ser).ok()?;
    String::from_utf8(out).ok()
}
