//! Transport — the boundary with the Feishu open platform.
//!
//! A [`Transport`] turns one [`ApiRequest`] into exactly one [`CallResult`].
//! Everything the platform sends back is decoded here, once; nothing above
//! this layer looks at HTTP status codes or envelope fields.
//!
//! Envelope rules:
//! - `{"code": 0, "data": {...}}` → `Success` with the `data` member
//! - `{"code": 0, ...}` without `data` (auth endpoints) → `Success` with the
//!   remaining top-level fields
//! - `{"code": N, "msg": "..."}` → `Failure`
//! - anything else → `Failure` coded with the HTTP status
//!
//! Network errors are folded into `Failure` with [`TRANSPORT_ERROR_CODE`].

use crate::types::{AccessToken, CallResult};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Failure code for requests that never produced a server response.
pub const TRANSPORT_ERROR_CODE: i64 = -1;

/// Response header carrying the server trace id.
pub const LOG_ID_HEADER: &str = "x-tt-logid";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

/// One open-API call, fully marshaled.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path below the host, starting with `/open-apis/`
    pub path: String,
    pub query: Vec<(&'static str, String)>,
    pub body: Option<Value>,
    pub token: Option<AccessToken>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            token: None,
        }
    }

    pub fn with_query(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.query.push((name, value.into()));
        self
    }

    pub fn with_optional_query(self, name: &'static str, value: Option<&str>) -> Self {
        match value.filter(|v| !v.is_empty()) {
            Some(v) => self.with_query(name, v),
            None => self,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// The external collaborator: performs one blocking round-trip.
pub trait Transport: Send + Sync {
    fn call(&self, request: &ApiRequest) -> CallResult;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn call(&self, request: &ApiRequest) -> CallResult {
        (**self).call(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn call(&self, request: &ApiRequest) -> CallResult {
        (**self).call(request)
    }
}

/// Decode an HTTP response into a `CallResult`.
pub fn decode_response(status: u16, log_id_header: Option<&str>, body: &[u8]) -> CallResult {
    let header_log_id = log_id_header
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let unexpected = |log_id: Option<String>| {
        CallResult::failure(
            i64::from(status),
            format!("unexpected response (HTTP {status})"),
            log_id.unwrap_or_default(),
            Some(body.to_vec()),
        )
    };

    let mut obj = match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(m)) => m,
        _ => return unexpected(header_log_id),
    };
    let Some(code) = obj.get("code").and_then(Value::as_i64) else {
        return unexpected(header_log_id);
    };

    if code == 0 {
        let data = match obj.remove("data") {
            Some(Value::Null) => Value::Object(Map::new()),
            Some(v) => v,
            None => {
                obj.remove("code");
                obj.remove("msg");
                Value::Object(obj)
            }
        };
        return CallResult::success(data);
    }

    let message = obj
        .get("msg")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let log_id = header_log_id
        .or_else(|| {
            obj.get("error")
                .and_then(|e| e.get("log_id"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_default();
    CallResult::failure(code, message, log_id, Some(body.to_vec()))
}

#[cfg(feature = "http")]
pub use http::HttpTransport;

#[cfg(feature = "http")]
mod http {
    use super::{decode_response, ApiRequest, Method, Transport, LOG_ID_HEADER, TRANSPORT_ERROR_CODE};
    use crate::error::{ApiError, Result};
    use crate::types::CallResult;
    use std::time::Duration;

    /// reqwest-backed transport against a real open-API host.
    pub struct HttpTransport {
        base: String,
        http: reqwest::blocking::Client,
    }

    impl HttpTransport {
        pub fn new(base_url: &str, timeout_ms: u64) -> Result<Self> {
            let http = reqwest::blocking::Client::builder()
                .timeout(Duration::from_millis(timeout_ms))
                .build()
                .map_err(|e| ApiError::new(format!("http client: {e}")))?;
            Ok(Self {
                base: base_url.trim_end_matches('/').to_string(),
                http,
            })
        }

        pub fn base_url(&self) -> &str {
            &self.base
        }
    }

    impl Transport for HttpTransport {
        fn call(&self, request: &ApiRequest) -> CallResult {
            let url = format!("{}{}", self.base, request.path);
            let mut req = match request.method {
                Method::Get => self.http.get(&url),
                Method::Post => self.http.post(&url),
                Method::Put => self.http.put(&url),
                Method::Delete => self.http.delete(&url),
            };
            if !request.query.is_empty() {
                req = req.query(&request.query);
            }
            if let Some(token) = &request.token {
                req = req.bearer_auth(token.bearer());
            }
            if let Some(body) = &request.body {
                req = req.json(body);
            }

            tracing::debug!(method = request.method.as_str(), path = %request.path, "open api request");

            let resp = match req.send() {
                Ok(r) => r,
                Err(e) => {
                    return CallResult::failure(
                        TRANSPORT_ERROR_CODE,
                        format!("request failed: {e}"),
                        "",
                        None,
                    )
                }
            };

            let status = resp.status().as_u16();
            let log_id = resp
                .headers()
                .get(LOG_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);

            match resp.bytes() {
                Ok(bytes) => decode_response(status, log_id.as_deref(), &bytes),
                Err(e) => CallResult::failure(
                    TRANSPORT_ERROR_CODE,
                    format!("read response: {e}"),
                    log_id.unwrap_or_default(),
                    None,
                ),
            }
        }
    }
}
