//! `FeishuClient` — the long-lived handle every operation goes through.
//!
//! Token resolution per call:
//!
//! ```text
//! RequestOption.user_access_token    ──► User(token)
//! RequestOption.tenant_access_token  ──► Tenant(token)
//! cached tenant token (still fresh)  ──► Tenant(token)
//! auto_refresh_token = true          ──► fetch, cache, Tenant(token)
//! otherwise                          ──► ApiError, transport untouched
//! ```
//!
//! The cache lock is held while a refresh is in flight, so concurrent callers
//! wait for that one fetch instead of each requesting their own token.

use crate::error::{ApiError, Result};
use crate::normalize::{normalize, normalize_token, TenantToken};
use crate::transport::{ApiRequest, Method, Transport};
use crate::types::{AccessToken, ClientConfig, RequestOption};
use serde_json::{json, Value};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

pub const TENANT_TOKEN_PATH: &str = "/open-apis/auth/v3/tenant_access_token/internal";

/// Cached tokens are refreshed this long before the platform expires them.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

struct CachedToken {
    token: String,
    refresh_at: Instant,
}

pub struct FeishuClient {
    config: ClientConfig,
    transport: Box<dyn Transport>,
    tenant_token: Mutex<Option<CachedToken>>,
}

impl FeishuClient {
    /// Build a client talking HTTP to `config.base_url`.
    #[cfg(feature = "http")]
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = crate::transport::HttpTransport::new(&config.base_url, config.timeout_ms)?;
        Ok(Self::with_transport(config, transport))
    }

    pub fn with_transport(config: ClientConfig, transport: impl Transport + 'static) -> Self {
        Self {
            config,
            transport: Box::new(transport),
            tenant_token: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Request a fresh tenant access token. Always hits the platform.
    pub fn get_tenant_access_token(&self) -> Result<String> {
        Ok(self.fetch_tenant_token()?.token)
    }

    fn fetch_tenant_token(&self) -> Result<TenantToken> {
        let creds = &self.config.credentials;
        let request = ApiRequest::new(Method::Post, TENANT_TOKEN_PATH).with_body(json!({
            "app_id": creds.app_id(),
            "app_secret": creds.app_secret(),
        }));
        normalize_token(&self.transport.call(&request))
    }

    fn cached_tenant_token(&self) -> Result<String> {
        let mut slot = self
            .tenant_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = slot.as_ref() {
            if Instant::now() < cached.refresh_at {
                return Ok(cached.token.clone());
            }
        }

        let fresh = self.fetch_tenant_token()?;
        let lifetime = Duration::from_secs(fresh.expire_secs).saturating_sub(REFRESH_MARGIN);
        tracing::debug!(expire_secs = fresh.expire_secs, "tenant access token refreshed");
        *slot = Some(CachedToken {
            token: fresh.token.clone(),
            refresh_at: Instant::now() + lifetime,
        });
        Ok(fresh.token)
    }

    fn resolve_token(&self, action: &str, option: &RequestOption) -> Result<AccessToken> {
        if let Some(token) = option.user_token() {
            return Ok(AccessToken::User(token.to_string()));
        }
        if let Some(token) = option.tenant_token() {
            return Ok(AccessToken::Tenant(token.to_string()));
        }
        if !self.config.auto_refresh_token {
            return Err(ApiError::new(format!(
                "{action} failed: no access token available and automatic token refresh is disabled"
            )));
        }
        self.cached_tenant_token().map(AccessToken::Tenant)
    }

    /// Attach credentials, perform the call, normalize the outcome.
    pub(crate) fn execute(
        &self,
        action: &str,
        mut request: ApiRequest,
        option: &RequestOption,
    ) -> Result<Value> {
        request.token = Some(self.resolve_token(action, option)?);
        let result = self.transport.call(&request);
        normalize(&result, action)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::types::CallResult;

    fn ping(client: &FeishuClient, option: &RequestOption) -> Result<Value> {
        client.execute("ping", ApiRequest::new(Method::Get, "/open-apis/ping"), option)
    }

    #[test]
    fn token_call_sends_credentials_without_bearer() {
        let t = RecordingTransport::ok();
        let token = client(&t).get_tenant_access_token().unwrap();
        assert_eq!(token, "t-test");

        let req = &t.requests()[0];
        assert_eq!(req.method, Method::Post);
        assert_eq!(req.path, TENANT_TOKEN_PATH);
        assert_eq!(req.token, None);
        assert_eq!(
            req.body,
            Some(json!({"app_id": "cli_test", "app_secret": "secret_test"}))
        );
    }

    #[test]
    fn token_failure_is_reported_without_body() {
        let t = RecordingTransport::new(|_| {
            CallResult::failure(10014, "invalid app_secret", "lg", Some(b"{\"code\":10014}".to_vec()))
        });
        let err = client(&t).get_tenant_access_token().unwrap_err();
        assert_eq!(err.description, "Failed to get tenant token: invalid app_secret");
    }

    #[test]
    fn tenant_token_is_fetched_once_and_reused() {
        let t = RecordingTransport::ok();
        let c = client(&t);
        ping(&c, &RequestOption::default()).unwrap();
        ping(&c, &RequestOption::default()).unwrap();

        let all = t.requests();
        assert_eq!(all.iter().filter(|r| r.path == TENANT_TOKEN_PATH).count(), 1);
        for req in t.api_requests() {
            assert_eq!(req.token, Some(AccessToken::Tenant("t-test".into())));
        }
    }

    #[test]
    fn concurrent_callers_share_one_refresh() {
        let t = RecordingTransport::new(|req| {
            if req.path == TENANT_TOKEN_PATH {
                std::thread::sleep(Duration::from_millis(50));
                CallResult::success(json!({"tenant_access_token": "t-slow", "expire": 7200}))
            } else {
                CallResult::success(json!({}))
            }
        });
        let c = client(&t);
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| ping(&c, &RequestOption::default()).unwrap());
            }
        });

        assert_eq!(t.requests().iter().filter(|r| r.path == TENANT_TOKEN_PATH).count(), 1);
        assert_eq!(t.api_requests().len(), 4);
        for req in t.api_requests() {
            assert_eq!(req.token, Some(AccessToken::Tenant("t-slow".into())));
        }
    }

    #[test]
    fn short_lived_token_is_refetched() {
        let t = RecordingTransport::new(|req| {
            if req.path == TENANT_TOKEN_PATH {
                CallResult::success(json!({"tenant_access_token": "t-short", "expire": 30}))
            } else {
                CallResult::success(json!({}))
            }
        });
        let c = client(&t);
        ping(&c, &RequestOption::default()).unwrap();
        ping(&c, &RequestOption::default()).unwrap();
        assert_eq!(t.requests().iter().filter(|r| r.path == TENANT_TOKEN_PATH).count(), 2);
    }

    #[test]
    fn user_token_override_skips_tenant_token() {
        let t = RecordingTransport::ok();
        ping(&client(&t), &RequestOption::user("u-123")).unwrap();
        assert_eq!(t.requests().len(), 1);
        assert_eq!(t.last().token, Some(AccessToken::User("u-123".into())));
    }

    #[test]
    fn user_token_wins_over_tenant_override() {
        let t = RecordingTransport::ok();
        let option = RequestOption {
            user_access_token: Some("u-1".into()),
            tenant_access_token: Some("t-1".into()),
        };
        ping(&client(&t), &option).unwrap();
        assert_eq!(t.last().token, Some(AccessToken::User("u-1".into())));
    }

    #[test]
    fn disabled_auto_refresh_requires_a_token() {
        let t = RecordingTransport::ok();
        let mut cfg = config();
        cfg.auto_refresh_token = false;
        let c = FeishuClient::with_transport(cfg, std::sync::Arc::clone(&t));

        let err = ping(&c, &RequestOption::default()).unwrap_err();
        assert_eq!(
            err.description,
            "ping failed: no access token available and automatic token refresh is disabled"
        );
        assert!(t.requests().is_empty());

        ping(&c, &RequestOption::tenant("t-preset")).unwrap();
        assert_eq!(t.last().token, Some(AccessToken::Tenant("t-preset".into())));
    }

    #[test]
    fn token_failure_aborts_the_call() {
        let t = RecordingTransport::new(|req| {
            if req.path == TENANT_TOKEN_PATH {
                CallResult::failure(10003, "invalid app_id", "", None)
            } else {
                CallResult::success(json!({}))
            }
        });
        let err = ping(&client(&t), &RequestOption::default()).unwrap_err();
        assert_eq!(err.description, "Failed to get tenant token: invalid app_id");
        assert!(t.api_requests().is_empty());
    }

    #[test]
    fn api_failure_is_normalized_with_action_name() {
        let t = RecordingTransport::new(|req| {
            if req.path == TENANT_TOKEN_PATH {
                CallResult::success(json!({"tenant_access_token": "t", "expire": 7200}))
            } else {
                CallResult::failure(230001, "invalid param", "lg-9", Some(b"{\"code\":230001}".to_vec()))
            }
        });
        let err = ping(&client(&t), &RequestOption::default()).unwrap_err();
        assert!(err
            .description
            .starts_with("ping failed, code: 230001, msg: invalid param, log_id: lg-9"));
        assert!(err.description.contains("\"code\": 230001"));
    }

    #[test]
    fn client_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FeishuClient>();
    }
}
