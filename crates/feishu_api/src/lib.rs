//! Feishu open API — Bitable records and IM behind one client handle.
//!
//! Every operation marshals its parameters into an `ApiRequest`, hands it to
//! a `Transport`, and normalizes the single `CallResult` that comes back.
//!
//! # Architecture
//!
//! ```text
//! FeishuClient::create_record(..) / send_message(..) / ...
//!   │
//!   ▼  token resolution (override or cached tenant token)
//! ApiRequest { method, path, query, body, token }
//!   │
//!   ▼  (IO boundary)
//! Transport::call()  ──►  CallResult::{Success, Failure}
//!   │
//!   ▼
//! normalize()  ──►  payload | ApiError (diagnostic logged once)
//! ```
//!
//! The payload is returned as the platform sent it; interpreting its shape
//! is the caller's job.

pub mod client;
pub mod error;
pub mod im;
pub mod normalize;
pub mod records;
pub mod transport;
pub mod types;

pub use client::FeishuClient;
pub use error::{ApiError, Result};
pub use im::{ChatMembersQuery, ListMessages, SendMessage};
pub use normalize::{normalize, normalize_token, TenantToken};
pub use records::{BatchGetRecords, Fields, RecordUpdate, SearchRecords, SortSpec};
#[cfg(feature = "http")]
pub use transport::HttpTransport;
pub use transport::{ApiRequest, Method, Transport};
pub use types::{AccessToken, CallResult, ClientConfig, Credentials, LogLevel, RequestOption};
