//! Bitable record operations.
//!
//! All endpoints live under
//! `/open-apis/bitable/v1/apps/{app_token}/tables/{table_id}/records`.
//! Batch results are returned as the platform sends them; whether a batch
//! applies partially is up to the platform.

use crate::client::FeishuClient;
use crate::error::Result;
use crate::transport::{ApiRequest, Method};
use crate::types::{RequestOption, DEFAULT_PAGE_SIZE, DEFAULT_USER_ID_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use urlencoding::encode;

/// Record field values keyed by field name.
pub type Fields = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field_name: String,
    #[serde(default)]
    pub desc: bool,
}

/// Parameters for `search_records`. Empty optional inputs are not sent.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRecords {
    pub view_id: Option<String>,
    pub field_names: Vec<String>,
    pub sort: Vec<SortSpec>,
    /// Filter object in the platform's `{conjunction, conditions}` shape
    pub filter: Option<Value>,
    pub page_size: u32,
    pub page_token: Option<String>,
}

impl Default for SearchRecords {
    fn default() -> Self {
        Self {
            view_id: None,
            field_names: Vec::new(),
            sort: Vec::new(),
            filter: None,
            page_size: DEFAULT_PAGE_SIZE,
            page_token: None,
        }
    }
}

impl SearchRecords {
    fn body(&self) -> Value {
        let mut body = Map::new();
        if let Some(view_id) = self.view_id.as_deref().filter(|v| !v.is_empty()) {
            body.insert("view_id".into(), json!(view_id));
        }
        if !self.field_names.is_empty() {
            body.insert("field_names".into(), json!(self.field_names));
        }
        if !self.sort.is_empty() {
            body.insert("sort".into(), json!(self.sort));
        }
        if let Some(filter) = self.filter.as_ref().filter(|f| !is_blank(f)) {
            body.insert("filter".into(), filter.clone());
        }
        body.insert("automatic_fields".into(), json!(true));
        Value::Object(body)
    }
}

fn is_blank(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::Object(m) => m.is_empty(),
        _ => false,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordUpdate {
    pub record_id: String,
    pub fields: Fields,
}

/// Parameters for `batch_get_records`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchGetRecords {
    pub record_ids: Vec<String>,
    pub user_id_type: String,
    pub with_shared_url: bool,
    pub automatic_fields: bool,
}

impl BatchGetRecords {
    pub fn new(record_ids: Vec<String>) -> Self {
        Self {
            record_ids,
            user_id_type: DEFAULT_USER_ID_TYPE.into(),
            with_shared_url: true,
            automatic_fields: true,
        }
    }
}

fn records_path(app_token: &str, table_id: &str) -> String {
    format!(
        "/open-apis/bitable/v1/apps/{}/tables/{}/records",
        encode(app_token),
        encode(table_id)
    )
}

fn record_path(app_token: &str, table_id: &str, record_id: &str) -> String {
    format!("{}/{}", records_path(app_token, table_id), encode(record_id))
}

impl FeishuClient {
    pub fn create_record(
        &self,
        app_token: &str,
        table_id: &str,
        fields: &Fields,
        option: &RequestOption,
    ) -> Result<Value> {
        let request = ApiRequest::new(Method::Post, records_path(app_token, table_id))
            .with_body(json!({ "fields": fields }));
        self.execute("create_record", request, option)
    }

    pub fn update_record(
        &self,
        app_token: &str,
        table_id: &str,
        record_id: &str,
        fields: &Fields,
        option: &RequestOption,
    ) -> Result<Value> {
        let request = ApiRequest::new(Method::Put, record_path(app_token, table_id, record_id))
            .with_body(json!({ "fields": fields }));
        self.execute("update_record", request, option)
    }

    pub fn delete_record(
        &self,
        app_token: &str,
        table_id: &str,
        record_id: &str,
        option: &RequestOption,
    ) -> Result<Value> {
        let request = ApiRequest::new(Method::Delete, record_path(app_token, table_id, record_id));
        self.execute("delete_record", request, option)
    }

    pub fn search_records(
        &self,
        app_token: &str,
        table_id: &str,
        search: &SearchRecords,
        option: &RequestOption,
    ) -> Result<Value> {
        let path = format!("{}/search", records_path(app_token, table_id));
        let request = ApiRequest::new(Method::Post, path)
            .with_query("page_size", search.page_size.to_string())
            .with_optional_query("page_token", search.page_token.as_deref())
            .with_body(search.body());
        self.execute("search_records", request, option)
    }

    pub fn batch_create_records(
        &self,
        app_token: &str,
        table_id: &str,
        records: &[Fields],
        option: &RequestOption,
    ) -> Result<Value> {
        let records: Vec<Value> = records.iter().map(|f| json!({ "fields": f })).collect();
        let path = format!("{}/batch_create", records_path(app_token, table_id));
        let request = ApiRequest::new(Method::Post, path).with_body(json!({ "records": records }));
        self.execute("batch_create_records", request, option)
    }

    pub fn batch_update_records(
        &self,
        app_token: &str,
        table_id: &str,
        records: &[RecordUpdate],
        option: &RequestOption,
    ) -> Result<Value> {
        let path = format!("{}/batch_update", records_path(app_token, table_id));
        let request = ApiRequest::new(Method::Post, path).with_body(json!({ "records": records }));
        self.execute("batch_update_records", request, option)
    }

    pub fn batch_delete_records(
        &self,
        app_token: &str,
        table_id: &str,
        record_ids: &[String],
        option: &RequestOption,
    ) -> Result<Value> {
        let path = format!("{}/batch_delete", records_path(app_token, table_id));
        let request =
            ApiRequest::new(Method::Post, path).with_body(json!({ "records": record_ids }));
        self.execute("batch_delete_records", request, option)
    }

    pub fn batch_get_records(
        &self,
        app_token: &str,
        table_id: &str,
        params: &BatchGetRecords,
        option: &RequestOption,
    ) -> Result<Value> {
        let path = format!("{}/batch_get", records_path(app_token, table_id));
        let request = ApiRequest::new(Method::Post, path).with_body(json!({
            "record_ids": params.record_ids,
            "user_id_type": params.user_id_type,
            "with_shared_url": params.with_shared_url,
            "automatic_fields": params.automatic_fields,
        }));
        self.execute("batch_get_records", request, option)
    }
}
