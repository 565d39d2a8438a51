//! Instant-messaging operations under `/open-apis/im/v1`.

use crate::client::FeishuClient;
use crate::error::Result;
use crate::transport::{ApiRequest, Method};
use crate::types::{RequestOption, DEFAULT_PAGE_SIZE, DEFAULT_USER_ID_TYPE};
use serde_json::{json, Value};
use urlencoding::encode;

const MESSAGES_PATH: &str = "/open-apis/im/v1/messages";

/// A message to deliver with `send_message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendMessage {
    pub receive_id: String,
    /// Plain text or a JSON content string, depending on `msg_type`
    pub content: String,
    pub msg_type: String,
    /// `open_id`, `user_id`, `union_id`, `email` or `chat_id`
    pub receive_id_type: String,
    /// Deduplication key; the platform drops repeats within an hour
    pub uuid: Option<String>,
}

impl SendMessage {
    pub fn text(receive_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            receive_id: receive_id.into(),
            content: content.into(),
            msg_type: "text".into(),
            receive_id_type: DEFAULT_USER_ID_TYPE.into(),
            uuid: None,
        }
    }

    /// Content as sent on the wire. Bare text for a `text` message is
    /// wrapped as `{"text": ...}`; JSON content passes through.
    pub fn wire_content(&self) -> String {
        if self.msg_type == "text" && !self.content.trim().starts_with('{') {
            json!({ "text": self.content }).to_string()
        } else {
            self.content.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMembersQuery {
    pub member_id_type: String,
    pub page_size: u32,
    pub page_token: Option<String>,
}

impl Default for ChatMembersQuery {
    fn default() -> Self {
        Self {
            member_id_type: DEFAULT_USER_ID_TYPE.into(),
            page_size: DEFAULT_PAGE_SIZE,
            page_token: None,
        }
    }
}

/// Parameters for `list_messages`. Times are unix seconds as strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListMessages {
    pub container_id: String,
    pub container_id_type: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    /// `ByCreateTimeAsc` or `ByCreateTimeDesc`
    pub sort_type: String,
    pub page_size: u32,
    pub page_token: Option<String>,
}

impl ListMessages {
    pub fn in_chat(chat_id: impl Into<String>) -> Self {
        Self {
            container_id: chat_id.into(),
            container_id_type: "chat".into(),
            start_time: None,
            end_time: None,
            sort_type: "ByCreateTimeAsc".into(),
            page_size: DEFAULT_PAGE_SIZE,
            page_token: None,
        }
    }
}

impl FeishuClient {
    pub fn send_message(&self, message: &SendMessage, option: &RequestOption) -> Result<Value> {
        let mut body = json!({
            "receive_id": message.receive_id,
            "msg_type": message.msg_type,
            "content": message.wire_content(),
        });
        if let Some(uuid) = message.uuid.as_deref().filter(|u| !u.is_empty()) {
            body["uuid"] = json!(uuid);
        }
        let request = ApiRequest::new(Method::Post, MESSAGES_PATH)
            .with_query("receive_id_type", message.receive_id_type.as_str())
            .with_body(body);
        self.execute("send_message", request, option)
    }

    pub fn get_chat_info(&self, chat_id: &str, option: &RequestOption) -> Result<Value> {
        let path = format!("/open-apis/im/v1/chats/{}", encode(chat_id));
        self.execute("get_chat_info", ApiRequest::new(Method::Get, path), option)
    }

    pub fn get_chat_members(
        &self,
        chat_id: &str,
        query: &ChatMembersQuery,
        option: &RequestOption,
    ) -> Result<Value> {
        let path = format!("/open-apis/im/v1/chats/{}/members", encode(chat_id));
        let request = ApiRequest::new(Method::Get, path)
            .with_query("member_id_type", query.member_id_type.as_str())
            .with_query("page_size", query.page_size.to_string())
            .with_optional_query("page_token", query.page_token.as_deref());
        self.execute("get_chat_members", request, option)
    }

    pub fn list_messages(&self, params: &ListMessages, option: &RequestOption) -> Result<Value> {
        let request = ApiRequest::new(Method::Get, MESSAGES_PATH)
            .with_query("container_id_type", params.container_id_type.as_str())
            .with_query("container_id", params.container_id.as_str())
            .with_query("sort_type", params.sort_type.as_str())
            .with_query("page_size", params.page_size.to_string())
            .with_optional_query("start_time", params.start_time.as_deref())
            .with_optional_query("end_time", params.end_time.as_deref())
            .with_optional_query("page_token", params.page_token.as_deref());
        self.execute("list_messages", request, option)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::{client, RecordingTransport};
    use crate::types::AccessToken;

    #[test]
    fn plain_text_is_wrapped() {
        let msg = SendMessage::text("ou_1", "你好，这是测试消息");
        let wire: Value = serde_json::from_str(&msg.wire_content()).unwrap();
        assert_eq!(wire, json!({"text": "你好，这是测试消息"}));
    }

    #[test]
    fn json_text_passes_through() {
        let msg = SendMessage::text("ou_1", r#"  {"text":"already wrapped"}"#);
        assert_eq!(msg.wire_content(), r#"  {"text":"already wrapped"}"#);
    }

    #[test]
    fn non_text_content_is_never_wrapped() {
        let msg = SendMessage {
            msg_type: "image".into(),
            content: "img_v2_xxx".into(),
            ..SendMessage::text("ou_1", "")
        };
        assert_eq!(msg.wire_content(), "img_v2_xxx");
    }

    #[test]
    fn send_message_request_shape() {
        let t = RecordingTransport::ok();
        let msg = SendMessage {
            uuid: Some("a0d69e20-1dd1-458b".into()),
            receive_id_type: "chat_id".into(),
            ..SendMessage::text("oc_1", "hello")
        };
        client(&t).send_message(&msg, &RequestOption::default()).unwrap();

        let req = t.last();
        assert_eq!(req.method, Method::Post);
        assert_eq!(req.path, MESSAGES_PATH);
        assert_eq!(req.query, vec![("receive_id_type", "chat_id".to_string())]);
        assert_eq!(
            req.body,
            Some(json!({
                "receive_id": "oc_1",
                "msg_type": "text",
                "content": "{\"text\":\"hello\"}",
                "uuid": "a0d69e20-1dd1-458b",
            }))
        );
    }

    #[test]
    fn send_message_omits_absent_uuid() {
        let t = RecordingTransport::ok();
        client(&t)
            .send_message(&SendMessage::text("ou_1", "hi"), &RequestOption::default())
            .unwrap();
        let body = t.last().body.unwrap();
        assert!(body.get("uuid").is_none());
        assert_eq!(t.last().query_value("receive_id_type"), Some("open_id"));
    }

    #[test]
    fn chat_info_and_members() {
        let t = RecordingTransport::ok();
        let c = client(&t);
        c.get_chat_info("oc_42", &RequestOption::user("u-1")).unwrap();
        let req = t.last();
        assert_eq!(req.method, Method::Get);
        assert_eq!(req.path, "/open-apis/im/v1/chats/oc_42");
        assert_eq!(req.token, Some(AccessToken::User("u-1".into())));

        let query = ChatMembersQuery {
            page_token: Some("next".into()),
            ..Default::default()
        };
        c.get_chat_members("oc_42", &query, &RequestOption::default())
            .unwrap();
        let req = t.last();
        assert_eq!(req.path, "/open-apis/im/v1/chats/oc_42/members");
        assert_eq!(
            req.query,
            vec![
                ("member_id_type", "open_id".to_string()),
                ("page_size", "20".to_string()),
                ("page_token", "next".to_string()),
            ]
        );
    }

    #[test]
    fn list_messages_query() {
        let t = RecordingTransport::ok();
        let params = ListMessages {
            start_time: Some("1700000000".into()),
            sort_type: "ByCreateTimeDesc".into(),
            page_size: 50,
            ..ListMessages::in_chat("oc_7")
        };
        client(&t)
            .list_messages(&params, &RequestOption::default())
            .unwrap();
        let req = t.last();
        assert_eq!(req.path, MESSAGES_PATH);
        assert_eq!(req.body, None);
        assert_eq!(
            req.query,
            vec![
                ("container_id_type", "chat".to_string()),
                ("container_id", "oc_7".to_string()),
                ("sort_type", "ByCreateTimeDesc".to_string()),
                ("page_size", "50".to_string()),
                ("start_time", "1700000000".to_string()),
            ]
        );
    }
}
