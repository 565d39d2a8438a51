use colored::Colorize;
use feishu_api::{
    ApiError, BatchGetRecords, ChatMembersQuery, FeishuClient, Fields, ListMessages,
    RecordUpdate, RequestOption, SearchRecords, SendMessage, SortSpec,
};
use serde_json::Value;
use std::fmt;
use std::fs;
use std::io::{self, Read};

#[derive(Debug)]
pub enum CmdError {
    /// Unreadable or malformed user input
    Input(String),
    Api(ApiError),
}

impl fmt::Display for CmdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CmdError::Input(msg) => write!(f, "{msg}"),
            CmdError::Api(e) => write!(f, "{e}"),
        }
    }
}

impl From<ApiError> for CmdError {
    fn from(e: ApiError) -> Self {
        CmdError::Api(e)
    }
}

pub type CmdResult = Result<(), CmdError>;

/// Everything a command needs: the client and the per-call credential override.
pub struct Ctx {
    pub client: FeishuClient,
    pub option: RequestOption,
}

// ── input helpers ───────────────────────────────────────────────

/// Load JSON from inline text (`{...}` / `[...]`), a file path, or `-` for stdin.
pub fn read_json(source: &str) -> Result<Value, CmdError> {
    let trimmed = source.trim_start();
    let content = if trimmed.starts_with('{') || trimmed.starts_with('[') {
        source.to_string()
    } else if source == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| CmdError::Input(format!("read stdin: {e}")))?;
        buf
    } else {
        fs::read_to_string(source)
            .map_err(|e| CmdError::Input(format!("read {source}: {e}")))?
    };
    serde_json::from_str(&content).map_err(|e| CmdError::Input(format!("parse JSON: {e}")))
}

pub fn read_fields(source: &str) -> Result<Fields, CmdError> {
    match read_json(source)? {
        Value::Object(map) => Ok(map),
        _ => Err(CmdError::Input("parse fields: expected a JSON object".into())),
    }
}

fn read_list<T: serde::de::DeserializeOwned>(source: &str, what: &str) -> Result<Vec<T>, CmdError> {
    serde_json::from_value(read_json(source)?)
        .map_err(|e| CmdError::Input(format!("parse {what}: {e}")))
}

/// `name` or `name:desc` / `name:asc`.
pub fn parse_sort(spec: &str) -> Result<SortSpec, String> {
    let (name, dir) = match spec.rsplit_once(':') {
        Some((name, dir)) => (name, dir),
        None => (spec, "asc"),
    };
    if name.is_empty() {
        return Err(format!("missing field name in sort '{spec}'"));
    }
    let desc = match dir.to_ascii_lowercase().as_str() {
        "asc" => false,
        "desc" => true,
        other => return Err(format!("unknown sort direction '{other}'")),
    };
    Ok(SortSpec {
        field_name: name.to_string(),
        desc,
    })
}

fn print_json(value: &Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

fn done(action: &str, value: &Value) -> CmdResult {
    eprintln!("{} {}", "✓".green().bold(), action.dimmed());
    print_json(value);
    Ok(())
}

// ── token ───────────────────────────────────────────────────────

pub fn token(ctx: &Ctx) -> CmdResult {
    let token = ctx.client.get_tenant_access_token()?;
    println!("{token}");
    Ok(())
}

// ── records ─────────────────────────────────────────────────────

pub fn create(ctx: &Ctx, app_token: &str, table_id: &str, fields: &str) -> CmdResult {
    let fields = read_fields(fields)?;
    let out = ctx.client.create_record(app_token, table_id, &fields, &ctx.option)?;
    done("create_record", &out)
}

pub fn update(ctx: &Ctx, app_token: &str, table_id: &str, record_id: &str, fields: &str) -> CmdResult {
    let fields = read_fields(fields)?;
    let out = ctx
        .client
        .update_record(app_token, table_id, record_id, &fields, &ctx.option)?;
    done("update_record", &out)
}

pub fn delete(ctx: &Ctx, app_token: &str, table_id: &str, record_id: &str) -> CmdResult {
    let out = ctx
        .client
        .delete_record(app_token, table_id, record_id, &ctx.option)?;
    done("delete_record", &out)
}

pub fn search(
    ctx: &Ctx,
    app_token: &str,
    table_id: &str,
    search: SearchRecords,
    filter: Option<&str>,
) -> CmdResult {
    let search = SearchRecords {
        filter: filter.map(read_json).transpose()?,
        ..search
    };
    let out = ctx
        .client
        .search_records(app_token, table_id, &search, &ctx.option)?;
    done("search_records", &out)
}

pub fn batch_create(ctx: &Ctx, app_token: &str, table_id: &str, file: &str) -> CmdResult {
    let records: Vec<Fields> = read_list(file, "records")?;
    let out = ctx
        .client
        .batch_create_records(app_token, table_id, &records, &ctx.option)?;
    done("batch_create_records", &out)
}

pub fn batch_update(ctx: &Ctx, app_token: &str, table_id: &str, file: &str) -> CmdResult {
    let records: Vec<RecordUpdate> = read_list(file, "records")?;
    let out = ctx
        .client
        .batch_update_records(app_token, table_id, &records, &ctx.option)?;
    done("batch_update_records", &out)
}

pub fn batch_delete(ctx: &Ctx, app_token: &str, table_id: &str, record_ids: &[String]) -> CmdResult {
    let out = ctx
        .client
        .batch_delete_records(app_token, table_id, record_ids, &ctx.option)?;
    done("batch_delete_records", &out)
}

pub fn batch_get(ctx: &Ctx, app_token: &str, table_id: &str, params: &BatchGetRecords) -> CmdResult {
    let out = ctx
        .client
        .batch_get_records(app_token, table_id, params, &ctx.option)?;
    done("batch_get_records", &out)
}

// ── messaging ───────────────────────────────────────────────────

pub fn send(ctx: &Ctx, message: &SendMessage) -> CmdResult {
    let out = ctx.client.send_message(message, &ctx.option)?;
    done("send_message", &out)
}

pub fn chat(ctx: &Ctx, chat_id: &str) -> CmdResult {
    let out = ctx.client.get_chat_info(chat_id, &ctx.option)?;
    done("get_chat_info", &out)
}

pub fn members(ctx: &Ctx, chat_id: &str, query: &ChatMembersQuery) -> CmdResult {
    let out = ctx.client.get_chat_members(chat_id, query, &ctx.option)?;
    done("get_chat_members", &out)
}

pub fn messages(ctx: &Ctx, params: &ListMessages) -> CmdResult {
    let out = ctx.client.list_messages(params, &ctx.option)?;
    done("list_messages", &out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_json_is_accepted() {
        let v = read_json(r#" {"a": 1}"#).unwrap();
        assert_eq!(v["a"], 1);
        assert!(read_json("[1,2]").unwrap().is_array());
    }

    #[test]
    fn missing_file_is_input_error() {
        let err = read_json("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, CmdError::Input(ref m) if m.starts_with("read ")));
    }

    #[test]
    fn fields_must_be_an_object() {
        assert!(read_fields(r#"{"名称": "x"}"#).is_ok());
        assert!(matches!(read_fields("[1]"), Err(CmdError::Input(_))));
    }

    #[test]
    fn batch_update_records_parse() {
        let records: Vec<RecordUpdate> =
            read_list(r#"[{"record_id": "rec1", "fields": {"a": 1}}]"#, "records").unwrap();
        assert_eq!(records[0].record_id, "rec1");
        assert!(read_list::<RecordUpdate>(r#"[{"fields": {}}]"#, "records").is_err());
    }

    #[test]
    fn sort_specs() {
        assert_eq!(
            parse_sort("创建时间:desc").unwrap(),
            SortSpec {
                field_name: "创建时间".into(),
                desc: true
            }
        );
        assert!(!parse_sort("name").unwrap().desc);
        assert!(!parse_sort("name:ASC").unwrap().desc);
        assert!(parse_sort("name:sideways").is_err());
        assert!(parse_sort(":desc").is_err());
    }
}
