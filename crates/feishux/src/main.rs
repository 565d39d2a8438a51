use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use feishu_api::types::{DEFAULT_BASE_URL, DEFAULT_PAGE_SIZE, DEFAULT_USER_ID_TYPE};
use feishu_api::{
    BatchGetRecords, ChatMembersQuery, ClientConfig, Credentials, FeishuClient, ListMessages,
    LogLevel, RequestOption, SearchRecords, SendMessage, SortSpec,
};
use std::process;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{CmdError, Ctx};

/// Standardized exit codes for CLI.
/// 0 = OK, 1 = API or other failure, 2 = input error.
const EXIT_OK: i32 = 0;
const EXIT_OTHER: i32 = 1;
const EXIT_INPUT: i32 = 2;

#[derive(Parser)]
#[command(name = "feishux", version, about = "Feishu CLI — Bitable records and IM")]
struct Cli {
    /// App id of the custom app
    #[arg(long, env = "FEISHU_APP_ID")]
    app_id: Option<String>,

    /// App secret of the custom app
    #[arg(long, env = "FEISHU_APP_SECRET", hide_env_values = true)]
    app_secret: Option<String>,

    /// Open API host
    #[arg(long, env = "FEISHU_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// debug | info | warn | error
    #[arg(long, env = "FEISHU_LOG_LEVEL", default_value = "info")]
    log_level: LogLevel,

    /// Act as this user instead of the app
    #[arg(long, env = "FEISHU_USER_ACCESS_TOKEN", hide_env_values = true)]
    user_token: Option<String>,

    /// Do not fetch a tenant token automatically
    #[arg(long)]
    no_auto_token: bool,

    /// Request timeout in milliseconds
    #[arg(long, default_value_t = 10_000)]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Table {
    /// Bitable app token (bascn...)
    app_token: String,
    /// Table id (tbl...)
    table_id: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a fresh tenant access token
    Token,
    /// Create a record from a JSON object of fields
    Create {
        #[command(flatten)]
        table: Table,
        /// Fields JSON: inline, file path, or - for stdin
        #[arg(default_value = "-")]
        fields: String,
    },
    /// Overwrite fields of a record
    Update {
        #[command(flatten)]
        table: Table,
        record_id: String,
        #[arg(default_value = "-")]
        fields: String,
    },
    /// Delete a record
    Delete {
        #[command(flatten)]
        table: Table,
        record_id: String,
    },
    /// Search records
    Search {
        #[command(flatten)]
        table: Table,
        #[arg(long)]
        view_id: Option<String>,
        /// Field to return (repeatable)
        #[arg(long = "field")]
        fields: Vec<String>,
        /// Sort key as name or name:desc (repeatable)
        #[arg(long = "sort", value_parser = commands::parse_sort)]
        sort: Vec<SortSpec>,
        /// Filter JSON: inline, file path, or -
        #[arg(long)]
        filter: Option<String>,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: u32,
        #[arg(long)]
        page_token: Option<String>,
    },
    /// Create records from a JSON array of field objects
    BatchCreate {
        #[command(flatten)]
        table: Table,
        #[arg(default_value = "-")]
        file: String,
    },
    /// Update records from a JSON array of {record_id, fields}
    BatchUpdate {
        #[command(flatten)]
        table: Table,
        #[arg(default_value = "-")]
        file: String,
    },
    /// Delete records by id
    BatchDelete {
        #[command(flatten)]
        table: Table,
        #[arg(required = true)]
        record_ids: Vec<String>,
    },
    /// Fetch records by id
    BatchGet {
        #[command(flatten)]
        table: Table,
        #[arg(required = true)]
        record_ids: Vec<String>,
        #[arg(long, default_value = DEFAULT_USER_ID_TYPE)]
        user_id_type: String,
        #[arg(long)]
        no_shared_url: bool,
        #[arg(long)]
        no_automatic_fields: bool,
    },
    /// Send a message
    Send {
        receive_id: String,
        /// Text, or JSON content for non-text message types
        content: String,
        #[arg(long, default_value = "text")]
        msg_type: String,
        #[arg(long, default_value = DEFAULT_USER_ID_TYPE)]
        receive_id_type: String,
        /// Deduplication key
        #[arg(long)]
        uuid: Option<String>,
    },
    /// Show chat info
    Chat { chat_id: String },
    /// List chat members
    Members {
        chat_id: String,
        #[arg(long, default_value = DEFAULT_USER_ID_TYPE)]
        member_id_type: String,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: u32,
        #[arg(long)]
        page_token: Option<String>,
    },
    /// List messages in a chat
    Messages {
        container_id: String,
        #[arg(long, default_value = "chat")]
        container_id_type: String,
        /// Unix seconds
        #[arg(long)]
        start_time: Option<String>,
        /// Unix seconds
        #[arg(long)]
        end_time: Option<String>,
        #[arg(long, default_value = "ByCreateTimeAsc")]
        sort_type: String,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: u32,
        #[arg(long)]
        page_token: Option<String>,
    },
}

fn exit_code_for(err: &CmdError) -> i32 {
    match err {
        CmdError::Input(_) => EXIT_INPUT,
        CmdError::Api(_) => EXIT_OTHER,
    }
}

/// `RUST_LOG` wins; otherwise the client's configured level applies.
fn init_tracing(config: &ClientConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::default().add_directive(config.log_level.to_level_filter().into())
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn client_config(cli: &Cli) -> Result<(ClientConfig, RequestOption), CmdError> {
    let option = RequestOption {
        user_access_token: cli.user_token.clone(),
        tenant_access_token: None,
    };
    let (app_id, app_secret) = match (&cli.app_id, &cli.app_secret) {
        (Some(id), Some(secret)) => (id.clone(), secret.clone()),
        _ if option.user_token().is_some() => (String::new(), String::new()),
        _ => {
            return Err(CmdError::Input(
                "missing app credentials: set FEISHU_APP_ID and FEISHU_APP_SECRET or pass --user-token"
                    .into(),
            ))
        }
    };

    let config = ClientConfig {
        base_url: cli.base_url.clone(),
        log_level: cli.log_level,
        auto_refresh_token: !cli.no_auto_token,
        timeout_ms: cli.timeout_ms,
        ..ClientConfig::new(Credentials::new(app_id, app_secret))
    };
    Ok((config, option))
}

fn run(cli: Cli, ctx: Ctx) -> Result<(), CmdError> {
    match cli.command {
        Commands::Token => commands::token(&ctx),
        Commands::Create { table, fields } => {
            commands::create(&ctx, &table.app_token, &table.table_id, &fields)
        }
        Commands::Update { table, record_id, fields } => {
            commands::update(&ctx, &table.app_token, &table.table_id, &record_id, &fields)
        }
        Commands::Delete { table, record_id } => {
            commands::delete(&ctx, &table.app_token, &table.table_id, &record_id)
        }
        Commands::Search {
            table,
            view_id,
            fields,
            sort,
            filter,
            page_size,
            page_token,
        } => {
            let search = SearchRecords {
                view_id,
                field_names: fields,
                sort,
                filter: None,
                page_size,
                page_token,
            };
            commands::search(&ctx, &table.app_token, &table.table_id, search, filter.as_deref())
        }
        Commands::BatchCreate { table, file } => {
            commands::batch_create(&ctx, &table.app_token, &table.table_id, &file)
        }
        Commands::BatchUpdate { table, file } => {
            commands::batch_update(&ctx, &table.app_token, &table.table_id, &file)
        }
        Commands::BatchDelete { table, record_ids } => {
            commands::batch_delete(&ctx, &table.app_token, &table.table_id, &record_ids)
        }
        Commands::BatchGet {
            table,
            record_ids,
            user_id_type,
            no_shared_url,
            no_automatic_fields,
        } => {
            let params = BatchGetRecords {
                user_id_type,
                with_shared_url: !no_shared_url,
                automatic_fields: !no_automatic_fields,
                ..BatchGetRecords::new(record_ids)
            };
            commands::batch_get(&ctx, &table.app_token, &table.table_id, &params)
        }
        Commands::Send {
            receive_id,
            content,
            msg_type,
            receive_id_type,
            uuid,
        } => {
            let message = SendMessage {
                receive_id,
                content,
                msg_type,
                receive_id_type,
                uuid,
            };
            commands::send(&ctx, &message)
        }
        Commands::Chat { chat_id } => commands::chat(&ctx, &chat_id),
        Commands::Members {
            chat_id,
            member_id_type,
            page_size,
            page_token,
        } => {
            let query = ChatMembersQuery {
                member_id_type,
                page_size,
                page_token,
            };
            commands::members(&ctx, &chat_id, &query)
        }
        Commands::Messages {
            container_id,
            container_id_type,
            start_time,
            end_time,
            sort_type,
            page_size,
            page_token,
        } => {
            let params = ListMessages {
                container_id,
                container_id_type,
                start_time,
                end_time,
                sort_type,
                page_size,
                page_token,
            };
            commands::messages(&ctx, &params)
        }
    }
}

fn start(cli: Cli) -> Result<(), CmdError> {
    let (config, option) = client_config(&cli)?;
    init_tracing(&config);
    let client = FeishuClient::new(config)?;
    run(cli, Ctx { client, option })
}

fn main() {
    let code = match start(Cli::parse()) {
        Ok(()) => EXIT_OK,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            exit_code_for(&e)
        }
    };
    process::exit(code);
}
