mod config;
mod render;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use chama_api::{ApiClient, ApiConfig, TokenStore};
use chama_chat::TicketFilter;
use chama_logs::{DateRange, LevelFilter, LogFilterPatch};
use chama_store::{Action, AppState, LogPoller, Route, Store, StoreHooks, effects};
use chama_types::{
    Attachment, LogEntry, Priority, SystemClock, TicketStatus, parse_instant,
};

use crate::config::Config;

/// chama - logs and support chat for the chama lending dashboard
#[derive(Parser, Debug)]
#[command(name = "chama")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (defaults to ~/.config/chama/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Backend base URL, overriding the config file
    #[arg(long, global = true, value_name = "URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List backend logs
    Logs {
        /// Level name or numeric code ("all" shows everything)
        #[arg(long, default_value = "all")]
        level: LevelFilter,

        /// Case-insensitive text in the message or source
        #[arg(long, default_value = "")]
        search: String,

        /// Earliest date, inclusive
        #[arg(long)]
        from: Option<String>,

        /// Latest date, inclusive
        #[arg(long)]
        to: Option<String>,

        /// Keep refreshing and print new entries until interrupted
        #[arg(long)]
        watch: bool,

        /// Print level counts instead of entries
        #[arg(long)]
        stats: bool,
    },

    /// Show one page of a conversation
    Chat {
        conversation: String,

        #[arg(long, default_value = "1")]
        page: u32,

        #[arg(long, default_value = "50")]
        limit: u32,
    },

    /// Send a message to a conversation
    Send {
        conversation: String,
        text: String,

        /// File to describe as an attachment (5 MB limit)
        #[arg(long, value_name = "PATH")]
        attach: Option<PathBuf>,
    },

    /// List support conversations
    Tickets {
        #[arg(long)]
        status: Option<TicketStatus>,

        #[arg(long)]
        priority: Option<Priority>,

        #[arg(long, default_value = "")]
        search: String,

        /// Open a conversation: mark it read and show its messages
        #[arg(long, value_name = "CONVERSATION")]
        open: Option<String>,
    },

    /// Print the unread message count
    Unread,

    /// Store a session token
    Login {
        #[arg(long)]
        token: String,
    },

    /// Forget the stored session token
    Logout,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = run(args).await;

    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

/// Everything a command needs to talk to the backend
struct Session {
    store: Store,
    api: ApiClient,
    clock: SystemClock,
    config: Config,
}

impl Session {
    fn open(config: Config, tokens: TokenStore) -> Result<Self> {
        let clock = match config.utc_offset()? {
            Some(offset) => SystemClock::with_offset(offset),
            None => SystemClock::new(),
        };

        let store = Store::new(AppState::new(tokens.is_logged_in()));
        let hooks = Arc::new(StoreHooks::new(store.clone(), tokens.clone()));
        let api_config = ApiConfig {
            base_url: config.api_base_url.clone(),
            timeout: config.timeout(),
        };
        let api = ApiClient::new(api_config, tokens, hooks)?;

        Ok(Self {
            store,
            api,
            clock,
            config,
        })
    }

    /// Report what the session hooks left behind
    fn report(&self) {
        let state = self.store.snapshot();
        if let Some(alert) = &state.alert {
            eprintln!("! {alert}");
        }
        if state.session.redirect == Some(Route::Login) {
            eprintln!("Session ended. Run `chama login --token <TOKEN>` to sign in again.");
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(url) = args.api_url {
        config.api_base_url = url;
    }

    let session_file = config
        .session_file
        .clone()
        .or_else(TokenStore::default_path)
        .context("Could not determine the session file location")?;
    let tokens = TokenStore::load(session_file);

    let session = Session::open(config, tokens)?;
    let result = run_command(&session, args.command).await;
    session.report();
    result
}

async fn run_command(session: &Session, command: Command) -> Result<()> {
    let Session {
        store, api, clock, ..
    } = session;

    match command {
        Command::Logs {
            level,
            search,
            from,
            to,
            watch,
            stats,
        } => {
            let range = date_range(from.as_deref(), to.as_deref())?;
            store.dispatch(Action::UpdateLogFilter(
                LogFilterPatch::default()
                    .level(level)
                    .search(search)
                    .date_range(range),
            ));

            effects::fetch_logs(store, api).await?;
            if stats {
                print!("{}", render::log_stats(&store.read(|s| s.log_stats(clock))));
                return Ok(());
            }

            let mut printed = HashSet::new();
            print_new_logs(store, &mut printed);
            if watch {
                watch_logs(session, &mut printed).await;
            }
            Ok(())
        }

        Command::Chat {
            conversation,
            page,
            limit,
        } => {
            effects::fetch_messages(store, api, &conversation, page, limit).await?;
            let thread = store.read(|s| s.chat.thread(&conversation, clock));
            if thread.is_empty() {
                println!("No messages in {conversation}.");
            } else {
                print!("{}", render::thread(&thread, clock));
            }
            Ok(())
        }

        Command::Send {
            conversation,
            text,
            attach,
        } => {
            let attachment = attach.as_deref().map(describe_attachment).transpose()?;
            let message =
                effects::send_message(store, api, &conversation, &text, attachment).await?;
            println!(
                "Sent ({}).",
                message.status.unwrap_or_default().as_str()
            );
            Ok(())
        }

        Command::Tickets {
            status,
            priority,
            search,
            open,
        } => {
            let filter = TicketFilter {
                status,
                priority,
                search,
            };
            effects::fetch_tickets(store, api, &filter).await?;

            if let Some(id) = open {
                effects::open_conversation(store, api, &id, 50).await?;
                let thread = store.read(|s| s.chat.thread(&id, clock));
                print!("{}", render::thread(&thread, clock));
                return Ok(());
            }

            store.read(|s| {
                let board = &s.support.data;
                for conversation in board.visible(&filter) {
                    println!("{}", render::ticket_row(conversation, clock));
                }
                println!("{} unread", board.total_unread());
            });
            Ok(())
        }

        Command::Unread => {
            let count = effects::fetch_unread_count(store, api).await?;
            println!("{count}");
            Ok(())
        }

        Command::Login { token } => {
            api.tokens()
                .save(&token)
                .context("Failed to store session token")?;
            println!("Logged in.");
            Ok(())
        }

        Command::Logout => {
            api.tokens()
                .clear()
                .context("Failed to remove session token")?;
            println!("Logged out.");
            Ok(())
        }
    }
}

/// Keep polling until Ctrl-C, printing entries not seen before
async fn watch_logs(session: &Session, printed: &mut HashSet<String>) {
    let Session {
        store, api, config, ..
    } = session;

    store.dispatch(Action::SetAutoRefresh(true));
    let mut poller = LogPoller::new();
    poller.start(store.clone(), api.clone(), config.refresh_interval());

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut ticker = tokio::time::interval(config.refresh_interval());
    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,

            _ = ticker.tick() => {
                // A 401 during refresh ends the session
                if store.read(|s| s.session.redirect.is_some()) {
                    break;
                }
                print_new_logs(store, printed);
            }
        }
    }

    poller.stop();
    store.dispatch(Action::SetAutoRefresh(false));
}

fn print_new_logs(store: &Store, printed: &mut HashSet<String>) {
    let logs = store.read(AppState::filtered_logs);
    for entry in unseen(&logs, printed) {
        println!("{}", render::log_line(entry));
    }
}

/// Entries not printed before; positions shift between refreshes, so match on identity
fn unseen<'a>(logs: &'a [LogEntry], printed: &mut HashSet<String>) -> Vec<&'a LogEntry> {
    logs.iter()
        .filter(|entry| printed.insert(entry.identity()))
        .collect()
}

/// Either bound may be omitted; the open side is unbounded
fn date_range(from: Option<&str>, to: Option<&str>) -> Result<Option<DateRange>> {
    if from.is_none() && to.is_none() {
        return Ok(None);
    }
    let parse = |value: Option<&str>, fallback: DateTime<Utc>| -> Result<DateTime<Utc>> {
        match value {
            Some(s) => parse_instant(s).with_context(|| format!("Unrecognized date '{s}'")),
            None => Ok(fallback),
        }
    };
    let range = DateRange::new(
        parse(from, DateTime::<Utc>::MIN_UTC)?,
        parse(to, DateTime::<Utc>::MAX_UTC)?,
    );
    if range.from > range.to {
        bail!("--from must not be after --to");
    }
    Ok(Some(range))
}

fn describe_attachment(path: &Path) -> Result<Attachment> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Cannot read attachment {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let attachment = Attachment {
        mime_type: mime_type(&name).to_string(),
        name,
        size: metadata.len(),
    };
    if !attachment.within_limit() {
        bail!("{} is larger than the 5 MB attachment limit", attachment.name);
    }
    Ok(attachment)
}

fn mime_type(name: &str) -> &'static str {
    let extension = name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}
