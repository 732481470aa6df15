use crate::config::{Config, config_file_path};
use crate::credentials::{CredentialStore, prompt_and_save_token};
use crate::errors::AppError;
use crate::history_manager::{HistoryManager, parse_since};
use crate::models::Platform;
use crate::runtime::resolve_channel;
use crate::state::StateManager;
use crate::storage::{EventQuery, open_shared};
use crate::youtube::YouTubeClient;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Stream Notifier - Desktop notifications for new YouTube uploads and Twitch streams
#[derive(Parser)]
#[command(name = "stream-notifier")]
#[command(version)]
#[command(about = "Polls YouTube channels and Twitch streamers and notifies on new content", long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Logging level (overrides the configuration file)
    #[arg(short, long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Start watching the configured channels
    Start,

    /// Print the channel ID for a YouTube channel page
    Resolve {
        /// Channel page URL (e.g. "https://www.youtube.com/@LinusTechTips")
        #[arg(value_name = "URL")]
        url: String,
    },

    /// View received event history
    History(HistoryArgs),

    /// Show the last seen content for every watched channel
    State,

    /// Forget the last seen content so the next poll starts fresh
    Reset(ResetArgs),

    /// Store a Twitch access token
    Login,

    /// Delete the stored Twitch access token
    Logout,

    /// Show application info
    Info,
}

#[derive(Args, Clone)]
pub struct HistoryArgs {
    /// Filter by platform ("youtube" or "twitch")
    #[arg(short, long)]
    pub platform: Option<String>,

    /// Filter by channel ID or Twitch login
    #[arg(short, long)]
    pub target: Option<String>,

    /// Show events received since this time (e.g. "2024-01-01" or RFC 3339)
    #[arg(long)]
    pub since: Option<String>,

    /// Limit the number of events to show
    #[arg(short, long, default_value = "50")]
    pub limit: usize,

    /// Show detailed information for each event
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Args, Clone)]
pub struct ResetArgs {
    /// State keys to delete (e.g. "video_UC..." or "live_name")
    #[arg(value_name = "KEY")]
    pub keys: Vec<String>,

    /// Delete every state row
    #[arg(short, long)]
    pub all: bool,
}

/// `start` 以外のサブコマンドを実行する
pub async fn handle_command(command: Commands, config: &Config) -> Result<(), AppError> {
    match command {
        Commands::Start => {
            return Err(AppError::Generic {
                message: "The start command is handled by the service runtime".to_string(),
            });
        }
        Commands::Resolve { url } => handle_resolve_command(&url, config).await?,
        Commands::History(args) => handle_history_command(args, config)?,
        Commands::State => handle_state_command(config)?,
        Commands::Reset(args) => handle_reset_command(args, config)?,
        Commands::Login => {
            prompt_and_save_token(&CredentialStore::new())?;
            println!("Twitch token saved.");
        }
        Commands::Logout => {
            CredentialStore::new().delete_token()?;
            println!("Twitch token deleted.");
        }
        Commands::Info => handle_info_command(config)?,
    }

    Ok(())
}

async fn handle_resolve_command(url: &str, config: &Config) -> Result<(), AppError> {
    let client = YouTubeClient::new(config.youtube.clone())?;
    let channel_id = resolve_channel(&client, url).await?;
    println!("{}", channel_id);
    Ok(())
}

fn handle_history_command(args: HistoryArgs, config: &Config) -> Result<(), AppError> {
    let platform = match args.platform.as_deref() {
        Some(value) => Some(
            Platform::parse(value)
                .ok_or_else(|| AppError::Generic {
                    message: format!("Unknown platform: {}", value),
                })?
                .as_str()
                .to_string(),
        ),
        None => None,
    };
    let since = args
        .since
        .as_deref()
        .map(parse_since)
        .transpose()
        .map_err(|message| AppError::Generic { message })?;

    let history = HistoryManager::from_shared(open_shared(&config.database_path())?);
    let events = history.recent(&EventQuery {
        platform,
        target: args.target,
        since,
        limit: Some(args.limit),
    })?;

    if events.is_empty() {
        println!("No events found.");
        return Ok(());
    }

    for event in events {
        if args.verbose {
            println!("ID: {}", event.content_id);
            println!("Kind: {}", event.kind);
            println!("Platform: {}", event.platform);
            println!("Target: {}", event.target);
            println!("Title: {}", event.title);
            println!("URL: {}", event.url);
            println!("Received: {}", event.received_at);
            println!("---");
        } else {
            println!(
                "[{}] {} - {} ({})",
                event.platform, event.target, event.title, event.received_at
            );
        }
    }

    Ok(())
}

fn handle_state_command(config: &Config) -> Result<(), AppError> {
    let state = StateManager::new(&config.database_path())?;
    let rows = state.list()?;

    if rows.is_empty() {
        println!("No channels have been watched yet.");
        return Ok(());
    }

    for row in rows {
        println!(
            "{}\t{}\t{}",
            row.key,
            row.latest.as_deref().unwrap_or("-"),
            row.updated_at
        );
    }
    Ok(())
}

fn handle_reset_command(args: ResetArgs, config: &Config) -> Result<(), AppError> {
    let state = StateManager::new(&config.database_path())?;

    if args.all {
        let count = state.clear()?;
        println!("Deleted {} state rows.", count);
    } else if !args.keys.is_empty() {
        for key in &args.keys {
            if state.remove(key)? {
                println!("Deleted {}", key);
            } else {
                println!("No state for {}", key);
            }
        }
    } else {
        return Err(AppError::Generic {
            message: "Please specify state keys or use --all.".to_string(),
        });
    }

    Ok(())
}

fn handle_info_command(config: &Config) -> Result<(), AppError> {
    let db_path = config.database_path();
    let storage = open_shared(&db_path)?;
    let history = HistoryManager::from_shared(storage.clone());
    let state = StateManager::from_shared(storage);

    println!("Stream Notifier - Application Information");
    println!("=========================================");
    println!("Config file: {}", config_file_path().display());
    println!("Database: {}", db_path.display());
    println!("Poll interval: {} ms", config.polling.interval_ms);
    println!("YouTube channels: {}", config.youtube.channels.len());
    println!("Twitch channels: {}", config.twitch.channels.len());
    println!("Tracked channels: {}", state.list()?.len());
    println!("Recorded events: {}", history.count()?);

    Ok(())
}
