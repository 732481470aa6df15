use clap::Parser;
use stream_notifier::cli::{Cli, Commands, handle_command};
use stream_notifier::config::load_config;
use stream_notifier::logger::setup_logging;
use stream_notifier::runtime::run_service;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load config first to get log level
    let mut config = load_config(cli.config.as_deref()).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {}", e);
        std::process::exit(1);
    });
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    // Keep the guard alive to ensure log messages are flushed
    let _guard = setup_logging(&config);

    if let Err(e) = config.validate() {
        tracing::error!("Invalid configuration: {}", e);
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    let result = match cli.command.unwrap_or(Commands::Start) {
        Commands::Start => {
            tracing::info!("Stream Notifier starting...");
            println!("Watching the configured channels. Press Ctrl+C to stop.");
            run_service(config).await
        }
        command => handle_command(command, &config).await,
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
