// ABOUTME: Main entry point for the Bedrock server to Telegram bridge
// ABOUTME: Initializes logging and config, starts the server, notification delivery, and chat relay

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use whosin::config::Config;
use whosin::launch::LaunchSpec;
use whosin::platform::TelegramPlatform;
use whosin::relay::ChatRelay;
use whosin::supervisor::{self, ProcessSupervisor};
use whosin::traits::ChatTransport;
use whosin::{logging, outbox};
use whosin_core::EventDispatcher;

/// How long to keep flushing queued notifications after the server exits
const NOTIFICATION_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// How long the server gets to save and exit after Ctrl-C before it is killed
const SERVER_STOP_GRACE: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(name = "whosin", version, about = "Bedrock server to Telegram bridge")]
struct Cli {
    /// Path to config.toml (defaults to WHOSIN_CONFIG_PATH, ./config.toml, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Do not echo the server console to this terminal
    #[arg(long)]
    no_echo: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::install_panic_hook();
    let cli = Cli::parse();
    let log_dir = logging::init()?;
    tracing::info!(log_dir = %log_dir.display(), "Starting whosin");

    dotenvy::dotenv().ok();

    if let Some(Commands::Init { force }) = cli.command {
        let path = cli.config.unwrap_or_else(|| PathBuf::from("config.toml"));
        Config::write_default(&path, force)?;
        tracing::info!(path = %path.display(), "Config created. Edit it and start whosin again");
        return Ok(());
    }

    let config_path = Config::resolve_path(cli.config.clone());
    if !config_path.exists() {
        Config::write_default(&config_path, false)?;
        tracing::info!(
            path = %config_path.display(),
            "Config not found, created one. Edit it and restart whosin"
        );
        return Ok(());
    }

    let config = Config::load_from(&config_path)?;
    tracing::info!(
        server_path = %config.server.path,
        chatroom_id = %config.telegram.chatroom_id,
        chat_to_server = config.telegram.chat_to_server,
        "Configuration loaded"
    );

    let telegram = Arc::new(TelegramPlatform::new(&config.telegram).await?);
    let transport: Arc<dyn ChatTransport> = telegram.clone();

    // Notifications: dispatcher -> outbox -> single ordered delivery loop
    let (notifications, pending_notifications) = outbox::channel();
    let delivery = tokio::spawn(outbox::deliver(
        pending_notifications,
        Arc::clone(&transport),
        config.telegram.chatroom_id.clone(),
    ));
    let dispatcher = EventDispatcher::new(config.messages.clone(), notifications);

    let launch = LaunchSpec::for_server(&config.server)?;
    let mut server = ProcessSupervisor::new(launch)
        .echo_output(config.server.echo_output && !cli.no_echo)
        .spawn(dispatcher)?;

    supervisor::spawn_operator_input(server.console());

    let relay = ChatRelay::new(
        transport,
        server.console(),
        config.telegram.chatroom_id.clone(),
        config.telegram.chat_to_server,
        config.messages.chat_format.clone(),
    )
    .with_bot_username(telegram.bot_username());
    let relay_task = tokio::spawn(relay.run(telegram.event_stream()));

    let interrupted = tokio::select! {
        status = server.exited() => {
            status?;
            false
        }
        _ = tokio::signal::ctrl_c() => true,
    };

    let exit_code = if interrupted {
        tracing::info!("Interrupted, stopping server");
        server.stop(SERVER_STOP_GRACE).await?;
        130
    } else {
        server.wait().await?.code().unwrap_or(1)
    };

    relay_task.abort();
    if tokio::time::timeout(NOTIFICATION_DRAIN_TIMEOUT, delivery)
        .await
        .is_err()
    {
        tracing::warn!("Timed out delivering remaining notifications");
    }

    tracing::info!(exit_code, "whosin shutting down");
    std::process::exit(exit_code);
}
