mod api;
mod gateway;

use clap::{Parser, Subcommand};
use std::sync::Arc;
use vigia_agent::HttpAgent;
use vigia_channels::telegram::TelegramChannel;
use vigia_core::{
    config,
    traits::{Channel, FolderBrowser, ProcessingAgent},
};
use vigia_memory::Store;
use vigia_storage::DriveBrowser;

#[derive(Parser)]
#[command(
    name = "vigia",
    version,
    about = "Vigía — folder-watching automation agent with chat confirmation"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the agent.
    Start,
    /// Check configuration and collaborator availability.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli.config)?;

    // The appender guard must outlive the run or file logging goes dark.
    let _log_guard = init_tracing(&cfg);

    match cli.command {
        Commands::Start => {
            let tg = cfg.channel.telegram.clone().ok_or_else(|| {
                anyhow::anyhow!(
                    "No channel configured. Add a [channel.telegram] section to config.toml."
                )
            })?;
            if !tg.enabled {
                anyhow::bail!("Telegram channel is disabled. Set channel.telegram.enabled = true.");
            }
            if tg.bot_token.is_empty() {
                anyhow::bail!("Telegram is enabled but bot_token is empty.");
            }
            let channel: Arc<dyn Channel> = Arc::new(TelegramChannel::new(tg));

            let browser: Arc<dyn FolderBrowser> = Arc::new(DriveBrowser::from_config(&cfg.storage));
            if !browser.is_available().await {
                anyhow::bail!(
                    "storage backend '{}' is not configured. Set storage.access_token.",
                    browser.name()
                );
            }

            let agent: Arc<dyn ProcessingAgent> = Arc::new(HttpAgent::from_config(&cfg.agent));
            if !agent.is_available().await {
                anyhow::bail!(
                    "processing agent '{}' is not configured. Set agent.endpoint.",
                    agent.name()
                );
            }

            let store = Store::new(&cfg.memory).await?;

            println!("{} — starting agent...", cfg.vigia.name);
            let gw = Arc::new(gateway::Gateway::new(channel, browser, agent, store, &cfg));
            gw.run().await?;
        }
        Commands::Status => {
            println!("{} — Status Check\n", cfg.vigia.name);
            println!("Config: {}", cli.config);
            println!();

            match &cfg.channel.telegram {
                Some(tg) => println!(
                    "  telegram: {}",
                    if tg.enabled && !tg.bot_token.is_empty() {
                        "configured"
                    } else if tg.enabled {
                        "enabled but missing bot_token"
                    } else {
                        "disabled"
                    }
                ),
                None => println!("  telegram: not configured"),
            }

            let browser = DriveBrowser::from_config(&cfg.storage);
            println!(
                "  storage: {}",
                if browser.is_available().await {
                    "configured"
                } else {
                    "missing access_token"
                }
            );

            let agent = HttpAgent::from_config(&cfg.agent);
            println!(
                "  agent: {}",
                if agent.is_available().await {
                    "configured"
                } else {
                    "missing endpoint"
                }
            );

            println!(
                "  api: {}",
                if cfg.api.enabled {
                    "enabled"
                } else {
                    "disabled"
                }
            );
            println!("  clients seeded in config: {}", cfg.clients.len());
        }
    }

    Ok(())
}

/// Initialize tracing: stdout, plus daily-rotated files when a log
/// directory is configured.
fn init_tracing(cfg: &config::Config) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cfg.vigia.log_level.clone()));

    if cfg.vigia.log_dir.is_empty() {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        None
    } else {
        let dir = config::shellexpand(&cfg.vigia.log_dir);
        let appender = tracing_appender::rolling::daily(dir, "vigia.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false)
            .init();
        Some(guard)
    }
}
