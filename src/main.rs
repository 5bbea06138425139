use anyhow::Result;
use clap::Parser;
use imagine_bot::app::App;
use imagine_bot::models::Config;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "imagine-bot")]
#[command(about = "Telegram bot that generates images from text prompts")]
struct CliArgs {
    /// Load environment variables from this file instead of `.env`.
    #[arg(long, value_name = "PATH")]
    env_file: Option<PathBuf>,

    /// Keep updates queued while the bot was offline instead of dropping them.
    #[arg(long)]
    keep_pending: bool,
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "imagine_bot=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting imagine-bot");

    let args = CliArgs::parse();

    let config = match Config::load(args.env_file.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let app = Arc::new(App::new(&config, !args.keep_pending));

    match app.run(shutdown_signal()).await {
        Ok(_) => {
            info!("Bot stopped, HTTP session closed");
            Ok(())
        }
        Err(e) => {
            error!("Bot terminated: {}", e);
            std::process::exit(1);
        }
    }
}
