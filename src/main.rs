use clap::Parser;
use framescan::{
    cli::{commands, Cli, Commands},
    config::Settings,
    shutdown::ShutdownSignal,
    Result,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if it exists
    // Silently ignore if file doesn't exist
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,framescan=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer().with_writer(std::io::stderr),
        )
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let mut settings = Settings::from_env()?;

    match cli.command {
        Commands::Search(args) => {
            args.apply(&mut settings)?;
            settings.validate()?;

            if settings.github.has_token() {
                info!("Using GITHUB_TOKEN (hidden)");
            }

            let shutdown = ShutdownSignal::new();
            shutdown.install_ctrl_c_handler();

            commands::search(&settings, shutdown).await?;
        }
        Commands::Queries(args) => {
            args.apply(&mut settings)?;
            settings.validate()?;
            commands::queries(&settings)?;
        }
        Commands::Limits => {
            settings.validate()?;
            commands::limits(&settings).await?;
        }
    }

    Ok(())
}
