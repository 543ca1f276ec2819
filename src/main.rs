use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kayd::cli::{self, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kayd=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => cli::commands::init().await,
        Commands::Login { phone, password } => cli::commands::login(phone, password).await,
        Commands::Register { username, phone } => cli::commands::register(username, phone).await,
        Commands::Logout => cli::commands::logout().await,
        Commands::Whoami { format } => cli::commands::whoami(format).await,
        Commands::Home => cli::commands::home().await,
        Commands::Books { search, format } => cli::commands::books(search, format).await,
        Commands::Book { id, format } => cli::commands::book(&id, format).await,
        Commands::Authors { search, format } => cli::commands::authors(search, format).await,
        Commands::Author { id, format } => cli::commands::author(&id, format).await,
        Commands::Reading { action } => cli::commands::reading(action).await,
        Commands::Profile { action } => cli::commands::profile(action).await,
    }
}
