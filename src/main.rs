use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tabsession::cli::{self, Cli, Commands};

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tabsession=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Init => cli::commands::init(),
        Commands::Login { token } => cli::commands::login(config, &token),
        Commands::Logout => cli::commands::logout(config),
        Commands::Whoami { format } => cli::commands::whoami(config, format),
        Commands::Status => cli::commands::status(config),
        Commands::Decode { token, format } => cli::commands::decode(&token, format),
        Commands::Permissions => cli::commands::permissions(config),
    };

    // Commands report success themselves; failures are printed once, here
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            cli::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
