//! CLI command implementations

use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::Path;

use crate::auth::{self, SessionStatus, SessionStore};
use crate::cli::{
    format_expiry, info, print_claims, print_identity_table, print_permissions_table,
    success, warn, OutputFormat,
};
use crate::config::{self, loader::CONFIG_FILENAME, Config};
use crate::storage::FileStore;

/// Initialize a new tabsession.toml configuration file
pub fn init() -> Result<()> {
    let config_path = Path::new(CONFIG_FILENAME);

    if config_path.exists() {
        warn(&format!("{} already exists", CONFIG_FILENAME));
        return Ok(());
    }

    fs::write(config_path, config::loader::default_config_content())?;

    success(&format!("Created {}", CONFIG_FILENAME));
    info("Run 'tabsession login <token>' to start a session");

    Ok(())
}

/// Adopt a token as the current session
pub fn login(config_path: Option<&Path>, token: &str) -> Result<()> {
    let (_, mut session) = open_session(config_path)?;

    if session.login(token)? {
        let identity = session
            .identity()
            .ok_or_else(|| anyhow::anyhow!("login accepted but no identity is present"))?;
        success(&format!(
            "Logged in as {} ({})",
            identity.username(),
            identity.role()
        ));
        Ok(())
    } else {
        anyhow::bail!("Token rejected: it could not be decoded")
    }
}

/// Clear the current session
pub fn logout(config_path: Option<&Path>) -> Result<()> {
    let (_, mut session) = open_session(config_path)?;
    let was_authenticated = session.is_authenticated();

    session.logout()?;

    if was_authenticated {
        success("Logged out");
    } else {
        info("No active session");
    }
    Ok(())
}

/// Show the current identity
pub fn whoami(config_path: Option<&Path>, format: OutputFormat) -> Result<()> {
    let (_, session) = open_session(config_path)?;

    let Some(identity) = session.identity() else {
        info("Not logged in");
        return Ok(());
    };

    match format {
        OutputFormat::Table => print_identity_table(identity, session.claims()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(identity)?),
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(identity)?),
    }

    Ok(())
}

/// Show rehydration result and storage details
pub fn status(config_path: Option<&Path>) -> Result<()> {
    let (config, session) = open_session(config_path)?;

    println!("{}", "Session Status".bold().underline());
    println!();
    println!("  {} {}", "Origin:".bold(), config.storage.origin);
    println!("  {} {}", "Store:".bold(), session.store().path().display());
    println!("  {} {}", "Key:".bold(), session.key());

    match session.status() {
        SessionStatus::Authenticated(identity) => {
            println!("  {} {}", "State:".bold(), "authenticated".green());
            println!("  {} {}", "User:".bold(), identity.username());
            println!("  {} {}", "Role:".bold(), identity.role());
            if let Some(claims) = session.claims() {
                println!("  {} {}", "Expires:".bold(), format_expiry(claims));
            }
        }
        SessionStatus::Anonymous => {
            println!("  {} {}", "State:".bold(), "anonymous".yellow());
        }
        SessionStatus::Rehydrating => {
            println!("  {} {}", "State:".bold(), "rehydrating".red());
        }
    }

    Ok(())
}

/// Decode a token without touching the stored session
pub fn decode(token: &str, format: OutputFormat) -> Result<()> {
    let claims = auth::decode(token).context("Failed to decode token")?;

    match format {
        OutputFormat::Table => print_claims(&claims),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&claims)?),
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(&claims)?),
    }

    Ok(())
}

/// List the catalog actions the current identity may perform
pub fn permissions(config_path: Option<&Path>) -> Result<()> {
    let (_, session) = open_session(config_path)?;

    match session.identity() {
        Some(identity) => print_permissions_table(identity),
        None => info("Not logged in: no catalog actions available"),
    }

    Ok(())
}

fn open_session(config_path: Option<&Path>) -> Result<(Config, SessionStore<FileStore>)> {
    let config = config::load_config_or_default(config_path)?;
    let store = config.open_store()?;
    let mut session = SessionStore::with_options(store, config.session_options());
    session.initialize()?;
    Ok((config, session))
}
