//! CLI output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use crate::auth::{CatalogAction, Claims, Identity};

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print a warning message
pub fn warn(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

/// Print an info message
pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}

/// Format a Unix expiry for display, flagging past values
pub fn format_expiry(claims: &Claims) -> String {
    match claims.expires_at() {
        Some(at) if claims.is_expired() => {
            format!("{} (expired)", at.format("%Y-%m-%d %H:%M:%S UTC"))
                .red()
                .to_string()
        }
        Some(at) => at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => "-".to_string(),
    }
}

/// Print an identity as a single-row table
pub fn print_identity_table(identity: &Identity, claims: Option<&Claims>) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Username").fg(Color::Cyan),
            Cell::new("Role").fg(Color::Cyan),
            Cell::new("Expires").fg(Color::Cyan),
        ]);

    let expires = claims.map(format_expiry).unwrap_or_else(|| "-".to_string());
    table.add_row(vec![
        Cell::new(identity.username()),
        Cell::new(identity.role()).fg(Color::Green),
        Cell::new(expires),
    ]);

    println!("{table}");
}

/// Print decoded claims
pub fn print_claims(claims: &Claims) {
    println!("{}", "Token Claims".bold().underline());
    println!();
    println!("  {} {}", "Subject:".bold(), claims.sub);
    println!("  {} {}", "Roles:".bold(), claims.roles);
    println!("  {} {}", "Expires:".bold(), format_expiry(claims));
}

/// Print which catalog actions an identity may perform
pub fn print_permissions_table(identity: &Identity) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Action").fg(Color::Cyan),
            Cell::new("Allowed").fg(Color::Cyan),
        ]);

    for action in CatalogAction::ALL {
        let (label, color) = if identity.can(action) {
            ("yes", Color::Green)
        } else {
            ("no", Color::Red)
        };
        table.add_row(vec![Cell::new(action.to_string()), Cell::new(label).fg(color)]);
    }

    println!("{table}");
}
