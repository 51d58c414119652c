use std::io::{self, Write};

use ratchet_config::AppConfig;
use ratchet_core::{Direction, Status};

use crate::connect::redact_url;

/// Print the status box with connection summary and version positions.
pub fn write_status(out: &mut dyn Write, status: &Status, config: &AppConfig) -> io::Result<()> {
    let version = env!("CARGO_PKG_VERSION");

    let database = config
        .database
        .url
        .as_deref()
        .map(redact_url)
        .unwrap_or_else(|| "none".to_string());

    let migrations = match &config.migrations.file {
        Some(path) => {
            let path = path.to_string_lossy().to_string();
            match std::env::var("HOME") {
                Ok(home) if !home.is_empty() => path.replace(&home, "~"),
                _ => path,
            }
        }
        None => "none".to_string(),
    };

    let pending = match status.direction {
        Direction::None => "up to date".to_string(),
        direction => format!("{} {direction}", status.pending),
    };

    // Layout
    let width = 64;
    let label_w = 12;
    let value_w = width - label_w - 4; // 4 for "│ " + " │"

    let title = format!("ratchet v{version}");
    let title_dashes = width - 2 - title.len() - 5; // 2 for ╭╮, 5 for "─── " + " "
    let top = format!("╭─── {title} {}╮", "─".repeat(title_dashes));
    let bottom = format!("╰{}╯", "─".repeat(width - 2));

    let row = |l: &str, r: &str| {
        let r = truncate(r, value_w);
        format!("│ {:<label_w$}{:<value_w$} │", l, r)
    };

    writeln!(out, "{top}")?;
    writeln!(out, "{}", row("Driver", &config.database.driver.to_string()))?;
    writeln!(out, "{}", row("Database", &database))?;
    writeln!(out, "{}", row("Migrations", &migrations))?;
    writeln!(out, "{}", row("", ""))?;
    writeln!(out, "{}", row("Current", &status.current.to_string()))?;
    writeln!(out, "{}", row("Target", &status.target.to_string()))?;
    writeln!(out, "{}", row("Latest", &status.latest.to_string()))?;
    writeln!(out, "{}", row("Pending", &pending))?;
    writeln!(out, "{bottom}")?;
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{kept}…")
}
