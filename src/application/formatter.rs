//! Output formatting for links, history and operation failures.
//!
//! Supports a table view and JSON.

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};

use crate::domain::{ErrorInfo, ShortenedLink};

use super::transient::TransientView;

/// Output format options.
#[derive(Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    /// Human-readable table.
    #[default]
    Table,
    /// JSON format for programmatic use.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {s}. Use: table, json")),
        }
    }
}

/// Formats the link history as a table.
pub fn format_history_table(links: &[ShortenedLink]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Slug", "Original URL", "Short URL", "Clicks", "Created At"]);

    for link in links {
        let created = link.created_at.map_or_else(
            || "-".to_string(),
            |dt| dt.format("%Y-%m-%d %H:%M").to_string(),
        );

        table.add_row(vec![
            link.slug.clone(),
            truncate(&link.original_url, 50),
            link.short_url.clone(),
            link.click_count.to_string(),
            created,
        ]);
    }

    table.to_string()
}

/// Formats links as JSON.
///
/// # Errors
/// Returns error if serialization fails.
pub fn format_history_json(links: &[ShortenedLink]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(links)
}

/// Formats a freshly shortened (or renamed) link.
pub fn format_link(link: &ShortenedLink) -> String {
    format!(
        "{}\n  {}",
        "Success! Here is your Shortened URL:".green().bold(),
        link.short_url.cyan().underline()
    )
}

/// Formats an operation failure for inline display.
pub fn format_failure(info: &ErrorInfo) -> String {
    format!("{} {}", "✗".red().bold(), info.message.red())
}

/// One-line status of the transient state.
pub fn format_status(view: &TransientView) -> String {
    let link = view
        .displayed_link
        .as_ref()
        .map_or_else(|| "-".to_string(), |l| l.short_url.clone());
    let copy = if view.copy_confirmed { "Copied!" } else { "Copy" };
    let mut out = format!("link: {link} | [{copy}]");

    if view.dialog_open {
        out.push_str(&format!(" | editing slug: {}", view.editable_slug));
        if let Some(error) = &view.edit_error {
            out.push_str(&format!(" ({error})"));
        }
    }

    out
}

/// Truncates a string to max length with ellipsis.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
