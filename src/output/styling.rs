use comfy_table::Color as TableColor;
use console::{style, StyledObject};

use crate::analysis::Severity;

/// Semantic styling palette for terminal output.
///
/// Summary rendering never names raw colors; it picks from these helpers,
/// so the palette lives in one place, severity mapping included.
pub fn heading(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).bright()
}

/// Field labels and de-emphasized trailing detail.
pub fn label(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).dim()
}

/// Job names, file paths, and other identifiers.
pub fn name(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).cyan()
}

/// Counts, durations, and flag spellings the reader should act on.
pub fn emphasis(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).bright().yellow()
}

pub fn ok(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).bright().green()
}

pub fn alert(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).bright().red()
}

/// List marker for bullet lines.
pub fn bullet() -> StyledObject<String> {
    style("•".to_string()).cyan()
}

pub fn banner_title(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).magenta().bold()
}

/// Severity-to-color mapping shared by the summary tables.
pub fn severity_color(severity: Severity) -> TableColor {
    match severity {
        Severity::High => TableColor::Red,
        Severity::Medium => TableColor::Yellow,
        Severity::Low => TableColor::Green,
    }
}
