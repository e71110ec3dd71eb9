use crate::core::SourceStatus;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    Label,
    Value,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::Label => style(text).bold(),
        StyleType::Value => style(text).green().bold(),
        StyleType::Error => style(text).red(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Formats an `Option<T>` into a `Cell`. `None` is displayed as "N/A".
pub fn format_optional_cell<T>(value: Option<T>, format_fn: impl Fn(T) -> String) -> Cell {
    value.map_or(na_cell(false).set_alignment(CellAlignment::Right), |v| {
        Cell::new(format_fn(v)).set_alignment(CellAlignment::Right)
    })
}

/// Creates a cell for "N/A" values, with error-specific styling.
pub fn na_cell(has_error: bool) -> Cell {
    let color = if has_error {
        Color::Red
    } else {
        Color::DarkGrey
    };
    Cell::new("N/A").fg(color)
}

/// Status cell for a source; `stale` marks an error over a retained snapshot.
pub fn status_cell(status: SourceStatus, stale: bool) -> Cell {
    match status {
        SourceStatus::Idle => Cell::new(status).fg(Color::DarkGrey),
        SourceStatus::Loading => Cell::new(status).fg(Color::Yellow),
        SourceStatus::Ready => Cell::new(status).fg(Color::Green),
        SourceStatus::Error if stale => Cell::new(format!("{status} (stale)"))
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        SourceStatus::Error => Cell::new(status).fg(Color::Red),
    }
}

/// Creates a new `indicatif::ProgressBar` spinner with standard styling.
pub fn new_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}")
    {
        pb.set_style(spinner_style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Prints a separator line matching the terminal width.
pub fn print_separator() {
    let term_width = console::Term::stdout()
        .size_checked()
        .map(|(_, w)| w as usize)
        .unwrap_or(80);
    println!("\n{}", "─".repeat(term_width));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_optional_cell() {
        let cell = format_optional_cell(Some(160.25), |v| format!("{v:.2}"));
        assert_eq!(cell.content(), "160.25");
        let cell = format_optional_cell(None::<f64>, |v| format!("{v:.2}"));
        assert_eq!(cell.content(), "N/A");
    }

    #[test]
    fn test_status_cell_marks_stale_errors() {
        assert_eq!(status_cell(SourceStatus::Error, true).content(), "error (stale)");
        assert_eq!(status_cell(SourceStatus::Error, false).content(), "error");
        assert_eq!(status_cell(SourceStatus::Ready, false).content(), "ready");
    }
}
