use super::ui::{self, StyleType};
use crate::core::conversion::{PRESET_AMOUNTS_EUR, convert};
use crate::core::DataSource;
use crate::sync::DashboardView;
use chrono::{DateTime, Utc};
use comfy_table::{Cell, CellAlignment};
use std::fmt::Write;

fn format_time(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}

fn format_jpy(amount: f64) -> String {
    format!("¥{amount:.2}")
}

fn format_eur(amount: f64) -> String {
    format!("€{amount:.2}")
}

fn source_row<T>(source: &DataSource<T>) -> Vec<Cell> {
    vec![
        Cell::new(source.id),
        ui::status_cell(source.status, source.is_stale()),
        ui::format_optional_cell(source.last_fetched_at, format_time),
        source
            .last_error
            .as_ref()
            .map_or(Cell::new(""), |e| Cell::new(e).fg(comfy_table::Color::Red)),
    ]
}

fn sources_table(view: &DashboardView) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Source"),
        ui::header_cell("Status"),
        ui::header_cell("Last Updated"),
        ui::header_cell("Error"),
    ]);
    table.add_row(source_row(&view.weather));
    table.add_row(source_row(&view.exchange));
    table.add_row(source_row(&view.events));
    table.to_string()
}

fn weather_section(view: &DashboardView) -> String {
    let Some(weather) = &view.weather.payload else {
        return ui::style_text(
            "Weather: N/A",
            if view.weather.last_error.is_some() {
                StyleType::Error
            } else {
                StyleType::Subtle
            },
        );
    };

    let mut out = format!(
        "{} {:.1}°C, {} ({}), humidity {:.0}%, wind {:.1} km/h\n",
        ui::style_text("Now:", StyleType::Label),
        weather.current_temp_c,
        weather.description(),
        weather.current_category,
        weather.humidity_pct,
        weather.wind_speed_kmh,
    );

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Date"),
        ui::header_cell("Conditions"),
        ui::header_cell("High"),
        ui::header_cell("Low"),
    ]);
    for day in &weather.daily_forecast {
        table.add_row(vec![
            Cell::new(day.date.format("%a %b %-d")),
            Cell::new(day.category),
            Cell::new(format!("{:.1}°C", day.temp_max_c)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.1}°C", day.temp_min_c)).set_alignment(CellAlignment::Right),
        ]);
    }
    out.push_str(&table.to_string());
    out
}

fn exchange_section(view: &DashboardView) -> String {
    let mut out = String::new();
    match &view.exchange.payload {
        Some(rate) => {
            let _ = writeln!(
                out,
                "{} 1 EUR = {:.2} JPY {}",
                ui::style_text("Rate:", StyleType::Label),
                rate.eur_to_jpy,
                ui::style_text(
                    &format!("(published {})", format_time(rate.last_update)),
                    StyleType::Subtle
                ),
            );
        }
        None => {
            let _ = writeln!(out, "{} N/A", ui::style_text("Rate:", StyleType::Label));
        }
    }

    let conversion = &view.conversion;
    let derived = conversion
        .derived_amount_jpy
        .map_or_else(|| "N/A".to_string(), format_jpy);
    let _ = writeln!(
        out,
        "{} {} = {}",
        ui::style_text("Convert:", StyleType::Label),
        format_eur(conversion.base_amount_eur),
        ui::style_text(&derived, StyleType::Value),
    );

    let rate = view.eur_to_jpy();
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("EUR"), ui::header_cell("JPY")]);
    for amount in PRESET_AMOUNTS_EUR {
        table.add_row(vec![
            Cell::new(format_eur(amount)).set_alignment(CellAlignment::Right),
            ui::format_optional_cell(convert(amount, rate), format_jpy),
        ]);
    }
    out.push_str(&table.to_string());
    out
}

fn events_section(view: &DashboardView) -> String {
    match &view.events.payload {
        Some(digest) if digest.is_fallback => ui::style_text(&digest.text, StyleType::Subtle),
        Some(digest) => digest.text.clone(),
        None => ui::style_text("N/A", StyleType::Subtle),
    }
}

/// Renders the whole dashboard as a printable string.
pub fn render(view: &DashboardView, city: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}\n",
        ui::style_text(&format!("{city} Live Dashboard"), StyleType::Title)
    );
    let _ = writeln!(out, "{}\n", sources_table(view));
    for (title, body) in [
        ("Weather", weather_section(view)),
        ("Exchange Rate", exchange_section(view)),
        ("Events", events_section(view)),
    ] {
        let _ = writeln!(out, "{}", ui::style_text(title, StyleType::Title));
        let _ = writeln!(out, "{body}\n");
    }
    out
}

/// Renders just the converter line and the preset table.
pub fn render_conversion(view: &DashboardView) -> String {
    exchange_section(view)
}
