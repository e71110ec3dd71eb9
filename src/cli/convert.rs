use super::{dashboard, ui};
use crate::core::SourceId;
use crate::core::config::AppConfig;
use crate::sync::LiveDataController;
use anyhow::Result;

/// Fetches the exchange rate alone and returns the JPY value of `amount`,
/// or `None` when no rate could be fetched.
pub async fn convert_amount(config: &AppConfig, amount: f64) -> Result<(Option<f64>, String)> {
    let controller = LiveDataController::from_config(config)?;
    controller.set_base_amount(amount).await?;

    let pb = ui::new_spinner("Fetching EUR to JPY rate");
    controller.fetch(SourceId::ExchangeRate).await;
    pb.finish_and_clear();

    let view = controller.view().await;
    controller.shutdown().await;

    let mut out = dashboard::render_conversion(&view);
    if let Some(err) = &view.exchange.last_error {
        out.push_str(&format!(
            "\n{}",
            ui::style_text(&format!("Exchange rate unavailable: {err}"), ui::StyleType::Error)
        ));
    }
    Ok((view.conversion.derived_amount_jpy, out))
}

pub async fn run(config: &AppConfig, amount: f64) -> Result<()> {
    let (_, out) = convert_amount(config, amount).await?;
    println!("{out}");
    Ok(())
}
