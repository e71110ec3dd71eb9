use super::{dashboard, ui};
use crate::core::config::AppConfig;
use crate::sync::{DashboardView, LiveDataController};
use anyhow::Result;
use tracing::info;

/// Refreshes every source once and returns the settled view.
pub async fn fetch_view(config: &AppConfig, amount: Option<f64>) -> Result<DashboardView> {
    let controller = LiveDataController::from_config(config)?;
    if let Some(amount) = amount {
        controller.set_base_amount(amount).await?;
    }

    let pb = ui::new_spinner(&format!("Fetching live data for {}", config.city.name));
    controller.refresh_all().await;
    pb.finish_and_clear();

    let view = controller.view().await;
    controller.shutdown().await;
    Ok(view)
}

pub async fn run(config: &AppConfig, amount: Option<f64>) -> Result<()> {
    let view = fetch_view(config, amount).await?;
    let loading = view.loading();
    info!(all_settled = loading.all_settled(), "Dashboard refreshed");

    print!("{}", dashboard::render(&view, &config.city.name));
    Ok(())
}
