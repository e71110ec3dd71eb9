use super::{dashboard, ui};
use crate::core::SourceId;
use crate::core::config::AppConfig;
use crate::sync::{LiveDataController, RefreshScheduler};
use anyhow::{Context, Result, anyhow};
use std::future::Future;
use std::io::BufRead;
use std::str::FromStr;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const HELP: &str = "Commands: r [weather|exchange|events|all] refresh, a <EUR> set amount, q quit";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WatchCommand {
    /// `None` refreshes every source.
    Refresh(Option<SourceId>),
    Amount(f64),
    Quit,
}

impl FromStr for WatchCommand {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let verb = parts.next().ok_or_else(|| anyhow!("Empty command"))?;
        let arg = parts.next();
        if parts.next().is_some() {
            anyhow::bail!("Too many arguments: {s}");
        }

        match (verb.to_lowercase().as_str(), arg) {
            ("r" | "refresh", None | Some("all")) => Ok(WatchCommand::Refresh(None)),
            ("r" | "refresh", Some(source)) => Ok(WatchCommand::Refresh(Some(source.parse()?))),
            ("a" | "amount", Some(amount)) => {
                let amount = amount
                    .parse::<f64>()
                    .with_context(|| format!("Invalid amount: {amount}"))?;
                Ok(WatchCommand::Amount(amount))
            }
            ("a" | "amount", None) => anyhow::bail!("Missing amount"),
            ("q" | "quit", None) => Ok(WatchCommand::Quit),
            _ => anyhow::bail!("Unknown command: {s}"),
        }
    }
}

const INPUT_BUFFER: usize = 16;

/// Reads lines on a dedicated OS thread and forwards them to the returned channel.
///
/// A blocking read cannot be cancelled, so the thread is detached rather than
/// joined; the channel closes at end of input or on a read error.
pub fn spawn_line_reader<R>(reader: R) -> Result<mpsc::Receiver<String>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(INPUT_BUFFER);
    std::thread::Builder::new()
        .name("tripdash-stdin".to_string())
        .spawn(move || {
            for line in reader.lines() {
                match line {
                    Ok(line) => {
                        if tx.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to read command");
                        break;
                    }
                }
            }
        })
        .context("Failed to spawn input reader thread")?;
    Ok(rx)
}

/// Drives the live dashboard until `q`, end of input, or `shutdown` resolves.
///
/// `emit` receives every rendered dashboard and every command error. The
/// scheduler and controller are always torn down before returning.
pub async fn watch_loop<F>(
    scheduler: &RefreshScheduler,
    city: &str,
    mut lines: mpsc::Receiver<String>,
    shutdown: F,
    mut emit: impl FnMut(String),
) -> Result<()>
where
    F: Future<Output = ()>,
{
    let controller = scheduler.controller();
    let mut updates = controller.subscribe();
    tokio::pin!(shutdown);

    scheduler.start().await;
    emit(dashboard::render(&controller.view().await, city));

    let result: Result<()> = loop {
        tokio::select! {
            line = lines.recv() => {
                let Some(line) = line else {
                    debug!("Input closed");
                    break Ok(());
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<WatchCommand>() {
                    Ok(WatchCommand::Quit) => break Ok(()),
                    Ok(WatchCommand::Refresh(Some(id))) => scheduler.trigger_refresh(id).await,
                    Ok(WatchCommand::Refresh(None)) => scheduler.trigger_refresh_all().await,
                    Ok(WatchCommand::Amount(amount)) => {
                        if let Err(e) = controller.set_base_amount(amount).await {
                            emit(ui::style_text(&e.to_string(), ui::StyleType::Error));
                        }
                    }
                    Err(e) => {
                        emit(ui::style_text(&format!("{e}. {HELP}"), ui::StyleType::Error));
                    }
                }
            }
            update = updates.recv() => match update {
                Ok(update) => {
                    debug!(?update, "State update");
                    emit(dashboard::render(&controller.view().await, city));
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Dashboard fell behind on updates");
                    emit(dashboard::render(&controller.view().await, city));
                }
                Err(RecvError::Closed) => break Ok(()),
            },
            _ = &mut shutdown => {
                info!("Interrupted");
                break Ok(());
            }
        }
    };

    scheduler.stop().await;
    controller.shutdown().await;
    result
}

pub async fn run(config: &AppConfig, amount: Option<f64>) -> Result<()> {
    let controller = LiveDataController::from_config(config)?;
    if let Some(amount) = amount {
        controller.set_base_amount(amount).await?;
    }
    let scheduler = RefreshScheduler::new(controller, config.refresh_interval());

    println!("{}", ui::style_text(HELP, ui::StyleType::Subtle));
    let stdin = spawn_line_reader(std::io::BufReader::new(std::io::stdin()))?;
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    watch_loop(&scheduler, &config.city.name, stdin, ctrl_c, |screen| {
        ui::print_separator();
        println!("{screen}");
    })
    .await
}
