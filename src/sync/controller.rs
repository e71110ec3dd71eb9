//! Single owner of the live dashboard state
//!
//! Every mutation goes through [`LiveDataController::fetch`] or
//! [`LiveDataController::set_base_amount`]. Each state change, including the
//! conversion recompute that follows a new rate, happens under one lock
//! acquisition so readers never see a half-updated amount/rate pair.

use crate::core::config::AppConfig;
use crate::core::events::EventDigest;
use crate::core::{
    ConversionState, DataSource, ExchangeRateSnapshot, FetchError, LoadingStates, Settlement,
    SourceClient, SourceId, SourceStatus, WeatherSnapshot,
};
use crate::providers::{AnthropicEventsProvider, ExchangeRateApiProvider, OpenMeteoProvider};
use anyhow::Result;
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub type WeatherClient = Arc<dyn SourceClient<Snapshot = WeatherSnapshot>>;
pub type ExchangeClient = Arc<dyn SourceClient<Snapshot = ExchangeRateSnapshot>>;
pub type EventsClient = Arc<dyn SourceClient<Snapshot = EventDigest>>;

const UPDATE_CHANNEL_CAPACITY: usize = 64;

#[derive(Clone)]
pub struct SourceClients {
    pub weather: WeatherClient,
    pub exchange: ExchangeClient,
    pub events: EventsClient,
}

impl SourceClients {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let providers = &config.providers;
        Ok(SourceClients {
            weather: Arc::new(OpenMeteoProvider::new(
                &providers.weather.base_url,
                config.city.clone(),
            )?),
            exchange: Arc::new(ExchangeRateApiProvider::new(
                &providers.exchange.base_url,
            )?),
            events: Arc::new(AnthropicEventsProvider::new(
                &providers.events,
                &config.city.name,
            )?),
        })
    }
}

/// Everything the dashboard shows. Cloned out of the controller for readers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub weather: DataSource<WeatherSnapshot>,
    pub exchange: DataSource<ExchangeRateSnapshot>,
    pub events: DataSource<EventDigest>,
    pub conversion: ConversionState,
}

pub type DashboardView = AppState;

impl AppState {
    fn new(clients: &SourceClients, base_amount_eur: f64) -> Self {
        AppState {
            weather: DataSource::new(SourceId::Weather, clients.weather.endpoint()),
            exchange: DataSource::new(SourceId::ExchangeRate, clients.exchange.endpoint()),
            events: DataSource::new(SourceId::EventFeed, clients.events.endpoint())
                .with_fallback(EventDigest::fallback),
            conversion: ConversionState::new(base_amount_eur),
        }
    }

    fn weather_mut(&mut self) -> &mut DataSource<WeatherSnapshot> {
        &mut self.weather
    }

    fn exchange_mut(&mut self) -> &mut DataSource<ExchangeRateSnapshot> {
        &mut self.exchange
    }

    fn events_mut(&mut self) -> &mut DataSource<EventDigest> {
        &mut self.events
    }

    pub fn status(&self, id: SourceId) -> SourceStatus {
        match id {
            SourceId::Weather => self.weather.status,
            SourceId::ExchangeRate => self.exchange.status,
            SourceId::EventFeed => self.events.status,
        }
    }

    pub fn eur_to_jpy(&self) -> Option<f64> {
        self.exchange.payload.as_ref().map(|rate| rate.eur_to_jpy)
    }

    pub fn loading(&self) -> LoadingStates {
        LoadingStates {
            weather: self.weather.is_loading(),
            exchange: self.exchange.is_loading(),
            events: self.events.is_loading(),
        }
    }

    fn recompute_conversion(&mut self) -> bool {
        let rate = self.eur_to_jpy();
        self.conversion.recompute(rate)
    }
}

/// Change notifications for reactive consumers.
#[derive(Debug, Clone, PartialEq)]
pub enum StateUpdate {
    Loading(SourceId),
    /// The newest fetch for the source finished; the status is never `Loading`.
    Settled(SourceId, SourceStatus),
    /// An older fetch finished while a newer one is still in flight. Its
    /// outcome was applied but the source is still loading.
    Interim(SourceId),
    ConversionChanged(Option<f64>),
}

struct Shared {
    state: AppState,
    closed: bool,
}

struct Inner {
    shared: Mutex<Shared>,
    clients: SourceClients,
    request_timeout: Duration,
    updates: broadcast::Sender<StateUpdate>,
}

#[derive(Clone)]
pub struct LiveDataController {
    inner: Arc<Inner>,
}

impl LiveDataController {
    pub fn new(
        clients: SourceClients,
        base_amount_eur: f64,
        request_timeout: Duration,
    ) -> Result<Self> {
        let base_amount_eur = ConversionState::validate_amount(base_amount_eur)?;
        let state = AppState::new(&clients, base_amount_eur);
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);

        Ok(LiveDataController {
            inner: Arc::new(Inner {
                shared: Mutex::new(Shared {
                    state,
                    closed: false,
                }),
                clients,
                request_timeout,
                updates,
            }),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let clients = SourceClients::from_config(config)?;
        Self::new(clients, config.base_amount_eur, config.request_timeout())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateUpdate> {
        self.inner.updates.subscribe()
    }

    fn notify(&self, update: StateUpdate) {
        // No subscribers is fine.
        let _ = self.inner.updates.send(update);
    }

    /// Fetches one source and applies the outcome. Failures are absorbed into
    /// the source's status; this never returns an error.
    pub async fn fetch(&self, id: SourceId) {
        let clients = &self.inner.clients;
        match id {
            SourceId::Weather => {
                self.run_fetch(clients.weather.as_ref(), AppState::weather_mut)
                    .await
            }
            SourceId::ExchangeRate => {
                self.run_fetch(clients.exchange.as_ref(), AppState::exchange_mut)
                    .await
            }
            SourceId::EventFeed => {
                self.run_fetch(clients.events.as_ref(), AppState::events_mut)
                    .await
            }
        }
    }

    async fn run_fetch<T>(
        &self,
        client: &dyn SourceClient<Snapshot = T>,
        slot: fn(&mut AppState) -> &mut DataSource<T>,
    ) where
        T: Clone + Send + Sync + 'static,
    {
        let id = client.source_id();

        let seq = {
            let mut shared = self.inner.shared.lock().await;
            if shared.closed {
                debug!(source = %id, "Controller shut down, skipping fetch");
                return;
            }
            slot(&mut shared.state).begin_fetch()
        };
        self.notify(StateUpdate::Loading(id));
        debug!(source = %id, seq, "Fetch started");

        let timeout = self.inner.request_timeout;
        let outcome = match tokio::time::timeout(timeout, client.fetch()).await {
            Ok(outcome) => outcome,
            Err(_) => Err(FetchError::Network(format!(
                "Request timed out after {}s",
                timeout.as_secs()
            ))),
        };
        if let Err(err) = &outcome {
            warn!(source = %id, seq, error = %err, "Fetch failed");
        }

        let (settlement, conversion) = {
            let mut shared = self.inner.shared.lock().await;
            if shared.closed {
                debug!(source = %id, seq, "Controller shut down, discarding result");
                return;
            }
            let settlement = slot(&mut shared.state).settle(seq, outcome, Utc::now());
            let conversion_changed = id == SourceId::ExchangeRate
                && matches!(settlement, Settlement::Applied(_))
                && shared.state.recompute_conversion();
            let conversion =
                conversion_changed.then_some(shared.state.conversion.derived_amount_jpy);
            (settlement, conversion)
        };

        match settlement {
            Settlement::Applied(SourceStatus::Loading) => {
                debug!(source = %id, seq, "Fetch settled, newer fetch still outstanding");
                self.notify(StateUpdate::Interim(id));
            }
            Settlement::Applied(status) => {
                debug!(source = %id, seq, %status, "Fetch settled");
                self.notify(StateUpdate::Settled(id, status));
            }
            Settlement::Discarded => {
                debug!(source = %id, seq, "Newer result already applied, discarding");
            }
        }
        if let Some(derived) = conversion {
            self.notify(StateUpdate::ConversionChanged(derived));
        }
    }

    /// Runs [`fetch`](Self::fetch) as its own task.
    pub fn spawn_fetch(&self, id: SourceId) -> JoinHandle<()> {
        let controller = self.clone();
        tokio::spawn(async move { controller.fetch(id).await })
    }

    pub fn spawn_refresh_all(&self) -> Vec<JoinHandle<()>> {
        SourceId::ALL
            .into_iter()
            .map(|id| self.spawn_fetch(id))
            .collect()
    }

    /// Fetches all sources concurrently and waits until each has settled.
    pub async fn refresh_all(&self) {
        join_all(SourceId::ALL.into_iter().map(|id| self.fetch(id))).await;
    }

    /// Stores a new base amount and returns the recomputed JPY value.
    pub async fn set_base_amount(&self, amount_eur: f64) -> Result<Option<f64>> {
        let amount_eur = ConversionState::validate_amount(amount_eur)?;

        let (derived, changed) = {
            let mut shared = self.inner.shared.lock().await;
            if shared.closed {
                debug!("Controller shut down, ignoring amount change");
                return Ok(shared.state.conversion.derived_amount_jpy);
            }
            shared.state.conversion.base_amount_eur = amount_eur;
            let changed = shared.state.recompute_conversion();
            (shared.state.conversion.derived_amount_jpy, changed)
        };

        debug!(amount_eur, ?derived, "Base amount updated");
        if changed {
            self.notify(StateUpdate::ConversionChanged(derived));
        }
        Ok(derived)
    }

    pub async fn view(&self) -> DashboardView {
        self.inner.shared.lock().await.state.clone()
    }

    pub async fn loading(&self) -> LoadingStates {
        self.inner.shared.lock().await.state.loading()
    }

    pub async fn is_shut_down(&self) -> bool {
        self.inner.shared.lock().await.closed
    }

    /// Tears the controller down. Fetches still in flight settle into nothing.
    pub async fn shutdown(&self) {
        let mut shared = self.inner.shared.lock().await;
        if !shared.closed {
            shared.closed = true;
            info!("Live data controller shut down");
        }
    }
}
