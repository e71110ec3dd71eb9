//! Scripted source clients for controller and scheduler tests

use super::controller::SourceClients;
use crate::core::events::EventDigest;
use crate::core::{
    DailyForecast, ExchangeRateSnapshot, FetchError, SourceClient, SourceId, WeatherCategory,
    WeatherSnapshot,
};
use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Step<T> = (Duration, Result<T, FetchError>);

/// Replays queued outcomes in order; the last one consumed repeats forever.
pub struct StubClient<T> {
    id: SourceId,
    queue: Mutex<VecDeque<Step<T>>>,
    last: Mutex<Option<Step<T>>>,
    calls: AtomicUsize,
}

impl<T: Clone> StubClient<T> {
    pub fn new(id: SourceId) -> Self {
        Self {
            id,
            queue: Mutex::new(VecDeque::new()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn push(&self, delay: Duration, outcome: Result<T, FetchError>) {
        self.queue.lock().unwrap().push_back((delay, outcome));
    }

    pub fn replace(&self, delay: Duration, outcome: Result<T, FetchError>) {
        self.queue.lock().unwrap().clear();
        self.push(delay, outcome);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_step(&self) -> Option<Step<T>> {
        let mut last = self.last.lock().unwrap();
        if let Some(step) = self.queue.lock().unwrap().pop_front() {
            *last = Some(step);
        }
        (*last).clone()
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> SourceClient for StubClient<T> {
    type Snapshot = T;

    fn source_id(&self) -> SourceId {
        self.id
    }

    fn endpoint(&self) -> String {
        format!("stub://{}", self.id)
    }

    async fn fetch(&self) -> Result<T, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let Some((delay, outcome)) = self.next_step() else {
            return Err(FetchError::Network("no scripted response".to_string()));
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        outcome
    }
}

pub struct TestClients {
    pub weather: Arc<StubClient<WeatherSnapshot>>,
    pub exchange: Arc<StubClient<ExchangeRateSnapshot>>,
    pub events: Arc<StubClient<EventDigest>>,
}

impl TestClients {
    pub fn new() -> Self {
        Self {
            weather: Arc::new(StubClient::new(SourceId::Weather)),
            exchange: Arc::new(StubClient::new(SourceId::ExchangeRate)),
            events: Arc::new(StubClient::new(SourceId::EventFeed)),
        }
    }

    /// Every source answers immediately and successfully.
    pub fn healthy(eur_to_jpy: f64) -> Self {
        let clients = Self::new();
        clients.weather.push(Duration::ZERO, Ok(sample_weather()));
        clients
            .exchange
            .push(Duration::ZERO, Ok(sample_rate(eur_to_jpy)));
        clients.events.push(Duration::ZERO, Ok(sample_digest()));
        clients
    }

    pub fn source_clients(&self) -> SourceClients {
        SourceClients {
            weather: self.weather.clone(),
            exchange: self.exchange.clone(),
            events: self.events.clone(),
        }
    }
}

pub fn sample_weather() -> WeatherSnapshot {
    let day = |d: u32, code: i32, max: f64, min: f64| DailyForecast {
        date: NaiveDate::from_ymd_opt(2025, 4, d).unwrap(),
        code,
        category: WeatherCategory::from_code(code),
        temp_max_c: max,
        temp_min_c: min,
    };
    WeatherSnapshot {
        current_temp_c: 18.4,
        humidity_pct: 62.0,
        wind_speed_kmh: 11.5,
        current_code: 2,
        current_category: WeatherCategory::Cloudy,
        daily_forecast: vec![
            day(1, 2, 19.1, 10.3),
            day(2, 61, 15.0, 9.8),
            day(3, 0, 21.0, 11.2),
        ],
    }
}

pub fn sample_rate(eur_to_jpy: f64) -> ExchangeRateSnapshot {
    let updated = Utc.timestamp_opt(1_743_465_601, 0).unwrap();
    ExchangeRateSnapshot::new(eur_to_jpy, updated).unwrap()
}

pub fn sample_digest() -> EventDigest {
    EventDigest::new(
        "Sakura Festival, Ueno Park (Apr 1-7).".to_string(),
        Utc.timestamp_opt(1_743_465_601, 0).unwrap(),
    )
}
