//! Per-source state and the client abstraction every live feed implements

use super::error::FetchError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum SourceId {
    Weather,
    ExchangeRate,
    EventFeed,
}

impl SourceId {
    pub const ALL: [SourceId; 3] = [SourceId::Weather, SourceId::ExchangeRate, SourceId::EventFeed];
}

impl Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                SourceId::Weather => "weather",
                SourceId::ExchangeRate => "exchange",
                SourceId::EventFeed => "events",
            }
        )
    }
}

impl FromStr for SourceId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "weather" | "w" => Ok(SourceId::Weather),
            "exchange" | "rate" | "x" => Ok(SourceId::ExchangeRate),
            "events" | "event" | "e" => Ok(SourceId::EventFeed),
            _ => Err(anyhow::anyhow!("Invalid source: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceStatus {
    Idle,
    Loading,
    Ready,
    Error,
}

impl Display for SourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                SourceStatus::Idle => "idle",
                SourceStatus::Loading => "loading",
                SourceStatus::Ready => "ready",
                SourceStatus::Error => "error",
            }
        )
    }
}

/// What happened to a settled fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Applied(SourceStatus),
    /// A fetch issued later has already been applied; this outcome is dropped.
    Discarded,
}

#[async_trait]
pub trait SourceClient: Send + Sync {
    type Snapshot: Clone + Send + Sync + 'static;

    fn source_id(&self) -> SourceId;

    /// Where the client sends its request, for display and logging.
    fn endpoint(&self) -> String;

    /// Issues one request and normalizes the response. Never touches source state.
    async fn fetch(&self) -> Result<Self::Snapshot, FetchError>;
}

#[derive(Debug, Clone)]
pub struct DataSource<T> {
    pub id: SourceId,
    pub endpoint: String,
    pub status: SourceStatus,
    pub payload: Option<T>,
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub last_error: Option<FetchError>,
    issued_seq: u64,
    applied_seq: u64,
    fallback: Option<fn(DateTime<Utc>) -> T>,
}

impl<T> DataSource<T> {
    pub fn new(id: SourceId, endpoint: impl Into<String>) -> Self {
        Self {
            id,
            endpoint: endpoint.into(),
            status: SourceStatus::Idle,
            payload: None,
            last_fetched_at: None,
            last_error: None,
            issued_seq: 0,
            applied_seq: 0,
            fallback: None,
        }
    }

    /// Payload substituted when a fetch fails and nothing was ever loaded.
    pub fn with_fallback(mut self, fallback: fn(DateTime<Utc>) -> T) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Marks the source as loading and returns the sequence number of the new fetch.
    pub fn begin_fetch(&mut self) -> u64 {
        self.issued_seq += 1;
        self.status = SourceStatus::Loading;
        self.issued_seq
    }

    pub fn is_loading(&self) -> bool {
        self.status == SourceStatus::Loading
    }

    /// Returns true when the source holds data older than its latest attempt.
    pub fn is_stale(&self) -> bool {
        self.status == SourceStatus::Error && self.last_fetched_at.is_some()
    }

    /// Applies the outcome of fetch `seq`.
    ///
    /// Outcomes older than the newest applied one are dropped. A failure never
    /// clears the payload. While a newer fetch is still outstanding the status
    /// stays `Loading` so the flag clears once, when the newest fetch settles.
    pub fn settle(
        &mut self,
        seq: u64,
        outcome: Result<T, FetchError>,
        now: DateTime<Utc>,
    ) -> Settlement {
        if seq <= self.applied_seq {
            return Settlement::Discarded;
        }
        self.applied_seq = seq;

        let settled_status = match outcome {
            Ok(snapshot) => {
                self.payload = Some(snapshot);
                self.last_fetched_at = Some(now);
                self.last_error = None;
                SourceStatus::Ready
            }
            Err(err) => {
                self.last_error = Some(err);
                if self.payload.is_none()
                    && let Some(fallback) = self.fallback
                {
                    self.payload = Some(fallback(now));
                }
                SourceStatus::Error
            }
        };

        self.status = if seq < self.issued_seq {
            SourceStatus::Loading
        } else {
            settled_status
        };
        Settlement::Applied(self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_initial_state() {
        let source = DataSource::<f64>::new(SourceId::ExchangeRate, "http://x");
        assert_eq!(source.status, SourceStatus::Idle);
        assert!(source.payload.is_none());
        assert!(source.last_fetched_at.is_none());
    }

    #[test]
    fn test_success_sequence() {
        let mut source = DataSource::new(SourceId::ExchangeRate, "http://x");
        let seq = source.begin_fetch();
        assert_eq!(source.status, SourceStatus::Loading);

        let result = source.settle(seq, Ok(158.40), at(10));
        assert_eq!(result, Settlement::Applied(SourceStatus::Ready));
        assert_eq!(source.payload, Some(158.40));
        assert_eq!(source.last_fetched_at, Some(at(10)));
    }

    #[test]
    fn test_failure_keeps_payload() {
        let mut source = DataSource::new(SourceId::ExchangeRate, "http://x");
        let seq = source.begin_fetch();
        source.settle(seq, Ok(158.40), at(10));

        let seq = source.begin_fetch();
        let result = source.settle(seq, Err(FetchError::Http { status: 500 }), at(20));

        assert_eq!(result, Settlement::Applied(SourceStatus::Error));
        assert_eq!(source.payload, Some(158.40));
        assert_eq!(source.last_fetched_at, Some(at(10)));
        assert_eq!(source.last_error, Some(FetchError::Http { status: 500 }));
        assert!(source.is_stale());
    }

    #[test]
    fn test_success_clears_last_error() {
        let mut source = DataSource::new(SourceId::Weather, "http://x");
        let seq = source.begin_fetch();
        source.settle(seq, Err(FetchError::Network("down".into())), at(1));
        assert!(source.last_error.is_some());

        let seq = source.begin_fetch();
        source.settle(seq, Ok(1.0), at(2));
        assert!(source.last_error.is_none());
        assert!(!source.is_stale());
    }

    #[test]
    fn test_fallback_only_without_prior_payload() {
        fn fallback(_: DateTime<Utc>) -> String {
            "fallback".to_string()
        }

        let mut source = DataSource::new(SourceId::EventFeed, "http://x").with_fallback(fallback);
        let seq = source.begin_fetch();
        source.settle(seq, Err(FetchError::Network("down".into())), at(1));
        assert_eq!(source.payload.as_deref(), Some("fallback"));
        assert!(source.last_fetched_at.is_none());

        let seq = source.begin_fetch();
        source.settle(seq, Ok("real".to_string()), at(2));
        let seq = source.begin_fetch();
        source.settle(seq, Err(FetchError::Network("down".into())), at(3));
        assert_eq!(source.payload.as_deref(), Some("real"));
    }

    #[test]
    fn test_no_fallback_for_other_sources() {
        let mut source = DataSource::<f64>::new(SourceId::ExchangeRate, "http://x");
        let seq = source.begin_fetch();
        source.settle(seq, Err(FetchError::parse("bad")), at(1));
        assert!(source.payload.is_none());
        assert_eq!(source.status, SourceStatus::Error);
    }

    #[test]
    fn test_stale_settlement_is_discarded() {
        let mut source = DataSource::new(SourceId::ExchangeRate, "http://x");
        let manual = source.begin_fetch();
        let tick = source.begin_fetch();

        assert_eq!(
            source.settle(tick, Ok(160.0), at(2)),
            Settlement::Applied(SourceStatus::Ready)
        );
        assert_eq!(source.settle(manual, Ok(150.0), at(3)), Settlement::Discarded);

        assert_eq!(source.payload, Some(160.0));
        assert_eq!(source.last_fetched_at, Some(at(2)));
        assert_eq!(source.status, SourceStatus::Ready);
    }

    #[test]
    fn test_older_settlement_keeps_loading_until_newest() {
        let mut source = DataSource::new(SourceId::ExchangeRate, "http://x");
        let first = source.begin_fetch();
        let second = source.begin_fetch();

        assert_eq!(
            source.settle(first, Ok(150.0), at(1)),
            Settlement::Applied(SourceStatus::Loading)
        );
        assert_eq!(source.payload, Some(150.0));
        assert!(source.is_loading());

        assert_eq!(
            source.settle(second, Err(FetchError::Http { status: 502 }), at(2)),
            Settlement::Applied(SourceStatus::Error)
        );
        assert_eq!(source.payload, Some(150.0));
    }

    #[test]
    fn test_state_queries_need_no_clone() {
        #[derive(Debug, PartialEq)]
        struct Opaque(u8);

        let mut source = DataSource::<Opaque>::new(SourceId::Weather, "http://x");
        let seq = source.begin_fetch();
        assert!(source.is_loading());
        source.settle(seq, Ok(Opaque(1)), at(1));
        let seq = source.begin_fetch();
        source.settle(seq, Err(FetchError::Http { status: 500 }), at(2));
        assert!(source.is_stale());
        assert_eq!(source.payload, Some(Opaque(1)));
    }

    #[test]
    fn test_source_id_parsing() {
        assert_eq!("weather".parse::<SourceId>().unwrap(), SourceId::Weather);
        assert_eq!("Exchange".parse::<SourceId>().unwrap(), SourceId::ExchangeRate);
        assert_eq!("e".parse::<SourceId>().unwrap(), SourceId::EventFeed);
        assert!("stocks".parse::<SourceId>().is_err());
    }
}
