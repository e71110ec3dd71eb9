//! Core domain types for the live data feeds

pub mod config;
pub mod conversion;
pub mod error;
pub mod events;
pub mod exchange;
pub mod loading;
pub mod log;
pub mod source;
pub mod weather;

// Re-export main types for cleaner imports
pub use conversion::{ConversionState, convert};
pub use error::FetchError;
pub use events::EventDigest;
pub use exchange::ExchangeRateSnapshot;
pub use loading::LoadingStates;
pub use source::{DataSource, Settlement, SourceClient, SourceId, SourceStatus};
pub use weather::{DailyForecast, WeatherCategory, WeatherSnapshot};
