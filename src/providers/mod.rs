pub mod anthropic_events;
pub mod exchange_rate_api;
pub mod open_meteo;
pub mod util;

pub use anthropic_events::AnthropicEventsProvider;
pub use exchange_rate_api::ExchangeRateApiProvider;
pub use open_meteo::OpenMeteoProvider;
