use super::util::{http_client, read_json};
use crate::core::config::CityConfig;
use crate::core::{
    DailyForecast, FetchError, SourceClient, SourceId, WeatherCategory, WeatherSnapshot,
};
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, instrument};

const FORECAST_DAYS: usize = 3;
const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,weather_code,wind_speed_10m";
const DAILY_FIELDS: &str = "weather_code,temperature_2m_max,temperature_2m_min";

pub struct OpenMeteoProvider {
    base_url: String,
    city: CityConfig,
    client: reqwest::Client,
}

impl OpenMeteoProvider {
    pub fn new(base_url: &str, city: CityConfig) -> Result<Self> {
        Ok(OpenMeteoProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            city,
            client: http_client()?,
        })
    }

    fn forecast_url(&self) -> String {
        format!(
            "{}/v1/forecast?latitude={}&longitude={}&current={}&daily={}&timezone={}&forecast_days={}",
            self.base_url,
            self.city.latitude,
            self.city.longitude,
            CURRENT_FIELDS,
            DAILY_FIELDS,
            self.city.timezone,
            FORECAST_DAYS
        )
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentWeather,
    daily: DailyWeather,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    temperature_2m: f64,
    relative_humidity_2m: f64,
    weather_code: i32,
    wind_speed_10m: f64,
}

#[derive(Debug, Deserialize)]
struct DailyWeather {
    time: Vec<String>,
    weather_code: Vec<i32>,
    temperature_2m_max: Vec<f64>,
    temperature_2m_min: Vec<f64>,
}

fn parse_api_date(date_str: &str) -> Result<NaiveDate, FetchError> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .map_err(|e| FetchError::parse(format!("Failed to parse date {date_str}: {e}")))
}

fn normalize(data: ForecastResponse) -> Result<WeatherSnapshot, FetchError> {
    let daily = &data.daily;
    let days = daily
        .time
        .len()
        .min(daily.weather_code.len())
        .min(daily.temperature_2m_max.len())
        .min(daily.temperature_2m_min.len());
    if days < FORECAST_DAYS {
        return Err(FetchError::parse(format!(
            "Expected {FORECAST_DAYS} forecast days, got {days}"
        )));
    }

    let daily_forecast = (0..FORECAST_DAYS)
        .map(|idx| {
            let code = daily.weather_code[idx];
            Ok(DailyForecast {
                date: parse_api_date(&daily.time[idx])?,
                code,
                category: WeatherCategory::from_code(code),
                temp_max_c: daily.temperature_2m_max[idx],
                temp_min_c: daily.temperature_2m_min[idx],
            })
        })
        .collect::<Result<Vec<_>, FetchError>>()?;

    let current = &data.current;
    Ok(WeatherSnapshot {
        current_temp_c: current.temperature_2m,
        humidity_pct: current.relative_humidity_2m,
        wind_speed_kmh: current.wind_speed_10m,
        current_code: current.weather_code,
        current_category: WeatherCategory::from_code(current.weather_code),
        daily_forecast,
    })
}

#[async_trait]
impl SourceClient for OpenMeteoProvider {
    type Snapshot = WeatherSnapshot;

    fn source_id(&self) -> SourceId {
        SourceId::Weather
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/forecast", self.base_url)
    }

    #[instrument(name = "WeatherFetch", skip(self), fields(city = %self.city.name))]
    async fn fetch(&self) -> Result<WeatherSnapshot, FetchError> {
        let url = self.forecast_url();
        debug!("Requesting forecast from {}", url);

        let response = self.client.get(&url).send().await?;
        let data: ForecastResponse = read_json(response, "weather forecast").await?;
        normalize(data)
    }
}
