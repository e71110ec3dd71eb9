use super::util::{http_client, read_json};
use crate::core::{ExchangeRateSnapshot, FetchError, SourceClient, SourceId};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

const BASE_CURRENCY: &str = "EUR";
const QUOTE_CURRENCY: &str = "JPY";

// ExchangeRateApiProvider implementation for the exchange rate source
pub struct ExchangeRateApiProvider {
    base_url: String,
    client: reqwest::Client,
}

impl ExchangeRateApiProvider {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(ExchangeRateApiProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: http_client()?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    rates: HashMap<String, f64>,
    /// Unix epoch seconds.
    time_last_updated: i64,
}

fn normalize(data: LatestRatesResponse) -> Result<ExchangeRateSnapshot, FetchError> {
    let rate = *data.rates.get(QUOTE_CURRENCY).ok_or_else(|| {
        FetchError::parse(format!(
            "No {QUOTE_CURRENCY} rate found for base {BASE_CURRENCY}"
        ))
    })?;

    let last_update = Utc
        .timestamp_opt(data.time_last_updated, 0)
        .single()
        .ok_or_else(|| {
            FetchError::parse(format!(
                "Invalid time_last_updated: {}",
                data.time_last_updated
            ))
        })?;

    ExchangeRateSnapshot::new(rate, last_update)
        .ok_or_else(|| FetchError::parse(format!("Unusable {QUOTE_CURRENCY} rate: {rate}")))
}

#[async_trait]
impl SourceClient for ExchangeRateApiProvider {
    type Snapshot = ExchangeRateSnapshot;

    fn source_id(&self) -> SourceId {
        SourceId::ExchangeRate
    }

    fn endpoint(&self) -> String {
        format!("{}/v4/latest/{}", self.base_url, BASE_CURRENCY)
    }

    #[instrument(name = "ExchangeRateFetch", skip(self))]
    async fn fetch(&self) -> Result<ExchangeRateSnapshot, FetchError> {
        let url = self.endpoint();
        debug!("Requesting latest rates from {}", url);

        let response = self.client.get(&url).send().await?;
        let data: LatestRatesResponse =
            read_json(response, &format!("{BASE_CURRENCY} rates")).await?;
        let snapshot = normalize(data)?;
        debug!(rate = snapshot.eur_to_jpy, "Received exchange rate");
        Ok(snapshot)
    }
}
