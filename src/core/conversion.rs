//! EUR to JPY conversion derived from the latest exchange rate

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Quick-pick amounts offered next to the converter.
pub const PRESET_AMOUNTS_EUR: [f64; 6] = [10.0, 50.0, 100.0, 200.0, 500.0, 1000.0];

pub const DEFAULT_BASE_AMOUNT_EUR: f64 = 100.0;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn is_usable_rate(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}

/// Converts `amount_eur` with `eur_to_jpy`, rounded to 2 decimals.
///
/// Returns `None` when there is no usable rate; a zero or missing rate is never
/// treated as a real one. A product too large to represent is also `None`.
pub fn convert(amount_eur: f64, eur_to_jpy: Option<f64>) -> Option<f64> {
    apply_rate(amount_eur, eur_to_jpy)
}

pub fn convert_back(amount_jpy: f64, jpy_to_eur: Option<f64>) -> Option<f64> {
    apply_rate(amount_jpy, jpy_to_eur)
}

fn apply_rate(amount: f64, rate: Option<f64>) -> Option<f64> {
    rate.filter(|r| is_usable_rate(*r))
        .map(|rate| round2(amount * rate))
        .filter(|value| value.is_finite())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConversionState {
    pub base_amount_eur: f64,
    pub derived_amount_jpy: Option<f64>,
}

impl Default for ConversionState {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_AMOUNT_EUR)
    }
}

impl ConversionState {
    pub fn new(base_amount_eur: f64) -> Self {
        Self {
            base_amount_eur,
            derived_amount_jpy: None,
        }
    }

    pub fn validate_amount(amount_eur: f64) -> Result<f64> {
        if !amount_eur.is_finite() {
            bail!("Amount must be a finite number, got {amount_eur}");
        }
        if amount_eur < 0.0 {
            bail!("Amount must not be negative, got {amount_eur}");
        }
        Ok(amount_eur)
    }

    /// Re-derives the JPY amount; returns true when the derived value changed.
    pub fn recompute(&mut self, eur_to_jpy: Option<f64>) -> bool {
        let derived = convert(self.base_amount_eur, eur_to_jpy);
        let changed = derived != self.derived_amount_jpy;
        self.derived_amount_jpy = derived;
        changed
    }
}
