use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRateSnapshot {
    pub eur_to_jpy: f64,
    pub jpy_to_eur: f64,
    pub last_update: DateTime<Utc>,
}

impl ExchangeRateSnapshot {
    /// Returns `None` for a rate that cannot be inverted or used for conversion.
    pub fn new(eur_to_jpy: f64, last_update: DateTime<Utc>) -> Option<Self> {
        if !eur_to_jpy.is_finite() || eur_to_jpy <= 0.0 {
            return None;
        }
        Some(Self {
            eur_to_jpy,
            jpy_to_eur: 1.0 / eur_to_jpy,
            last_update,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reciprocal_rate() {
        let snapshot = ExchangeRateSnapshot::new(160.0, Utc::now()).unwrap();
        assert_eq!(snapshot.jpy_to_eur, 0.00625);
    }

    #[test]
    fn test_rejects_unusable_rates() {
        assert!(ExchangeRateSnapshot::new(0.0, Utc::now()).is_none());
        assert!(ExchangeRateSnapshot::new(-3.0, Utc::now()).is_none());
        assert!(ExchangeRateSnapshot::new(f64::INFINITY, Utc::now()).is_none());
    }
}
