//! Weather snapshot types and weather-code classification

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::ops::RangeInclusive;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeatherCategory {
    Clear,
    Cloudy,
    Rain,
    Snow,
    /// Anything the table does not name (fog, drizzle-free showers, storms, ...)
    Mixed,
}

impl Display for WeatherCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                WeatherCategory::Clear => "Clear",
                WeatherCategory::Cloudy => "Cloudy",
                WeatherCategory::Rain => "Rain",
                WeatherCategory::Snow => "Snow",
                WeatherCategory::Mixed => "Mixed",
            }
        )
    }
}

/// Consulted top to bottom; first matching range wins.
const CATEGORY_TABLE: &[(RangeInclusive<i32>, WeatherCategory)] = &[
    (0..=0, WeatherCategory::Clear),
    (1..=3, WeatherCategory::Cloudy),
    (51..=67, WeatherCategory::Rain),
    (71..=77, WeatherCategory::Snow),
];

const DESCRIPTION_TABLE: &[(RangeInclusive<i32>, &str)] = &[
    (0..=0, "Clear sky"),
    (1..=1, "Mainly clear"),
    (2..=2, "Partly cloudy"),
    (3..=3, "Overcast"),
    (51..=67, "Rain"),
    (71..=77, "Snow"),
];

impl WeatherCategory {
    /// Maps a WMO weather code to its category. Total over `i32`.
    pub fn from_code(code: i32) -> Self {
        CATEGORY_TABLE
            .iter()
            .find(|(range, _)| range.contains(&code))
            .map_or(WeatherCategory::Mixed, |(_, category)| *category)
    }
}

/// Human readable label for a WMO weather code, a little finer than the category.
pub fn describe_code(code: i32) -> &'static str {
    DESCRIPTION_TABLE
        .iter()
        .find(|(range, _)| range.contains(&code))
        .map_or("Mixed", |(_, label)| label)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub code: i32,
    pub category: WeatherCategory,
    pub temp_max_c: f64,
    pub temp_min_c: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub current_temp_c: f64,
    pub humidity_pct: f64,
    pub wind_speed_kmh: f64,
    pub current_code: i32,
    pub current_category: WeatherCategory,
    pub daily_forecast: Vec<DailyForecast>,
}

impl WeatherSnapshot {
    pub fn description(&self) -> &'static str {
        describe_code(self.current_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_examples() {
        assert_eq!(WeatherCategory::from_code(61), WeatherCategory::Rain);
        assert_eq!(WeatherCategory::from_code(2), WeatherCategory::Cloudy);
        assert_eq!(WeatherCategory::from_code(0), WeatherCategory::Clear);
    }

    #[test]
    fn test_category_boundaries() {
        assert_eq!(WeatherCategory::from_code(1), WeatherCategory::Cloudy);
        assert_eq!(WeatherCategory::from_code(3), WeatherCategory::Cloudy);
        assert_eq!(WeatherCategory::from_code(4), WeatherCategory::Mixed);
        assert_eq!(WeatherCategory::from_code(50), WeatherCategory::Mixed);
        assert_eq!(WeatherCategory::from_code(51), WeatherCategory::Rain);
        assert_eq!(WeatherCategory::from_code(67), WeatherCategory::Rain);
        assert_eq!(WeatherCategory::from_code(68), WeatherCategory::Mixed);
        assert_eq!(WeatherCategory::from_code(71), WeatherCategory::Snow);
        assert_eq!(WeatherCategory::from_code(77), WeatherCategory::Snow);
        assert_eq!(WeatherCategory::from_code(95), WeatherCategory::Mixed);
    }

    #[test]
    fn test_out_of_table_codes_are_mixed() {
        assert_eq!(WeatherCategory::from_code(-1), WeatherCategory::Mixed);
        assert_eq!(WeatherCategory::from_code(i32::MAX), WeatherCategory::Mixed);
    }

    #[test]
    fn test_describe_code() {
        assert_eq!(describe_code(0), "Clear sky");
        assert_eq!(describe_code(1), "Mainly clear");
        assert_eq!(describe_code(2), "Partly cloudy");
        assert_eq!(describe_code(3), "Overcast");
        assert_eq!(describe_code(63), "Rain");
        assert_eq!(describe_code(75), "Snow");
        assert_eq!(describe_code(45), "Mixed");
    }
}
