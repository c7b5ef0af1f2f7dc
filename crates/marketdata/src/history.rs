use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    error::RequestError,
    executor::{ApiRequest, AuthenticatedClient},
};

pub const PRICE_HISTORY_PATH: &str = "/marketdata/v1/pricehistory";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    #[default]
    Day,
    Month,
    Year,
    Ytd,
}

impl PeriodType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Month => "month",
            Self::Year => "year",
            Self::Ytd => "ytd",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrequencyType {
    #[default]
    Minute,
    Daily,
    Weekly,
    Monthly,
}

impl FrequencyType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Minute => "minute",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

impl fmt::Display for PeriodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for FrequencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PeriodType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            "ytd" => Ok(Self::Ytd),
            other => Err(format!("unknown period type `{other}` (day, month, year, ytd)")),
        }
    }
}

impl FromStr for FrequencyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minute" => Ok(Self::Minute),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(format!(
                "unknown frequency type `{other}` (minute, daily, weekly, monthly)"
            )),
        }
    }
}

/// Parameters for an OHLCV history request. Defaults to one day of
/// one-minute candles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceHistoryQuery {
    pub symbol: String,
    pub period_type: PeriodType,
    pub period: u32,
    pub frequency_type: FrequencyType,
    pub frequency: u32,
}

impl PriceHistoryQuery {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            period_type: PeriodType::default(),
            period: 1,
            frequency_type: FrequencyType::default(),
            frequency: 1,
        }
    }

    pub fn period(mut self, period_type: PeriodType, period: u32) -> Self {
        self.period_type = period_type;
        self.period = period;
        self
    }

    pub fn frequency(mut self, frequency_type: FrequencyType, frequency: u32) -> Self {
        self.frequency_type = frequency_type;
        self.frequency = frequency;
        self
    }

    fn to_request(&self) -> Result<ApiRequest, RequestError> {
        let symbol = self.symbol.trim().to_ascii_uppercase();
        if symbol.is_empty() {
            return Err(RequestError::InvalidRequest("symbol must not be empty".into()));
        }
        if self.period == 0 || self.frequency == 0 {
            return Err(RequestError::InvalidRequest(
                "period and frequency must be positive".into(),
            ));
        }
        Ok(ApiRequest::get(PRICE_HISTORY_PATH)
            .query("symbol", symbol)
            .query("periodType", self.period_type)
            .query("period", self.period)
            .query("frequencyType", self.frequency_type)
            .query("frequency", self.frequency))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    pub symbol: String,
    #[serde(default)]
    pub empty: bool,
    pub candles: Vec<Candle>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    /// Epoch milliseconds.
    pub datetime: i64,
}

pub async fn fetch_price_history(
    client: &AuthenticatedClient,
    query: &PriceHistoryQuery,
) -> Result<PriceHistory, RequestError> {
    let request = query.to_request()?;
    client.execute(&request).await
}
