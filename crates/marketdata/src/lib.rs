//! Authenticated market data: quotes, price history and the market-hours
//! heuristic.

pub mod error;
pub mod executor;
pub mod history;
pub mod market_hours;
pub mod quotes;

pub use {
    error::RequestError,
    executor::{ApiRequest, AuthenticatedClient},
    history::{
        Candle, FrequencyType, PeriodType, PriceHistory, PriceHistoryQuery, fetch_price_history,
    },
    market_hours::{MarketSession, MarketStatus, market_status, market_status_at},
    quotes::{Quote, QuoteBatch, SymbolError, fetch_quote, fetch_quotes, normalize_symbols},
};
