//! Regular-session heuristic for US equities.
//!
//! Weekdays 09:30 through 16:00 New York time count as open. Exchange
//! holidays and early closes are not modelled.

use {
    chrono::{DateTime, Datelike, TimeZone, Timelike, Utc, Weekday},
    chrono_tz::{America::New_York, Tz},
    serde::Serialize,
};

pub const MARKET_TZ: Tz = New_York;

const OPEN_MINUTE: u32 = 9 * 60 + 30;
const CLOSE_MINUTE: u32 = 16 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketSession {
    RegularHours,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketStatus {
    pub is_open: bool,
    /// RFC 3339 timestamp in the exchange's time zone.
    pub current_time: String,
    pub day_of_week: String,
    pub market_session: MarketSession,
}

pub fn market_status() -> MarketStatus {
    market_status_at(Utc::now())
}

pub fn market_status_at<Z: TimeZone>(now: DateTime<Z>) -> MarketStatus {
    let local = now.with_timezone(&MARKET_TZ);
    let weekday = !matches!(local.weekday(), Weekday::Sat | Weekday::Sun);
    let minute = local.hour() * 60 + local.minute();
    let is_open = weekday && (OPEN_MINUTE..=CLOSE_MINUTE).contains(&minute);

    MarketStatus {
        is_open,
        current_time: local.to_rfc3339(),
        day_of_week: local.format("%A").to_string(),
        market_session: if is_open {
            MarketSession::RegularHours
        } else {
            MarketSession::Closed
        },
    }
}
