use {
    anyhow::Result,
    quotebridge_marketdata::{
        FrequencyType, PeriodType, PriceHistoryQuery, fetch_price_history, fetch_quotes,
        market_status,
    },
    serde::Serialize,
    tracing::warn,
};

use crate::context::Context;

pub struct HistoryArgs {
    pub symbol: String,
    pub period_type: PeriodType,
    pub period: u32,
    pub frequency_type: FrequencyType,
    pub frequency: u32,
}

pub async fn quote(ctx: &Context, symbols: &[String]) -> Result<()> {
    let client = ctx.data_client()?;
    let batch = fetch_quotes(&client, symbols).await?;

    for (symbol, result) in batch.iter() {
        if let Err(e) = result {
            warn!(symbol, error = %e, "no quote");
        }
    }
    print_json(&batch)
}

pub async fn history(ctx: &Context, args: HistoryArgs) -> Result<()> {
    let client = ctx.data_client()?;
    let query = PriceHistoryQuery::new(args.symbol)
        .period(args.period_type, args.period)
        .frequency(args.frequency_type, args.frequency);

    let history = fetch_price_history(&client, &query).await?;
    print_json(&history)
}

pub fn status() -> Result<()> {
    print_json(&market_status())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", render_json(value)?);
    Ok(())
}

fn render_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_renders_session_fields() {
        let rendered = render_json(&market_status()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        let is_open = json["is_open"].as_bool().unwrap();
        let session = json["market_session"].as_str().unwrap();
        assert_eq!(session, if is_open { "regular_hours" } else { "closed" });
        assert!(json["current_time"].as_str().unwrap().contains('T'));
        assert!(json["day_of_week"].is_string());
    }
}
