//! Real-time quotes, fetched in bulk with one result per symbol.

use std::collections::HashMap;

use {
    serde::{Deserialize, Serialize, Serializer, ser::SerializeMap},
    thiserror::Error,
    tracing::debug,
};

use crate::{
    error::RequestError,
    executor::{ApiRequest, AuthenticatedClient},
};

pub const QUOTES_PATH: &str = "/marketdata/v1/quotes";

/// Upper bound on symbols per quotes request; larger lists are split.
pub const MAX_SYMBOLS_PER_REQUEST: usize = 500;

/// Trading-oriented view of a quote.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub symbol: String,
    pub last_price: f64,
    pub bid_price: f64,
    pub ask_price: f64,
    pub high: f64,
    pub low: f64,
    pub volume: u64,
    /// Epoch milliseconds of the last quote update.
    pub timestamp: i64,
}

/// Why a single symbol in a batch has no quote.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymbolError {
    #[error("no data returned for symbol")]
    NotFound,
    #[error("malformed quote: {0}")]
    Malformed(String),
}

/// Per-symbol outcome of a bulk quote request, in request order.
#[derive(Debug, Clone, Default)]
pub struct QuoteBatch {
    entries: Vec<(String, Result<Quote, SymbolError>)>,
}

impl QuoteBatch {
    pub fn get(&self, symbol: &str) -> Option<&Result<Quote, SymbolError>> {
        let symbol = symbol.trim().to_ascii_uppercase();
        self.entries
            .iter()
            .find(|(s, _)| *s == symbol)
            .map(|(_, result)| result)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Result<Quote, SymbolError>)> {
        self.entries.iter().map(|(s, r)| (s.as_str(), r))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn quotes(&self) -> impl Iterator<Item = &Quote> {
        self.entries.iter().filter_map(|(_, r)| r.as_ref().ok())
    }

    pub fn into_results(self) -> Vec<(String, Result<Quote, SymbolError>)> {
        self.entries
    }
}

/// Serializes as `{ "AAPL": {quote...}, "BAD": {"error": "..."} }`.
impl Serialize for QuoteBatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        #[serde(untagged)]
        enum Entry<'a> {
            Quote(&'a Quote),
            Error { error: String },
        }

        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (symbol, result) in &self.entries {
            let entry = match result {
                Ok(quote) => Entry::Quote(quote),
                Err(e) => Entry::Error {
                    error: e.to_string(),
                },
            };
            map.serialize_entry(symbol, &entry)?;
        }
        map.end()
    }
}

#[derive(Debug, Deserialize)]
struct QuoteEntry {
    quote: QuoteFields,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteFields {
    last_price: f64,
    bid_price: Option<f64>,
    ask_price: Option<f64>,
    high_price: Option<f64>,
    low_price: Option<f64>,
    total_volume: Option<u64>,
    quote_time: Option<i64>,
}

impl QuoteFields {
    fn into_quote(self, symbol: &str) -> Quote {
        Quote {
            symbol: symbol.to_string(),
            last_price: self.last_price,
            bid_price: self.bid_price.unwrap_or(self.last_price),
            ask_price: self.ask_price.unwrap_or(self.last_price),
            high: self.high_price.unwrap_or(0.0),
            low: self.low_price.unwrap_or(0.0),
            volume: self.total_volume.unwrap_or(0),
            timestamp: self.quote_time.unwrap_or(0),
        }
    }
}

/// Trim, uppercase and de-duplicate, keeping first-seen order.
pub fn normalize_symbols<S: AsRef<str>>(symbols: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        let symbol = symbol.as_ref().trim().to_ascii_uppercase();
        if !symbol.is_empty() && !out.contains(&symbol) {
            out.push(symbol);
        }
    }
    out
}

/// Quote every symbol. A symbol the API omits or returns garbage for gets its
/// own error entry; only failures of the request itself fail the batch.
pub async fn fetch_quotes<S: AsRef<str>>(
    client: &AuthenticatedClient,
    symbols: &[S],
) -> Result<QuoteBatch, RequestError> {
    let symbols = normalize_symbols(symbols);
    let mut batch = QuoteBatch::default();

    for chunk in symbols.chunks(MAX_SYMBOLS_PER_REQUEST) {
        let request = ApiRequest::get(QUOTES_PATH).query("symbols", chunk.join(","));
        let mut payload: HashMap<String, serde_json::Value> = client.execute(&request).await?;
        debug!(requested = chunk.len(), returned = payload.len(), "quotes received");

        for symbol in chunk {
            let result = match payload.remove(symbol) {
                None => Err(SymbolError::NotFound),
                Some(value) => serde_json::from_value::<QuoteEntry>(value)
                    .map(|entry| entry.quote.into_quote(symbol))
                    .map_err(|e| SymbolError::Malformed(e.to_string())),
            };
            batch.entries.push((symbol.clone(), result));
        }
    }

    Ok(batch)
}

/// Quote a single symbol. A missing or malformed entry fails the call.
pub async fn fetch_quote(client: &AuthenticatedClient, symbol: &str) -> Result<Quote, RequestError> {
    let batch = fetch_quotes(client, &[symbol]).await?;
    match batch.into_results().into_iter().next() {
        Some((_, Ok(quote))) => Ok(quote),
        Some((symbol, Err(source))) => Err(RequestError::Symbol { symbol, source }),
        None => Err(RequestError::InvalidRequest("symbol must not be empty".into())),
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::executor::tests::active_store,
        mockito::Matcher,
    };

    const AAPL: &str = r#"{
        "AAPL": {
            "assetMainType": "EQUITY",
            "symbol": "AAPL",
            "quote": {
                "askPrice": 190.12,
                "bidPrice": 190.10,
                "highPrice": 191.0,
                "lowPrice": 188.5,
                "lastPrice": 190.11,
                "totalVolume": 51234000,
                "quoteTime": 1700000000000
            }
        }
    }"#;

    #[test]
    fn normalize_trims_uppercases_and_dedupes() {
        assert_eq!(
            normalize_symbols(&[" aapl", "MSFT ", "", "AAPL", "brk.b"]),
            vec!["AAPL", "MSFT", "BRK.B"]
        );
    }

    #[tokio::test]
    async fn unknown_symbol_does_not_abort_batch() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", QUOTES_PATH)
            .match_query(Matcher::UrlEncoded("symbols".into(), "AAPL,BAD".into()))
            .match_header("authorization", "Bearer at-1")
            .with_status(200)
            .with_body(AAPL)
            .expect(1)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let client = AuthenticatedClient::new(server.url(), active_store(&server.url(), &dir));

        let batch = fetch_quotes(&client, &["aapl", "bad"]).await.unwrap();

        assert_eq!(batch.len(), 2);
        let quote = batch.get("AAPL").unwrap().as_ref().unwrap();
        assert_eq!(quote.last_price, 190.11);
        assert_eq!(quote.bid_price, 190.10);
        assert_eq!(quote.ask_price, 190.12);
        assert_eq!(quote.volume, 51_234_000);
        assert_eq!(quote.timestamp, 1_700_000_000_000);
        assert_eq!(batch.get("BAD"), Some(&Err(SymbolError::NotFound)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn entry_without_last_price_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", QUOTES_PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"XYZ":{"quote":{"bidPrice":1.0}},"errors":{"invalidSymbols":["NOPE"]}}"#)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let client = AuthenticatedClient::new(server.url(), active_store(&server.url(), &dir));

        let batch = fetch_quotes(&client, &["XYZ", "NOPE"]).await.unwrap();

        assert!(matches!(batch.get("XYZ"), Some(Err(SymbolError::Malformed(_)))));
        assert_eq!(batch.get("NOPE"), Some(&Err(SymbolError::NotFound)));
        assert_eq!(batch.quotes().count(), 0);
    }

    #[tokio::test]
    async fn missing_bid_and_ask_fall_back_to_last() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", QUOTES_PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"SPX":{"quote":{"lastPrice":5000.5}}}"#)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let client = AuthenticatedClient::new(server.url(), active_store(&server.url(), &dir));

        let quote = fetch_quote(&client, "spx").await.unwrap();
        assert_eq!(quote.symbol, "SPX");
        assert_eq!(quote.bid_price, 5000.5);
        assert_eq!(quote.ask_price, 5000.5);
        assert_eq!(quote.volume, 0);
        assert_eq!(quote.high, 0.0);
        assert_eq!(quote.timestamp, 0);
    }

    #[tokio::test]
    async fn single_quote_for_unknown_symbol_fails() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", QUOTES_PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let client = AuthenticatedClient::new(server.url(), active_store(&server.url(), &dir));

        let err = fetch_quote(&client, "nope").await.unwrap_err();
        assert!(matches!(
            err,
            RequestError::Symbol { ref symbol, source: SymbolError::NotFound } if symbol == "NOPE"
        ));
    }

    #[tokio::test]
    async fn large_symbol_lists_are_split() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", QUOTES_PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("{}")
            .expect(2)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let client = AuthenticatedClient::new(server.url(), active_store(&server.url(), &dir));

        let symbols: Vec<String> = (0..MAX_SYMBOLS_PER_REQUEST + 1)
            .map(|i| format!("S{i}"))
            .collect();
        let batch = fetch_quotes(&client, &symbols).await.unwrap();

        assert_eq!(batch.len(), MAX_SYMBOLS_PER_REQUEST + 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn empty_symbol_list_makes_no_request() {
        let dir = tempfile::tempdir().unwrap();
        let base = "http://127.0.0.1:9";
        let client = AuthenticatedClient::new(base, active_store(base, &dir));
        let batch = fetch_quotes(&client, &["  "]).await.unwrap();
        assert!(batch.is_empty());
    }

    #[test]
    fn batch_serializes_errors_inline() {
        let batch = QuoteBatch {
            entries: vec![
                ("AAPL".into(), Ok(Quote {
                    symbol: "AAPL".into(),
                    last_price: 1.0,
                    bid_price: 1.0,
                    ask_price: 1.0,
                    high: 0.0,
                    low: 0.0,
                    volume: 0,
                    timestamp: 0,
                })),
                ("BAD".into(), Err(SymbolError::NotFound)),
            ],
        };
        let json = serde_json::to_value(&batch).unwrap();
        assert_eq!(json["AAPL"]["last_price"], 1.0);
        assert_eq!(json["BAD"]["error"], "no data returned for symbol");
    }
}
