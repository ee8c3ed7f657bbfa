/// data.rs — Market data via the Binance USDT-M Futures REST API
///
///   GET /fapi/v1/klines?symbol=BTCUSDT&interval=15m&limit=100
///
/// Each kline row is a JSON array:
///   [0] open time (ms)   [1] open   [2] high   [3] low   [4] close   ...
/// Prices arrive as decimal strings.  Only open time and close are kept.
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::Value;
use std::future::Future;
use tracing::debug;

use crate::models::Candle;

/// Source of closed-candle windows, oldest first.
pub trait MarketData {
    fn fetch_candles(
        &self,
        symbol:   &str,
        interval: &str,
        limit:    u32,
    ) -> impl Future<Output = Result<Vec<Candle>>>;
}

pub struct BinanceDataClient {
    client:   Client,
    base_url: String,
}

impl BinanceDataClient {
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("HTTP client build failed");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    pub async fn fetch_klines(&self, symbol: &str, interval: &str, limit: u32) -> Result<Vec<Candle>> {
        let url = format!(
            "{}/fapi/v1/klines?symbol={}&interval={}&limit={}",
            self.base_url, symbol, interval, limit
        );

        let resp = self.client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET klines {symbol} {interval} failed"))?;

        let status = resp.status();
        let body = resp.text().await.context("Failed to read klines body")?;
        if !status.is_success() {
            anyhow::bail!("klines {symbol} {interval}: HTTP {status} — {body}");
        }

        let candles = parse_klines(&body)?;
        debug!("Fetched {} {} {} candles", candles.len(), symbol, interval);
        Ok(candles)
    }
}

impl MarketData for BinanceDataClient {
    async fn fetch_candles(&self, symbol: &str, interval: &str, limit: u32) -> Result<Vec<Candle>> {
        self.fetch_klines(symbol, interval, limit).await
    }
}

/// Parse a `/fapi/v1/klines` body into candles.
pub fn parse_klines(body: &str) -> Result<Vec<Candle>> {
    let rows: Vec<Vec<Value>> = serde_json::from_str(body).context("Failed to parse klines")?;
    rows.iter().map(|row| parse_row(row)).collect()
}

fn parse_row(row: &[Value]) -> Result<Candle> {
    let open_ms = row
        .first()
        .and_then(Value::as_i64)
        .ok_or_else(|| anyhow!("kline row without open time"))?;
    let open_time = DateTime::<Utc>::from_timestamp_millis(open_ms)
        .ok_or_else(|| anyhow!("kline open time {open_ms} out of range"))?;

    let close = match row.get(4) {
        Some(Value::String(s)) => s.parse::<f64>().with_context(|| format!("bad close {s:?}"))?,
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| anyhow!("bad close {n}"))?,
        _ => anyhow::bail!("kline row without close"),
    };
    Ok(Candle { open_time, close })
}
