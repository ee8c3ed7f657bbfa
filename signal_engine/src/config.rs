/// config.rs — Centralised configuration loaded from .env
///
/// All parameters consumed by the signal engine are defined here.
/// Loading happens once at startup; every module borrows &AppConfig or
/// one of its sections.
use anyhow::{bail, Result};
use std::env;
use std::path::PathBuf;

/// Instruments watched when TRADING_PAIRS is unset.
pub const DEFAULT_PAIRS: &[&str] = &[
    "BTCUSDT", "ETHUSDT", "BNBUSDT", "ADAUSDT", "XRPUSDT",
    "NEARUSDT", "SOLUSDT", "EPICUSDT", "XMRUSDT",
];

/// Binance USDT-M Futures taker fee used for the round-trip estimate.
pub const DEFAULT_TAKER_FEE: f64 = 0.0004;

/// Indicator periods shared by both timeframes.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorConfig {
    pub macd_fast:    usize,
    pub macd_slow:    usize,
    pub macd_signal:  usize,
    pub rsi_period:   usize,
    /// Number of trailing filter-timeframe RSI values inspected at entry
    pub rsi_lookback: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            macd_fast:    12,
            macd_slow:    26,
            macd_signal:  9,
            rsi_period:   6,
            rsi_lookback: 7,
        }
    }
}

/// Simulated position sizing and cost model.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskConfig {
    pub leverage:    f64,
    /// Notional ($) opened on a STRONG signal
    pub size_strong: f64,
    /// Notional ($) opened on a WEAK signal
    pub size_weak:   f64,
    pub taker_fee:   f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            leverage:    20.0,
            size_strong: 4.0,
            size_weak:   2.0,
            taker_fee:   DEFAULT_TAKER_FEE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // ── Endpoints ────────────────────────────────────────────────────
    pub rest_url:         String,
    pub telegram_api_url: String,

    // ── Telegram credentials ─────────────────────────────────────────
    pub bot_token: String,
    pub chat_ids:  Vec<String>,

    // ── Trading universe ─────────────────────────────────────────────
    pub trading_pairs: Vec<String>,

    // ── Timeframes ───────────────────────────────────────────────────
    /// Short timeframe confirming direction and pricing entries/exits
    pub tf_main:      String,
    /// Longer timeframe whose histogram crossover drives every decision
    pub tf_filter:    String,
    /// Rolling window length fetched per timeframe
    pub candle_limit: u32,

    pub indicators: IndicatorConfig,
    pub risk:       RiskConfig,

    // ── Scheduling & persistence ─────────────────────────────────────
    pub poll_interval_secs: u64,
    pub stats_file:         PathBuf,
}

impl AppConfig {
    /// Load configuration from environment variables (after dotenv).
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok(); // ignore missing .env

        let bot_token = env::var("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        let chat_ids = split_list(&env::var("TELEGRAM_CHAT_IDS").unwrap_or_default());

        let trading_pairs = match env::var("TRADING_PAIRS") {
            Ok(v) => split_list(&v),
            Err(_) => DEFAULT_PAIRS.iter().map(|s| s.to_string()).collect(),
        };

        let cfg = Self {
            rest_url: env::var("BINANCE_FUTURES_REST_URL")
                .unwrap_or_else(|_| "https://fapi.binance.com".into()),
            telegram_api_url: env::var("TELEGRAM_API_URL")
                .unwrap_or_else(|_| "https://api.telegram.org".into()),
            bot_token,
            chat_ids,
            trading_pairs,

            tf_main:      env::var("TF_MAIN").unwrap_or_else(|_| "5m".into()),
            tf_filter:    env::var("TF_FILTER").unwrap_or_else(|_| "15m".into()),
            candle_limit: parse_env("CANDLE_LIMIT", 100u32)?,

            indicators: IndicatorConfig {
                macd_fast:    parse_env("MACD_FAST",    12usize)?,
                macd_slow:    parse_env("MACD_SLOW",    26usize)?,
                macd_signal:  parse_env("MACD_SIGNAL",  9usize)?,
                rsi_period:   parse_env("RSI_PERIOD",   6usize)?,
                rsi_lookback: parse_env("RSI_LOOKBACK", 7usize)?,
            },
            risk: RiskConfig {
                leverage:    parse_env("LEVERAGE",    20.0)?,
                size_strong: parse_env("SIZE_STRONG", 4.0)?,
                size_weak:   parse_env("SIZE_WEAK",   2.0)?,
                taker_fee:   parse_env("TAKER_FEE",   DEFAULT_TAKER_FEE)?,
            },

            poll_interval_secs: parse_env("POLL_INTERVAL_SECS", 60u64)?,
            stats_file: PathBuf::from(
                env::var("STATS_FILE").unwrap_or_else(|_| "stats.json".into()),
            ),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.bot_token.is_empty() {
            bail!("TELEGRAM_BOT_TOKEN is required");
        }
        if self.chat_ids.is_empty() {
            bail!("TELEGRAM_CHAT_IDS must list at least one chat id");
        }
        if self.trading_pairs.is_empty() {
            bail!("TRADING_PAIRS must list at least one symbol");
        }
        self.indicators.validate()
    }
}

impl IndicatorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.macd_fast == 0 || self.macd_signal == 0 || self.rsi_period == 0 {
            bail!("indicator periods must be non-zero");
        }
        if self.macd_fast >= self.macd_slow {
            bail!(
                "MACD_FAST ({}) must be smaller than MACD_SLOW ({})",
                self.macd_fast, self.macd_slow
            );
        }
        if self.rsi_lookback == 0 {
            bail!("RSI_LOOKBACK must be at least 1");
        }
        Ok(())
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr + Copy,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(v) => v
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Config key {key}: {e}")),
        Err(_) => Ok(default),
    }
}
