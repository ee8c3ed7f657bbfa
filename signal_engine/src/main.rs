/// main.rs — Signal bot entry point
///
/// FLOW:
///   1. Load config from .env (TELEGRAM_BOT_TOKEN, TELEGRAM_CHAT_IDS, ...)
///   2. Restore realized PnL statistics from STATS_FILE
///   3. Poll Binance Futures klines for every pair on the main and filter
///      timeframes, evaluate entries/exits, notify over Telegram
///   4. Sleep POLL_INTERVAL_SECS and repeat until Ctrl+C
///
/// No orders are placed: positions are simulated and only PnL is tracked.
use anyhow::Result;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use signal_engine::config::AppConfig;
use signal_engine::data::BinanceDataClient;
use signal_engine::notify::TelegramNotifier;
use signal_engine::stats_store::StatsStore;
use signal_engine::SignalEngine;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════╗");
    info!("║     SIGNAL ENGINE  —  MACD/RSI ALERT BOT     ║");
    info!("║                                              ║");
    info!("║  Paper positions only — no orders are sent   ║");
    info!("╚══════════════════════════════════════════════╝");

    let cfg = AppConfig::from_env()?;
    info!(
        "Config: pairs={} main={} filter={} limit={}",
        cfg.trading_pairs.join(","), cfg.tf_main, cfg.tf_filter, cfg.candle_limit
    );
    info!(
        "MACD:  fast={} slow={} signal={}  RSI: period={} lookback={}",
        cfg.indicators.macd_fast, cfg.indicators.macd_slow, cfg.indicators.macd_signal,
        cfg.indicators.rsi_period, cfg.indicators.rsi_lookback
    );
    info!(
        "Risk:  leverage=x{} strong={}$ weak={}$ taker={:.4}%",
        cfg.risk.leverage, cfg.risk.size_strong, cfg.risk.size_weak, cfg.risk.taker_fee * 100.0
    );

    let stats = StatsStore::load(&cfg.stats_file, &cfg.trading_pairs);
    let market = BinanceDataClient::new(&cfg.rest_url);
    let notifier = TelegramNotifier::new(&cfg.telegram_api_url, &cfg.bot_token, cfg.chat_ids.clone());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            // keep the sender alive so the loop is not torn down
            warn!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received, finishing current cycle…");
        let _ = shutdown_tx.send(true);
    });

    let mut engine = SignalEngine::new(cfg, market, notifier, stats);
    engine.run(shutdown_rx).await;
    Ok(())
}
