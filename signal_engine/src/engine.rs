/// engine.rs — Orchestrator
///
/// One cycle:
///   1. drain inbound commands (`/statistics`)
///   2. for every configured symbol, sequentially:
///        fetch main + filter windows → indicators
///        entry check  → dedup → open both strategy slots → notify
///        exit check   → strategy 1, then strategy 2 → close → persist → notify
///   3. sleep `poll_interval_secs`, or stop when shutdown is signalled
///
/// All mutable state (dedup set, ledger, statistics) lives here and is only
/// touched from the loop, so nothing is locked.
use ahash::AHashSet;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::data::MarketData;
use crate::ledger::PositionLedger;
use crate::models::{Candle, ClosedTrade, EntrySignal, Side, SignalKey, Strategy};
use crate::notify::{Command, Notifier};
use crate::stats_store::StatsStore;
use crate::strategy::{SignalDetector, Timeframe};

/// Main and filter windows of one symbol for the current cycle.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub main:   Timeframe,
    pub filter: Timeframe,
}

pub struct SignalEngine<M, N> {
    cfg:      AppConfig,
    market:   M,
    notifier: N,
    detector: SignalDetector,
    ledger:   PositionLedger,
    stats:    StatsStore,
    /// Keys already announced.  Grows for the life of the process and is
    /// never pruned, so each (symbol, side, strength) fires at most once.
    sent_signals:  AHashSet<SignalKey>,
    update_offset: i64,
}

impl<M: MarketData, N: Notifier> SignalEngine<M, N> {
    pub fn new(cfg: AppConfig, market: M, notifier: N, stats: StatsStore) -> Self {
        Self {
            detector: SignalDetector::new(cfg.indicators.rsi_lookback),
            ledger: PositionLedger::new(cfg.risk.clone()),
            cfg,
            market,
            notifier,
            stats,
            sent_signals: AHashSet::new(),
            update_offset: 0,
        }
    }

    pub fn ledger(&self) -> &PositionLedger {
        &self.ledger
    }

    pub fn stats(&self) -> &StatsStore {
        &self.stats
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn sent_signals(&self) -> &AHashSet<SignalKey> {
        &self.sent_signals
    }

    /// Poll until `shutdown` flips to true (or its sender is dropped).
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        let poll = Duration::from_secs(self.cfg.poll_interval_secs);
        info!(
            "Entering loop: {} symbols, main={} filter={}, polling every {}s",
            self.cfg.trading_pairs.len(), self.cfg.tf_main, self.cfg.tf_filter, poll.as_secs()
        );
        self.notifier
            .send_message(&format!(
                "🤖 Signal bot started: statistics are saved to {}",
                self.stats.path().display()
            ))
            .await;

        loop {
            if *shutdown.borrow() {
                break;
            }
            self.run_cycle().await;

            tokio::select! {
                _ = tokio::time::sleep(poll) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("Shutdown requested, leaving loop with {} open positions", self.ledger.open_count());
    }

    /// One full pass: commands, then every symbol in configuration order.
    pub async fn run_cycle(&mut self) {
        self.handle_commands().await;

        let symbols = self.cfg.trading_pairs.clone();
        for symbol in &symbols {
            let Some(snapshot) = self.load_snapshot(symbol).await else {
                continue;
            };
            self.check_entry(symbol, &snapshot).await;
            for strategy in Strategy::ALL {
                self.check_exit(symbol, strategy, &snapshot).await;
            }
        }
    }

    async fn handle_commands(&mut self) {
        let updates = match self.notifier.poll_updates(self.update_offset).await {
            Ok(u) => u,
            Err(e) => {
                warn!("Polling commands failed: {e:#}");
                return;
            }
        };

        for update in updates {
            self.update_offset = self.update_offset.max(update.update_id + 1);
            let (Some(chat_id), Some(text)) = (update.chat_id, update.text.as_deref()) else {
                continue;
            };
            if Command::parse(text) == Some(Command::Statistics) {
                info!("/statistics requested by {}", chat_id);
                let report = self.stats.report();
                self.notifier.send_message(&report.to_string()).await;
            }
        }
    }

    /// Fetch and compute both timeframes.  `None` skips the symbol this cycle.
    async fn load_snapshot(&self, symbol: &str) -> Option<Snapshot> {
        let limit = self.cfg.candle_limit;
        let main = self.fetch(symbol, &self.cfg.tf_main, limit).await?;
        let filter = self.fetch(symbol, &self.cfg.tf_filter, limit).await?;

        let snapshot = Snapshot {
            main:   Timeframe::new(main, &self.cfg.indicators),
            filter: Timeframe::new(filter, &self.cfg.indicators),
        };

        match (snapshot.filter.frame.last_hist_pair(), snapshot.main.frame.last_hist_pair()) {
            (Some((pf, cf)), Some((pm, cm))) => info!(
                "{}: {}({:.4}->{:.4}) {}({:.4}->{:.4}) RSI{}={:?}",
                symbol,
                self.cfg.tf_filter, pf, cf,
                self.cfg.tf_main, pm, cm,
                self.cfg.indicators.rsi_period,
                snapshot
                    .filter
                    .frame
                    .rsi_tail(self.cfg.indicators.rsi_lookback)
                    .map(|v| v.iter().map(|x| (x * 100.0).round() / 100.0).collect::<Vec<_>>()),
            ),
            _ => debug!("{}: not enough candles for indicators yet", symbol),
        }
        Some(snapshot)
    }

    async fn fetch(&self, symbol: &str, interval: &str, limit: u32) -> Option<Vec<Candle>> {
        match self.market.fetch_candles(symbol, interval, limit).await {
            Ok(c) if !c.is_empty() => Some(c),
            Ok(_) => {
                warn!("{} {}: empty candle window, skipping", symbol, interval);
                None
            }
            Err(e) => {
                warn!("{} {}: fetch failed, skipping: {e:#}", symbol, interval);
                None
            }
        }
    }

    async fn check_entry(&mut self, symbol: &str, snapshot: &Snapshot) {
        let Some(signal) = self.detector.detect_entry(symbol, &snapshot.main, &snapshot.filter) else {
            return;
        };
        let key = signal.key();
        if self.sent_signals.contains(&key) {
            debug!("{} {} {} already announced", symbol, signal.strength, signal.side);
            return;
        }

        let size = self.cfg.risk.size_for(signal.strength);
        let mut skipped = Vec::new();
        for strategy in Strategy::ALL {
            if let Err(e) = self.ledger.open(strategy, symbol, signal.side, signal.price, signal.time, size) {
                warn!("Entry not applied: {e}");
                skipped.push(strategy);
            }
        }

        let msg = self.entry_message(&signal, size, &skipped);
        info!("ENTRY:\n{}", msg);
        self.notifier.send_message(&msg).await;
        self.sent_signals.insert(key);
    }

    async fn check_exit(&mut self, symbol: &str, strategy: Strategy, snapshot: &Snapshot) {
        let Some(position) = self.ledger.get(strategy, symbol) else {
            return;
        };
        if !self.detector.detect_exit(strategy, &snapshot.filter, position) {
            return;
        }
        let Some(exit_price) = snapshot.main.last_close() else {
            return;
        };

        let trade = match self.ledger.close(strategy, symbol, exit_price) {
            Ok(t) => t,
            Err(e) => {
                warn!("Exit not applied: {e}");
                return;
            }
        };
        if let Err(e) = self.stats.record(strategy, symbol, trade.net_pnl) {
            error!("Failed to persist statistics: {e:#}");
        }

        let msg = exit_message(&trade);
        info!("EXIT: {}", msg);
        self.notifier.send_message(&msg).await;
    }

    /// `skipped` lists strategies whose slot was already taken.
    fn entry_message(&self, signal: &EntrySignal, size: f64, skipped: &[Strategy]) -> String {
        let (icon, extreme_label) = match signal.side {
            Side::Long  => ("📈", "Min"),
            Side::Short => ("📉", "Max"),
        };
        let rsi: Vec<f64> = signal
            .rsi_window
            .iter()
            .map(|x| (x * 100.0).round() / 100.0)
            .collect();
        let mut msg = format!(
            "{icon} {} {}\n\
             Pair: {}\n\
             Time: {}\n\
             {} MACD_hist: {:.4}\n\
             {} MACD_hist: {:.4}\n\
             RSI{} {} ({} bars): {:?}\n\
             {extreme_label} RSI{}: {:.2}\n\
             Opening {}$ position with x{} leverage",
            signal.strength, signal.side,
            signal.symbol,
            signal.time.format("%Y-%m-%d %H:%M:%S"),
            self.cfg.tf_filter, signal.filter_hist,
            self.cfg.tf_main, signal.main_hist,
            self.cfg.indicators.rsi_period, self.cfg.tf_filter, signal.rsi_window.len(), rsi,
            self.cfg.indicators.rsi_period, signal.rsi_extreme(),
            size, self.cfg.risk.leverage,
        );
        if !skipped.is_empty() {
            let ids: Vec<&str> = skipped.iter().map(|s| s.id()).collect();
            msg.push_str(&format!(
                "\nNot opened for strategy {}: position already held",
                ids.join(", ")
            ));
        }
        msg
    }
}

fn exit_message(trade: &ClosedTrade) -> String {
    format!(
        "EXIT strat{} {} {} @ {:.4}\nPnL = {:.2}$ (fee≈{:.4}$)",
        trade.strategy, trade.position.side, trade.position.symbol,
        trade.exit_price, trade.net_pnl, trade.fee
    )
}
