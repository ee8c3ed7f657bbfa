/// stats_store.rs — JSON-file persistence for realized PnL
///
///   { "<strategy id>": { "<symbol>": [net_pnl, ...] } }
///
/// The whole file is rewritten after every recorded trade, so a restart
/// resumes from the last successful write.
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::metrics::{PnlSummary, StatisticsReport, StrategyReport};
use crate::models::Strategy;

/// strategy id → symbol → realized net PnL values, oldest first.
pub type StatsRecord = BTreeMap<String, BTreeMap<String, Vec<f64>>>;

#[derive(Debug, Clone)]
pub struct StatsStore {
    path:    PathBuf,
    symbols: Vec<String>,
    records: StatsRecord,
}

impl StatsStore {
    /// Load the store from `path`.
    ///
    /// A missing, unreadable or malformed file yields an empty store covering
    /// every configured symbol for both strategies; it is never an error.
    pub fn load(path: impl AsRef<Path>, symbols: &[String]) -> Self {
        let path = path.as_ref().to_path_buf();
        let loaded = match fs::read_to_string(&path) {
            Ok(raw) => {
                let parsed = parse_record(&raw);
                if parsed.is_none() {
                    warn!("Statistics file {} is malformed, starting empty", path.display());
                }
                parsed
            }
            Err(e) => {
                info!("No statistics loaded from {} ({e}), starting empty", path.display());
                None
            }
        };

        let mut records = loaded.unwrap_or_default();
        for strategy in Strategy::ALL {
            let per_symbol = records.entry(strategy.id().to_owned()).or_default();
            for symbol in symbols {
                per_symbol.entry(symbol.clone()).or_default();
            }
        }

        Self { path, symbols: symbols.to_vec(), records }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &StatsRecord {
        &self.records
    }

    pub fn pnls(&self, strategy: Strategy, symbol: &str) -> &[f64] {
        self.records
            .get(strategy.id())
            .and_then(|m| m.get(symbol))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Append one realized PnL and persist immediately.
    pub fn record(&mut self, strategy: Strategy, symbol: &str, net_pnl: f64) -> Result<()> {
        self.records
            .entry(strategy.id().to_owned())
            .or_default()
            .entry(symbol.to_owned())
            .or_default()
            .push(net_pnl);
        self.save()
    }

    /// Aggregates for one strategy: configured symbols first, in
    /// configuration order, then any extra symbols found on disk.  The
    /// overall line only covers configured symbols.
    pub fn query(&self, strategy: Strategy) -> StrategyReport {
        let empty = BTreeMap::new();
        let per_symbol = self.records.get(strategy.id()).unwrap_or(&empty);
        let pnls_of = |symbol: &String| per_symbol.get(symbol).map(Vec::as_slice).unwrap_or(&[]);

        let all: Vec<f64> = self
            .symbols
            .iter()
            .flat_map(|symbol| pnls_of(symbol).iter().copied())
            .collect();

        let extras = per_symbol.keys().filter(|s| !self.symbols.contains(s));
        let per_instrument = self
            .symbols
            .iter()
            .chain(extras)
            .map(|symbol| (symbol.clone(), PnlSummary::from_pnls(pnls_of(symbol))))
            .collect();

        StrategyReport {
            strategy,
            per_instrument,
            overall: PnlSummary::from_pnls(&all),
        }
    }

    pub fn report(&self) -> StatisticsReport {
        StatisticsReport {
            strategies: Strategy::ALL.iter().map(|&s| self.query(s)).collect(),
        }
    }

    /// Overwrite the file wholesale via a temporary sibling and a rename.
    pub fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        let json = serde_json::to_string_pretty(&self.records)
            .context("Failed to serialize statistics")?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

/// Parse a stats file; `None` unless it is an object holding every strategy id.
fn parse_record(raw: &str) -> Option<StatsRecord> {
    let record: StatsRecord = serde_json::from_str(raw).ok()?;
    Strategy::ALL
        .iter()
        .all(|s| record.contains_key(s.id()))
        .then_some(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn symbols() -> Vec<String> {
        vec!["BTCUSDT".into(), "ETHUSDT".into()]
    }

    fn assert_empty(store: &StatsStore) {
        for s in Strategy::ALL {
            let m = &store.records()[s.id()];
            assert_eq!(m.len(), 2);
            assert!(m.values().all(Vec::is_empty));
        }
    }

    #[test]
    fn missing_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let store = StatsStore::load(dir.path().join("stats.json"), &symbols());
        assert_empty(&store);
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stats.json");
        for junk in ["{not json", "[1, 2, 3]", r#"{"1": {}}"#, r#"{"1": {"BTCUSDT": "x"}, "2": {}}"#] {
            fs::write(&path, junk).unwrap();
            assert_empty(&StatsStore::load(&path, &symbols()));
        }
    }

    #[test]
    fn record_persists_and_reloads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("stats.json");

        let mut store = StatsStore::load(&path, &symbols());
        for pnl in [3.0, -1.0, 2.0] {
            store.record(Strategy::SignFlip, "BTCUSDT", pnl).unwrap();
        }
        store.record(Strategy::MomentumDecay, "ETHUSDT", 0.5).unwrap();

        let reloaded = StatsStore::load(&path, &symbols());
        assert_eq!(reloaded.pnls(Strategy::SignFlip, "BTCUSDT"), &[3.0, -1.0, 2.0]);
        assert_eq!(reloaded.pnls(Strategy::MomentumDecay, "ETHUSDT"), &[0.5]);
        assert!(reloaded.pnls(Strategy::SignFlip, "ETHUSDT").is_empty());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn query_aggregates_per_instrument_and_overall() {
        let dir = TempDir::new().unwrap();
        let mut store = StatsStore::load(dir.path().join("s.json"), &symbols());
        for pnl in [3.0, -1.0, 2.0] {
            store.record(Strategy::SignFlip, "BTCUSDT", pnl).unwrap();
        }
        store.record(Strategy::SignFlip, "ETHUSDT", 2.0).unwrap();

        let report = store.query(Strategy::SignFlip);
        let btc = report.instrument("BTCUSDT").unwrap();
        assert_eq!(btc.count, 3);
        assert!((btc.total - 4.0).abs() < 1e-12);
        assert!((btc.average - 1.333_333).abs() < 1e-6);

        assert_eq!(report.overall.count, 4);
        assert!((report.overall.total - 6.0).abs() < 1e-12);
        assert!((report.overall.average - 1.5).abs() < 1e-12);

        let other = store.query(Strategy::MomentumDecay);
        assert_eq!(other.overall, PnlSummary::default());
        assert_eq!(other.per_instrument.len(), 2);
    }

    #[test]
    fn unknown_symbols_on_disk_are_kept() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stats.json");
        fs::write(&path, r#"{"1": {"DOGEUSDT": [1.0]}, "2": {}}"#).unwrap();

        let store = StatsStore::load(&path, &symbols());
        assert_eq!(store.pnls(Strategy::SignFlip, "DOGEUSDT"), &[1.0]);
        assert!(store.pnls(Strategy::MomentumDecay, "BTCUSDT").is_empty());

        let report = store.query(Strategy::SignFlip);
        let names: Vec<&str> = report.per_instrument.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(names, vec!["BTCUSDT", "ETHUSDT", "DOGEUSDT"]);
    }

    #[test]
    fn overall_total_counts_configured_symbols_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stats.json");
        fs::write(&path, r#"{"1": {"DOGEUSDT": [10.0], "BTCUSDT": [2.0]}, "2": {}}"#).unwrap();

        let store = StatsStore::load(&path, &symbols());
        let report = store.query(Strategy::SignFlip);
        assert_eq!(report.instrument("DOGEUSDT").unwrap().count, 1);
        assert_eq!(report.overall.count, 1);
        assert!((report.overall.total - 2.0).abs() < 1e-12);
    }
}
