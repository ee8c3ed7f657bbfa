/// metrics.rs — Realized PnL aggregates
///
///   count   = N closed trades
///   total   = Σ net_pnl
///   average = total / N        (0 when N = 0)
///
/// Aggregates are computed per instrument and across all instruments of a
/// strategy.  `StatisticsReport` renders the text sent for `/statistics`.
use std::fmt;

use crate::models::Strategy;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PnlSummary {
    pub count:   usize,
    pub total:   f64,
    pub average: f64,
}

impl PnlSummary {
    pub fn from_pnls(pnls: &[f64]) -> Self {
        let count = pnls.len();
        if count == 0 {
            return Self::default();
        }
        let total: f64 = pnls.iter().sum();
        let average = total / count as f64;
        Self { count, total, average }
    }
}

/// Aggregates for one strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyReport {
    pub strategy:       Strategy,
    /// In configured instrument order
    pub per_instrument: Vec<(String, PnlSummary)>,
    pub overall:        PnlSummary,
}

impl StrategyReport {
    pub fn instrument(&self, symbol: &str) -> Option<&PnlSummary> {
        self.per_instrument
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, summary)| summary)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsReport {
    pub strategies: Vec<StrategyReport>,
}

impl fmt::Display for StatisticsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "📊 PnL statistics")?;
        for report in &self.strategies {
            write!(
                f,
                "\n\n— Strategy {}: total = {:.2}$, avg = {:.2}$",
                report.strategy, report.overall.total, report.overall.average
            )?;
            for (symbol, s) in &report.per_instrument {
                write!(
                    f,
                    "\n{}: trades={}, total={:.2}$, avg={:.2}$",
                    symbol, s.count, s.total, s.average
                )?;
            }
        }
        Ok(())
    }
}
