/// indicators.rs — Indicator Engine
///
/// Turns one rolling candle window into an `IndicatorFrame`: the MACD
/// histogram and RSI, index-aligned with the candles.  A frame is rebuilt
/// from scratch every polling cycle and dropped afterwards; nothing here is
/// updated incrementally.
pub mod macd;
pub mod rsi;

use crate::config::IndicatorConfig;
use crate::models::Candle;

/// Indicator values parallel to a candle slice.  `None` marks warm-up bars.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IndicatorFrame {
    pub macd_hist: Vec<Option<f64>>,
    pub rsi:       Vec<Option<f64>>,
}

impl IndicatorFrame {
    /// Compute both indicators over `candles` (oldest first).
    pub fn compute(candles: &[Candle], cfg: &IndicatorConfig) -> Self {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        Self {
            macd_hist: macd::histogram(&closes, cfg.macd_fast, cfg.macd_slow, cfg.macd_signal),
            rsi:       rsi::rsi(&closes, cfg.rsi_period),
        }
    }

    pub fn len(&self) -> usize {
        self.macd_hist.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macd_hist.is_empty()
    }

    /// `(previous, current)` histogram values, if both are past warm-up.
    pub fn last_hist_pair(&self) -> Option<(f64, f64)> {
        match self.macd_hist.as_slice() {
            [.., Some(prev), Some(cur)] => Some((*prev, *cur)),
            _ => None,
        }
    }

    pub fn last_hist(&self) -> Option<f64> {
        self.macd_hist.last().copied().flatten()
    }

    /// The last `n` RSI values, oldest first; `None` if any is undefined.
    pub fn rsi_tail(&self, n: usize) -> Option<Vec<f64>> {
        if n == 0 || self.rsi.len() < n {
            return None;
        }
        self.rsi[self.rsi.len() - n..].iter().copied().collect()
    }
}
