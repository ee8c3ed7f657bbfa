/// strategy.rs — Signal Detector
///
/// ENTRY (shared by both strategies):
///   LONG  : filter hist crosses  − → +  and main hist > 0
///   SHORT : filter hist crosses  + → −  and main hist < 0
///   Strength is STRONG when the filter RSI window touched the opposite
///   extreme (min < 25 for LONG, max > 75 for SHORT), WEAK otherwise.
///
/// EXIT (per strategy, filter timeframe only, once a newer bar exists):
///   SignFlip      : histogram changes sign against the position
///   MomentumDecay : |hist| shrinks, whatever the side
///
/// The detector holds no state; it re-reports a condition every cycle it
/// stays true.  Deduplication belongs to the caller.
use chrono::{DateTime, Utc};

use crate::config::IndicatorConfig;
use crate::indicators::IndicatorFrame;
use crate::models::{Candle, EntrySignal, Position, Side, Strategy, Strength};

/// RSI below this on a LONG entry window makes the signal STRONG.
pub const RSI_OVERSOLD: f64 = 25.0;
/// RSI above this on a SHORT entry window makes the signal STRONG.
pub const RSI_OVERBOUGHT: f64 = 75.0;

/// Candles of one timeframe together with their indicator frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeframe {
    pub candles: Vec<Candle>,
    pub frame:   IndicatorFrame,
}

impl Timeframe {
    pub fn new(candles: Vec<Candle>, cfg: &IndicatorConfig) -> Self {
        let frame = IndicatorFrame::compute(&candles, cfg);
        Self { candles, frame }
    }

    pub fn last_close(&self) -> Option<f64> {
        self.candles.last().map(|c| c.close)
    }

    pub fn last_open_time(&self) -> Option<DateTime<Utc>> {
        self.candles.last().map(|c| c.open_time)
    }
}

/// Crossover rule on raw histogram values.
pub fn entry_side(prev_filter: f64, cur_filter: f64, cur_main: f64) -> Option<Side> {
    if prev_filter < 0.0 && cur_filter > 0.0 && cur_main > 0.0 {
        Some(Side::Long)
    } else if prev_filter > 0.0 && cur_filter < 0.0 && cur_main < 0.0 {
        Some(Side::Short)
    } else {
        None
    }
}

pub fn strength(side: Side, rsi_window: &[f64]) -> Strength {
    let strong = match side {
        Side::Long  => rsi_window.iter().any(|&r| r < RSI_OVERSOLD),
        Side::Short => rsi_window.iter().any(|&r| r > RSI_OVERBOUGHT),
    };
    if strong { Strength::Strong } else { Strength::Weak }
}

impl Strategy {
    /// Exit rule on the last two filter histogram values.
    pub fn should_exit(self, side: Side, prev: f64, cur: f64) -> bool {
        match self {
            Strategy::SignFlip => match side {
                Side::Long  => prev > 0.0 && cur < 0.0,
                Side::Short => prev < 0.0 && cur > 0.0,
            },
            Strategy::MomentumDecay => cur.abs() < prev.abs(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SignalDetector {
    rsi_lookback: usize,
}

impl SignalDetector {
    pub fn new(rsi_lookback: usize) -> Self {
        Self { rsi_lookback }
    }

    /// Evaluate the entry rule.  `None` covers both "no crossover" and
    /// "not enough data yet".
    pub fn detect_entry(
        &self,
        symbol: &str,
        main:   &Timeframe,
        filter: &Timeframe,
    ) -> Option<EntrySignal> {
        let (prev_f, cur_f) = filter.frame.last_hist_pair()?;
        let cur_m = main.frame.last_hist()?;
        let rsi_window = filter.frame.rsi_tail(self.rsi_lookback)?;
        let price = main.last_close()?;
        let time = filter.last_open_time()?;

        let side = entry_side(prev_f, cur_f, cur_m)?;
        Some(EntrySignal {
            symbol: symbol.to_owned(),
            side,
            strength: strength(side, &rsi_window),
            price,
            time,
            filter_hist: cur_f,
            main_hist: cur_m,
            rsi_window,
        })
    }

    /// Evaluate `strategy`'s exit rule for an open position.  Returns false
    /// until the filter timeframe has a bar newer than the entry bar.
    pub fn detect_exit(&self, strategy: Strategy, filter: &Timeframe, position: &Position) -> bool {
        let Some(last_open) = filter.last_open_time() else {
            return false;
        };
        if last_open <= position.entry_time {
            return false;
        }
        match filter.frame.last_hist_pair() {
            Some((prev, cur)) => strategy.should_exit(position.side, prev, cur),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t(i: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap() + Duration::minutes(15 * i)
    }

    /// Timeframe with hand-written indicator values.
    fn tf(hist: &[f64], rsi: &[f64], close: f64) -> Timeframe {
        let n = hist.len().max(rsi.len());
        let candles = (0..n)
            .map(|i| Candle { open_time: t(i as i64), close })
            .collect();
        let pad = |v: &[f64]| -> Vec<Option<f64>> {
            let mut out = vec![None; n - v.len()];
            out.extend(v.iter().copied().map(Some));
            out
        };
        Timeframe {
            candles,
            frame: IndicatorFrame { macd_hist: pad(hist), rsi: pad(rsi) },
        }
    }

    fn position(side: Side, entry_time: DateTime<Utc>) -> Position {
        Position {
            symbol: "BTCUSDT".into(),
            side,
            entry_price: 100.0,
            entry_time,
            size: 2.0,
        }
    }

    #[test]
    fn long_entry_strength_from_rsi_minimum() {
        let det = SignalDetector::new(3);
        let main = tf(&[0.1, 0.4], &[], 101.5);

        let filter = tf(&[-0.2, 0.3], &[30.0, 24.0, 40.0], 0.0);
        let sig = det.detect_entry("BTCUSDT", &main, &filter).unwrap();
        assert_eq!(sig.side, Side::Long);
        assert_eq!(sig.strength, Strength::Strong);
        assert_eq!(sig.price, 101.5);
        assert_eq!(sig.time, t(2));
        assert_eq!(sig.filter_hist, 0.3);
        assert_eq!(sig.main_hist, 0.4);

        let filter = tf(&[-0.2, 0.3], &[30.0, 26.0, 40.0], 0.0);
        let sig = det.detect_entry("BTCUSDT", &main, &filter).unwrap();
        assert_eq!(sig.strength, Strength::Weak);
    }

    #[test]
    fn short_entry_strength_from_rsi_maximum() {
        let det = SignalDetector::new(2);
        let main = tf(&[-0.5], &[], 99.0);
        let filter = tf(&[0.2, -0.1], &[76.0, 60.0], 0.0);
        let sig = det.detect_entry("ETHUSDT", &main, &filter).unwrap();
        assert_eq!(sig.side, Side::Short);
        assert_eq!(sig.strength, Strength::Strong);

        let filter = tf(&[0.2, -0.1], &[75.0, 60.0], 0.0);
        let sig = det.detect_entry("ETHUSDT", &main, &filter).unwrap();
        assert_eq!(sig.strength, Strength::Weak);
    }

    #[test]
    fn main_timeframe_must_confirm() {
        let det = SignalDetector::new(1);
        let filter = tf(&[-0.2, 0.3], &[50.0], 0.0);
        assert!(det.detect_entry("X", &tf(&[-0.1], &[], 1.0), &filter).is_none());
        assert!(det.detect_entry("X", &tf(&[0.0], &[], 1.0), &filter).is_none());
    }

    #[test]
    fn never_both_sides() {
        let grid = [-1.0, -0.1, 0.0, 0.1, 1.0];
        for &p in &grid {
            for &c in &grid {
                for &m in &grid {
                    let long = p < 0.0 && c > 0.0 && m > 0.0;
                    let short = p > 0.0 && c < 0.0 && m < 0.0;
                    assert!(!(long && short));
                    let expected = if long {
                        Some(Side::Long)
                    } else if short {
                        Some(Side::Short)
                    } else {
                        None
                    };
                    assert_eq!(entry_side(p, c, m), expected);
                }
            }
        }
    }

    #[test]
    fn repeated_detection_is_stable() {
        let det = SignalDetector::new(2);
        let main = tf(&[0.4], &[], 10.0);
        let filter = tf(&[-0.2, 0.3], &[20.0, 30.0], 0.0);
        let a = det.detect_entry("SOLUSDT", &main, &filter);
        let b = det.detect_entry("SOLUSDT", &main, &filter);
        assert!(a.is_some());
        assert_eq!(a, b);
    }

    #[test]
    fn insufficient_data_skips_entry() {
        let det = SignalDetector::new(3);
        let main = tf(&[0.4], &[], 10.0);
        // only two RSI values defined for a lookback of three
        let filter = tf(&[-0.2, 0.3], &[20.0, 30.0], 0.0);
        assert!(det.detect_entry("X", &main, &filter).is_none());
        // a single histogram value
        let filter = tf(&[0.3], &[20.0, 30.0, 40.0], 0.0);
        assert!(det.detect_entry("X", &main, &filter).is_none());
    }

    #[test]
    fn sign_flip_exit() {
        assert!(Strategy::SignFlip.should_exit(Side::Long, 0.5, -0.3));
        assert!(!Strategy::SignFlip.should_exit(Side::Long, -0.3, -0.1));
        assert!(Strategy::SignFlip.should_exit(Side::Short, -0.3, 0.1));
        assert!(!Strategy::SignFlip.should_exit(Side::Short, 0.5, -0.3));
    }

    #[test]
    fn momentum_decay_exit_ignores_side() {
        for side in [Side::Long, Side::Short] {
            assert!(Strategy::MomentumDecay.should_exit(side, 0.5, 0.2));
            assert!(!Strategy::MomentumDecay.should_exit(side, 0.2, 0.5));
            assert!(Strategy::MomentumDecay.should_exit(side, -0.5, 0.1));
        }
    }

    #[test]
    fn exit_waits_for_newer_filter_bar() {
        let det = SignalDetector::new(1);
        let filter = tf(&[0.5, -0.3], &[], 0.0);
        let last = filter.last_open_time().unwrap();

        assert!(!det.detect_exit(Strategy::SignFlip, &filter, &position(Side::Long, last)));
        assert!(det.detect_exit(
            Strategy::SignFlip,
            &filter,
            &position(Side::Long, last - Duration::minutes(15)),
        ));
    }

    #[test]
    fn exit_without_histogram_is_false() {
        let det = SignalDetector::new(1);
        let filter = tf(&[0.5], &[1.0, 2.0], 0.0);
        let pos = position(Side::Long, t(-10));
        assert!(!det.detect_exit(Strategy::MomentumDecay, &filter, &pos));

        let empty = Timeframe { candles: vec![], frame: IndicatorFrame::default() };
        assert!(!det.detect_exit(Strategy::SignFlip, &empty, &pos));
    }
}
