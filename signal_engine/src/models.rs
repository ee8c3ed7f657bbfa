use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One kline reduced to what the indicators consume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub close:     f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Side {
    Long,
    Short,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long  => write!(f, "LONG"),
            Side::Short => write!(f, "SHORT"),
        }
    }
}

/// Confidence tier of an entry, decided by how stretched RSI was.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Strength {
    Strong,
    Weak,
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strength::Strong => write!(f, "STRONG"),
            Strength::Weak   => write!(f, "WEAK"),
        }
    }
}

/// The two exit policies layered on identical entries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Strategy {
    /// Strategy 1: exit when the filter histogram changes sign against the position.
    SignFlip,
    /// Strategy 2: exit as soon as the filter histogram magnitude shrinks.
    MomentumDecay,
}

impl Strategy {
    /// Evaluation order inside a cycle.
    pub const ALL: [Strategy; 2] = [Strategy::SignFlip, Strategy::MomentumDecay];

    /// Stable identifier used in messages and in the statistics file.
    pub fn id(self) -> &'static str {
        match self {
            Strategy::SignFlip      => "1",
            Strategy::MomentumDecay => "2",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Deduplication key: one notification per key for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignalKey {
    pub symbol:   String,
    pub side:     Side,
    pub strength: Strength,
}

/// Entry decision produced by the detector.
#[derive(Debug, Clone, PartialEq)]
pub struct EntrySignal {
    pub symbol:      String,
    pub side:        Side,
    pub strength:    Strength,
    /// Latest main-timeframe close
    pub price:       f64,
    /// Open time of the filter timeframe's last candle
    pub time:        DateTime<Utc>,
    pub filter_hist: f64,
    pub main_hist:   f64,
    /// Trailing filter-timeframe RSI values, oldest first
    pub rsi_window:  Vec<f64>,
}

impl EntrySignal {
    pub fn key(&self) -> SignalKey {
        SignalKey {
            symbol:   self.symbol.clone(),
            side:     self.side,
            strength: self.strength,
        }
    }

    /// The RSI extreme that decided the strength: min for LONG, max for SHORT.
    pub fn rsi_extreme(&self) -> f64 {
        let it = self.rsi_window.iter().copied();
        match self.side {
            Side::Long  => it.fold(f64::INFINITY, f64::min),
            Side::Short => it.fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

/// Simulated open position held in one ledger slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol:      String,
    pub side:        Side,
    pub entry_price: f64,
    pub entry_time:  DateTime<Utc>,
    /// Notional in $ before leverage
    pub size:        f64,
}

/// Terminal record of a closed position.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub strategy:   Strategy,
    pub position:   Position,
    pub exit_price: f64,
    pub gross_pnl:  f64,
    pub fee:        f64,
    pub net_pnl:    f64,
}
