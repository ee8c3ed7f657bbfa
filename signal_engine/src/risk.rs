/// risk.rs — Position sizing and round-trip settlement
///
///   raw  = (exit − entry) · size · L / entry          (negated for SHORT)
///   fee  = size · L · (entry + exit) · f_taker / 2 / exit
///   net  = raw − fee
///
/// The fee term approximates taker fees charged on the leveraged notional at
/// both legs.  It is always subtracted, whatever the side.
use crate::config::RiskConfig;
use crate::models::{Side, Strength};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settlement {
    pub gross: f64,
    pub fee:   f64,
    pub net:   f64,
}

impl RiskConfig {
    /// Notional opened for a signal of the given strength.
    pub fn size_for(&self, strength: Strength) -> f64 {
        match strength {
            Strength::Strong => self.size_strong,
            Strength::Weak   => self.size_weak,
        }
    }

    pub fn settle(&self, side: Side, entry_price: f64, exit_price: f64, size: f64) -> Settlement {
        let notional = size * self.leverage;
        let mut gross = (exit_price - entry_price) * notional / entry_price;
        if side == Side::Short {
            gross = -gross;
        }
        let fee = notional * (entry_price + exit_price) * self.taker_fee / 2.0 / exit_price;
        Settlement { gross, fee, net: gross - fee }
    }
}
