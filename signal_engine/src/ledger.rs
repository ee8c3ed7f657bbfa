/// ledger.rs — Position Ledger
///
/// One slot per (strategy, symbol).  A slot is either empty or holds exactly
/// one simulated position; `open` fills an empty slot, `close` settles and
/// empties an occupied one.  Anything else is rejected without side effects.
use ahash::AHashMap;
use chrono::{DateTime, Utc};
use tracing::warn;

use crate::config::RiskConfig;
use crate::error::LedgerError;
use crate::models::{ClosedTrade, Position, Side, Strategy};

#[derive(Debug, Clone)]
pub struct PositionLedger {
    risk:  RiskConfig,
    slots: AHashMap<(Strategy, String), Position>,
}

impl PositionLedger {
    pub fn new(risk: RiskConfig) -> Self {
        Self { risk, slots: AHashMap::new() }
    }

    pub fn get(&self, strategy: Strategy, symbol: &str) -> Option<&Position> {
        self.slots.get(&(strategy, symbol.to_owned()))
    }

    pub fn open_count(&self) -> usize {
        self.slots.len()
    }

    pub fn open(
        &mut self,
        strategy: Strategy,
        symbol:   &str,
        side:     Side,
        price:    f64,
        time:     DateTime<Utc>,
        size:     f64,
    ) -> Result<(), LedgerError> {
        let key = (strategy, symbol.to_owned());
        if self.slots.contains_key(&key) {
            warn!("open ignored: strategy {} already in {}", strategy, symbol);
            return Err(LedgerError::SlotOccupied { strategy, symbol: key.1 });
        }
        self.slots.insert(key, Position {
            symbol: symbol.to_owned(),
            side,
            entry_price: price,
            entry_time: time,
            size,
        });
        Ok(())
    }

    /// Settle the slot at `exit_price` and free it.
    pub fn close(
        &mut self,
        strategy:   Strategy,
        symbol:     &str,
        exit_price: f64,
    ) -> Result<ClosedTrade, LedgerError> {
        let Some(position) = self.slots.remove(&(strategy, symbol.to_owned())) else {
            warn!("close ignored: strategy {} has nothing in {}", strategy, symbol);
            return Err(LedgerError::SlotEmpty { strategy, symbol: symbol.to_owned() });
        };
        let s = self.risk.settle(position.side, position.entry_price, exit_price, position.size);
        Ok(ClosedTrade {
            strategy,
            position,
            exit_price,
            gross_pnl: s.gross,
            fee: s.fee,
            net_pnl: s.net,
        })
    }
}
