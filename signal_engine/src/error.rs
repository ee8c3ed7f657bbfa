/// error.rs — Ledger errors
///
///   SlotOccupied   open on a (strategy, symbol) that already holds a position
///   SlotEmpty      close on a (strategy, symbol) with nothing open
use thiserror::Error;

use crate::models::Strategy;

/// Rejected ledger operations.  The orchestrator only ever opens empty slots
/// and closes occupied ones, so either variant means a bookkeeping bug; the
/// ledger state is left untouched when one is returned.
#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    #[error("strategy {strategy} already holds a position in {symbol}")]
    SlotOccupied { strategy: Strategy, symbol: String },

    #[error("strategy {strategy} has no open position in {symbol}")]
    SlotEmpty { strategy: Strategy, symbol: String },
}
