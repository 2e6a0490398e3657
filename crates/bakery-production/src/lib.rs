//! # Bakery Production
//!
//! 生產工單生命週期：排程、預留、開工、完工消耗與餘量工單。

pub mod ledger;
pub mod state_machine;

#[cfg(test)]
mod testing;

// Re-export 主要類型
pub use ledger::{Consumption, ReservationLedger, StockMovement};
pub use state_machine::{OperationEvent, ProductionEngine, TransitionOutcome};
