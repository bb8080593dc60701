pub mod api;
pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
pub mod seed;
pub mod storage;

pub use error::{LedgerError, LedgerResult};
pub use ledger::VisitLedger;
