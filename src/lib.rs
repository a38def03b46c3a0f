//! Single-process proof-of-work ledger with a self-adjusting difficulty
//! target, plus the HTTP routes that drive it.

pub mod api;
pub mod blockchain;
pub mod config;
pub mod error;

pub use blockchain::{Block, BlockRecord, Blockchain};
pub use error::{ChainError, Result};
