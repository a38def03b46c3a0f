//! Error types for the ledger.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChainError {
    #[error("difficulty must be between 1 and {max}, got {0}", max = crate::blockchain::DIFF_MAX)]
    InvalidDifficulty(u32),

    #[error("target block time must be a positive number of seconds, got {0}")]
    InvalidTargetBlockTime(f64),

    #[error("mining was cancelled")]
    MiningCancelled,

    #[error("another block is already being mined")]
    MinerBusy,

    #[error("miner is shutting down")]
    MinerShutDown,

    #[error("stale candidate #{candidate_index}: chain now expects block #{next_index}")]
    StaleCandidate { candidate_index: u64, next_index: u64 },

    #[error("invalid block #{index}: {reason}")]
    InvalidBlock { index: u64, reason: String },

    #[error("invalid value for {key}: {value:?}")]
    Config { key: &'static str, value: String },
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;
