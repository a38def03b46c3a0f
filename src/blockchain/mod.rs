pub mod block;
pub mod miner;
pub mod model;

pub use block::{Block, BlockRecord};
pub use miner::{CancelToken, MinedBlock, Miner, MiningJob};
pub use model::Blockchain;

/// Default Proof-of-Work difficulty (number of leading zeros).
pub const DEFAULT_DIFFICULTY: u32 = 2;

/// Target seconds per block for auto-adjust
pub const DEFAULT_TARGET_BLOCK_TIME_SECS: f64 = 1.0;

/// Difficulty bounds. A SHA-256 hex digest has 64 characters, so no
/// prefix longer than that can ever be satisfied.
pub const DIFF_MIN: u32 = 1;
pub const DIFF_MAX: u32 = 64;

/// Upper bound on transactions accepted in one block request.
pub const MAX_TXS_PER_BLOCK: usize = 1_000;

/// `previous_hash` of the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Sentinel transaction carried by the genesis block.
pub const GENESIS_TRANSACTION: &str = "Genesis Block";
