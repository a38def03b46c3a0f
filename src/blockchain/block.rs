use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{CancelToken, GENESIS_PREVIOUS_HASH, GENESIS_TRANSACTION};
use crate::error::{ChainError, Result};

/// Human-readable timestamp used by `BlockRecord`.
const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f UTC";

/// A single block in the chain holding a list of opaque text transactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: DateTime<Utc>, // millisecond precision
    pub transactions: Vec<String>,
    pub previous_hash: String,
    pub nonce: u64,           // Proof-of-Work nonce
    pub current_hash: String, // Cached hash of the block
}

/// Display form of a block, as returned by `Blockchain::dump`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockRecord {
    pub index: u64,
    pub timestamp: String,
    pub transactions: Vec<String>,
    pub previous_hash: String,
    pub current_hash: String,
    pub nonce: u64,
}

impl Block {
    /// Create the genesis block (not mined yet).
    pub fn genesis() -> Self {
        Self::new(
            0,
            vec![GENESIS_TRANSACTION.to_string()],
            GENESIS_PREVIOUS_HASH.to_string(),
        )
    }

    /// Create a new block (not mined yet). Call `mine()` to perform PoW.
    pub fn new(index: u64, transactions: Vec<String>, previous_hash: String) -> Self {
        let mut block = Self {
            index,
            // Truncated so the canonical preimage text round-trips exactly.
            timestamp: Utc::now().trunc_subsecs(3),
            transactions,
            previous_hash,
            nonce: 0,
            current_hash: String::new(),
        };
        block.current_hash = block.compute_hash();
        block
    }

    /// Compute the SHA-256 hash of this block using its fields
    /// (excluding `current_hash` itself). The timestamp enters the preimage
    /// as RFC 3339 with milliseconds and the transactions as a compact JSON
    /// array, so the digest depends on their order.
    pub fn compute_hash(&self) -> String {
        let txs_json = serde_json::to_string(&self.transactions).expect("serialize txs");
        let preimage = format!(
            "{}:{}:{}:{}:{}",
            self.index,
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            txs_json,
            self.previous_hash,
            self.nonce
        );
        let mut hasher = Sha256::new();
        hasher.update(preimage.as_bytes());
        let digest = hasher.finalize();
        hex::encode(digest)
    }

    /// Whether the cached hash starts with `difficulty` zero characters.
    pub fn meets_difficulty(&self, difficulty: u32) -> bool {
        let difficulty = difficulty as usize;
        self.current_hash.len() >= difficulty
            && self.current_hash.bytes().take(difficulty).all(|c| c == b'0')
    }

    /// Perform Proof-of-Work by finding a nonce that yields a hash
    /// starting with `difficulty` leading zeros (in hex).
    ///
    /// There is no iteration cap: at a high enough difficulty this blocks
    /// the calling thread indefinitely. Use `mine_cancellable` when the
    /// search must be abortable.
    pub fn mine(&mut self, difficulty: u32) {
        self.search(difficulty, None);
    }

    /// Same search as `mine`, checking `cancel` once per nonce. On
    /// cancellation the block is left half-mined and must be discarded.
    pub fn mine_cancellable(&mut self, difficulty: u32, cancel: &CancelToken) -> Result<()> {
        if self.search(difficulty, Some(cancel)) {
            Ok(())
        } else {
            Err(ChainError::MiningCancelled)
        }
    }

    fn search(&mut self, difficulty: u32, cancel: Option<&CancelToken>) -> bool {
        while !self.meets_difficulty(difficulty) {
            if cancel.is_some_and(CancelToken::is_cancelled) {
                return false;
            }
            self.nonce = self.nonce.wrapping_add(1);
            self.current_hash = self.compute_hash();
        }
        true
    }

    /// Validate that the block's cached hash matches its content.
    /// (Does NOT validate chain linkage.)
    pub fn has_valid_hash(&self) -> bool {
        self.current_hash == self.compute_hash()
    }

    pub fn to_record(&self) -> BlockRecord {
        BlockRecord {
            index: self.index,
            timestamp: self.timestamp.format(DISPLAY_TIME_FORMAT).to_string(),
            transactions: self.transactions.clone(),
            previous_hash: self.previous_hash.clone(),
            current_hash: self.current_hash.clone(),
            nonce: self.nonce,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Block;
    use crate::blockchain::{CancelToken, GENESIS_PREVIOUS_HASH};
    use crate::error::ChainError;

    fn txs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn genesis_has_valid_hash() {
        let b = Block::genesis();
        assert_eq!(b.index, 0);
        assert_eq!(b.previous_hash, GENESIS_PREVIOUS_HASH);
        assert_eq!(b.transactions, txs(&["Genesis Block"]));
        assert_eq!(b.nonce, 0);
        assert!(b.has_valid_hash());
        assert_eq!(b.current_hash.len(), 64);
    }

    #[test]
    fn hash_is_deterministic() {
        let b = Block::new(3, txs(&["a", "b"]), "prev".into());
        let first = b.compute_hash();
        assert_eq!(first, b.compute_hash());
        assert_eq!(first, b.clone().compute_hash());
    }

    #[test]
    fn transaction_order_changes_hash() {
        let mut b = Block::new(1, txs(&["a", "b"]), "prev".into());
        let before = b.compute_hash();
        b.transactions.reverse();
        assert_ne!(before, b.compute_hash());
    }

    #[test]
    fn mining_produces_leading_zeros() {
        for difficulty in 0..=4 {
            let mut b = Block::new(1, txs(&["x"]), "prev".into());
            b.mine(difficulty);
            let prefix = "0".repeat(difficulty as usize);
            assert!(b.current_hash.starts_with(&prefix), "difficulty {difficulty}");
            assert!(b.meets_difficulty(difficulty));
            assert!(b.has_valid_hash());
        }
    }

    #[test]
    fn zero_difficulty_keeps_initial_nonce() {
        let mut b = Block::new(1, txs(&["x"]), "prev".into());
        let hash = b.current_hash.clone();
        b.mine(0);
        assert_eq!(b.nonce, 0);
        assert_eq!(b.current_hash, hash);
    }

    #[test]
    fn cancelled_search_stops() {
        let token = CancelToken::new();
        token.cancel();
        let mut b = Block::new(1, txs(&["x"]), "prev".into());
        // 64 zeros is unreachable, so only the token can end the search.
        let res = b.mine_cancellable(64, &token);
        assert_eq!(res, Err(ChainError::MiningCancelled));
    }

    #[test]
    fn uncancelled_search_completes() {
        let token = CancelToken::new();
        let mut b = Block::new(1, txs(&["x"]), "prev".into());
        assert!(b.mine_cancellable(2, &token).is_ok());
        assert!(b.current_hash.starts_with("00"));
    }

    #[test]
    fn invalid_when_mutated() {
        let mut b = Block::new(2, txs(&["pay bob 5"]), "prev".into());
        b.mine(2);
        let old_hash = b.current_hash.clone();

        // Mutate: add a new tx (tampering)
        b.transactions.push("pay mallory 500".into());

        assert_ne!(old_hash, b.compute_hash());
        assert!(!b.has_valid_hash());
    }

    #[test]
    fn serde_round_trip_keeps_hash() {
        let mut b = Block::new(5, txs(&["a"]), "prev".into());
        b.mine(1);
        let json = serde_json::to_string(&b).unwrap();
        let back: Block = serde_json::from_str(&json).unwrap();
        assert_eq!(back.timestamp, b.timestamp);
        assert!(back.has_valid_hash());
    }

    #[test]
    fn record_formats_timestamp_for_display() {
        let b = Block::genesis();
        let rec = b.to_record();
        assert!(rec.timestamp.ends_with(" UTC"));
        assert_eq!(rec.current_hash, b.current_hash);
        assert_eq!(rec.transactions, b.transactions);
    }
}
