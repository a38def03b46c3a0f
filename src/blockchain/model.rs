use std::cmp::Ordering;
use std::time::{Duration, Instant};

use log::info;

use super::{Block, BlockRecord, CancelToken, DIFF_MAX, DIFF_MIN, GENESIS_PREVIOUS_HASH};
use crate::error::{ChainError, Result};

/// Simple in-memory blockchain with Proof-of-Work and a reactive
/// difficulty controller.
#[derive(Debug)]
pub struct Blockchain {
    chain: Vec<Block>,
    difficulty: u32,
    target_block_time: Duration,
    last_mining_duration: Option<Duration>,
}

/// Turn a configured number of seconds into a block time target.
pub fn target_from_secs(secs: f64) -> Result<Duration> {
    match Duration::try_from_secs_f64(secs) {
        Ok(d) if !d.is_zero() => Ok(d),
        _ => Err(ChainError::InvalidTargetBlockTime(secs)),
    }
}

impl Blockchain {
    /// Initialize a new blockchain with a genesis block mined at
    /// `initial_difficulty`.
    pub fn new(initial_difficulty: u32, target_block_time: Duration) -> Result<Self> {
        if !(DIFF_MIN..=DIFF_MAX).contains(&initial_difficulty) {
            return Err(ChainError::InvalidDifficulty(initial_difficulty));
        }
        if target_block_time.is_zero() {
            return Err(ChainError::InvalidTargetBlockTime(0.0));
        }

        let mut genesis = Block::genesis();
        genesis.mine(initial_difficulty);
        info!(
            "Genesis block mined: {} (difficulty={})",
            genesis.current_hash, initial_difficulty
        );

        Ok(Self {
            chain: vec![genesis],
            difficulty: initial_difficulty,
            target_block_time,
            last_mining_duration: None,
        })
    }

    /// Return the last block in the chain.
    pub fn tip(&self) -> &Block {
        self.chain
            .last()
            .expect("Blockchain should always have at least the genesis block")
    }

    /// Mine and append a new block carrying `transactions`, then retarget.
    /// Blocks until a nonce is found.
    pub fn add_block(&mut self, transactions: Vec<String>) -> &Block {
        let started = Instant::now();
        let mut block = self.candidate(transactions);
        block.mine(self.difficulty);
        self.append(block, started)
    }

    /// Like `add_block`, but gives up when `cancel` fires. A cancelled call
    /// leaves the chain, difficulty and timing untouched.
    pub fn add_block_cancellable(
        &mut self,
        transactions: Vec<String>,
        cancel: &CancelToken,
    ) -> Result<&Block> {
        let started = Instant::now();
        let mut block = self.candidate(transactions);
        block.mine_cancellable(self.difficulty, cancel)?;
        Ok(self.append(block, started))
    }

    /// Build the next (unmined) block on top of the current tip.
    pub fn candidate(&self, transactions: Vec<String>) -> Block {
        Block::new(
            self.chain.len() as u64,
            transactions,
            self.tip().current_hash.clone(),
        )
    }

    /// Append a block that was mined outside the chain's lock.
    /// `started` is when the caller began building it, so the recorded
    /// duration covers construction and the nonce search.
    pub fn commit(&mut self, block: Block, started: Instant) -> Result<&Block> {
        let next_index = self.chain.len() as u64;
        if block.index != next_index || block.previous_hash != self.tip().current_hash {
            return Err(ChainError::StaleCandidate {
                candidate_index: block.index,
                next_index,
            });
        }
        if !block.has_valid_hash() {
            return Err(ChainError::InvalidBlock {
                index: block.index,
                reason: "hash does not match block contents".into(),
            });
        }
        if !block.meets_difficulty(self.difficulty) {
            return Err(ChainError::InvalidBlock {
                index: block.index,
                reason: format!("hash does not meet difficulty {}", self.difficulty),
            });
        }
        Ok(self.append(block, started))
    }

    fn append(&mut self, block: Block, started: Instant) -> &Block {
        info!("Block mined: #{} {}", block.index, block.current_hash);
        self.chain.push(block);

        let elapsed = started.elapsed();
        self.last_mining_duration = Some(elapsed);
        info!("Time taken to mine block: {:.6} seconds", elapsed.as_secs_f64());

        self.adjust_difficulty();
        self.tip()
    }

    /// Single-step retarget from the last measured mining time.
    pub fn adjust_difficulty(&mut self) {
        // Only reachable before the first add; every add records a duration first.
        let Some(taken) = self.last_mining_duration else {
            return;
        };

        match taken.cmp(&self.target_block_time) {
            Ordering::Less => {
                self.difficulty = (self.difficulty + 1).min(DIFF_MAX);
                info!(
                    "Block mined too fast, increasing difficulty to {}",
                    self.difficulty
                );
            }
            Ordering::Greater => {
                self.difficulty = self.difficulty.saturating_sub(1).max(DIFF_MIN);
                info!(
                    "Block mined too slow, decreasing difficulty to {}",
                    self.difficulty
                );
            }
            Ordering::Equal => {}
        }
    }

    /// Validate the entire chain: genesis, index continuity, hashes and
    /// linkage. Reports the first offending block.
    pub fn validate(&self) -> Result<()> {
        let Some(genesis) = self.chain.first() else {
            return Err(ChainError::InvalidBlock {
                index: 0,
                reason: "chain is empty".into(),
            });
        };
        if genesis.index != 0 || genesis.previous_hash != GENESIS_PREVIOUS_HASH {
            return Err(ChainError::InvalidBlock {
                index: 0,
                reason: "genesis block header was altered".into(),
            });
        }
        if !genesis.has_valid_hash() {
            return Err(ChainError::InvalidBlock {
                index: 0,
                reason: "hash does not match block contents".into(),
            });
        }

        for (i, pair) in self.chain.windows(2).enumerate() {
            let (prev, current) = (&pair[0], &pair[1]);
            let position = i as u64 + 1;

            if current.index != position {
                return Err(ChainError::InvalidBlock {
                    index: position,
                    reason: format!("stored index {} out of sequence", current.index),
                });
            }
            if !current.has_valid_hash() {
                return Err(ChainError::InvalidBlock {
                    index: position,
                    reason: "hash does not match block contents".into(),
                });
            }
            if current.previous_hash != prev.current_hash {
                return Err(ChainError::InvalidBlock {
                    index: position,
                    reason: "previous_hash does not link to predecessor".into(),
                });
            }
        }

        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Ordered display records of every block.
    pub fn dump(&self) -> Vec<BlockRecord> {
        self.chain.iter().map(Block::to_record).collect()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn target_block_time(&self) -> Duration {
        self.target_block_time
    }

    pub fn last_mining_duration(&self) -> Option<Duration> {
        self.last_mining_duration
    }

    #[cfg(test)]
    pub(crate) fn set_difficulty(&mut self, difficulty: u32) {
        self.difficulty = difficulty;
    }
}
