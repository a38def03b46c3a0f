//! Mining jobs that run off the request path.
//!
//! A `Miner` lets at most one block be mined at a time against a shared
//! `Blockchain`; a request that arrives while a job runs is refused rather
//! than queued. The chain lock is taken only to build the candidate and to
//! commit it, so readers keep working while the nonce search runs. Each job
//! carries a `CancelToken` that the search checks on every iteration.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, TryLockError};
use std::time::Instant;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use uuid::Uuid;

use super::Blockchain;
use crate::error::{ChainError, Result};

/// Shared flag used to abort an in-progress nonce search.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// The block currently being mined.
#[derive(Debug, Clone, Serialize)]
pub struct MiningJob {
    pub job_id: Uuid,
    pub index: u64,
    pub difficulty: u32,
    pub started_at: DateTime<Utc>,
    #[serde(skip)]
    cancel: CancelToken,
}

/// Summary of a block appended by `Miner::mine_next`.
#[derive(Debug, Clone, Serialize)]
pub struct MinedBlock {
    pub mined_index: u64,
    pub hash: String,
    pub nonce: u64,
    /// Difficulty for the *next* block, after retargeting.
    pub difficulty: u32,
    pub elapsed_secs: f64,
}

#[derive(Debug, Default)]
pub struct Miner {
    writer: Mutex<()>,
    current: Mutex<Option<MiningJob>>,
    closed: AtomicBool,
}

impl Miner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mine a block carrying `transactions` on top of `chain` and append it.
    /// Blocks the calling thread; run it on a blocking pool.
    ///
    /// Fails with `MinerBusy` if another job holds the miner and with
    /// `MinerShutDown` once `shutdown` has been called.
    pub fn mine_next(&self, chain: &Mutex<Blockchain>, transactions: Vec<String>) -> Result<MinedBlock> {
        let _writer = match self.writer.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => return Err(ChainError::MinerBusy),
            Err(TryLockError::Poisoned(_)) => panic!("mutex poisoned"),
        };
        let started = Instant::now();

        let (mut block, difficulty) = {
            let bc = chain.lock().expect("mutex poisoned");
            (bc.candidate(transactions), bc.difficulty())
        };

        let job = MiningJob {
            job_id: Uuid::new_v4(),
            index: block.index,
            difficulty,
            started_at: Utc::now(),
            cancel: CancelToken::new(),
        };
        let cancel = job.cancel.clone();
        debug!(
            "MINER - job {} started: block #{} txs={} diff={}",
            job.job_id,
            job.index,
            block.transactions.len(),
            difficulty
        );
        {
            // Checked under the job lock so `shutdown` cannot miss a job.
            let mut current = self.current.lock().expect("mutex poisoned");
            if self.closed.load(Ordering::Relaxed) {
                return Err(ChainError::MinerShutDown);
            }
            *current = Some(job.clone());
        }

        let outcome = block.mine_cancellable(difficulty, &cancel);
        self.current.lock().expect("mutex poisoned").take();

        if let Err(e) = outcome {
            warn!("MINER - job {} aborted: {}", job.job_id, e);
            return Err(e);
        }

        let mut bc = chain.lock().expect("mutex poisoned");
        let (mined_index, hash, nonce) = {
            let b = bc.commit(block, started)?;
            (b.index, b.current_hash.clone(), b.nonce)
        };
        let elapsed_secs = bc
            .last_mining_duration()
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();

        info!(
            "MINER - sealed block #{} (hash={}, nonce={}) in {:.3}s, next diff={}",
            mined_index,
            hash,
            nonce,
            elapsed_secs,
            bc.difficulty()
        );

        Ok(MinedBlock {
            mined_index,
            hash,
            nonce,
            difficulty: bc.difficulty(),
            elapsed_secs,
        })
    }

    /// Snapshot of the job in flight, if any.
    pub fn current_job(&self) -> Option<MiningJob> {
        self.current.lock().expect("mutex poisoned").clone()
    }

    /// Signal the job in flight to stop. Returns the job that was cancelled.
    pub fn cancel_current(&self) -> Option<MiningJob> {
        let current = self.current.lock().expect("mutex poisoned");
        let job = current.as_ref()?;
        job.cancel.cancel();
        info!("MINER - cancel requested for job {}", job.job_id);
        Some(job.clone())
    }

    /// Refuse new jobs and cancel the one in flight, if any.
    pub fn shutdown(&self) -> Option<MiningJob> {
        let current = self.current.lock().expect("mutex poisoned");
        self.closed.store(true, Ordering::Relaxed);
        let job = current.as_ref()?;
        job.cancel.cancel();
        info!("MINER - shutdown, cancelled job {}", job.job_id);
        Some(job.clone())
    }
}
