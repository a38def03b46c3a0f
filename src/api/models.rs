use crate::blockchain::{BlockRecord, Blockchain, Miner, MiningJob};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Shared application state: the chain plus the single-writer miner that
/// appends to it.
pub struct AppState {
    pub blockchain: Mutex<Blockchain>,
    pub miner: Miner,
}

impl AppState {
    pub fn new(blockchain: Blockchain) -> Self {
        Self {
            blockchain: Mutex::new(blockchain),
            miner: Miner::new(),
        }
    }
}

/* ---------- Chain API Models ---------- */

#[derive(Serialize)]
pub struct ChainResponse {
    pub length: usize,
    pub difficulty: u32,
    pub chain: Vec<BlockRecord>,
}

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub length: usize,
    pub difficulty: u32,
    pub error: Option<String>,
}

#[derive(Deserialize)]
pub struct NewBlockRequest {
    pub transactions: Vec<String>,
}

#[derive(Serialize)]
pub struct DifficultyResponse {
    pub difficulty: u32,
}

/* ---------- Mining API Models ---------- */

#[derive(Serialize)]
pub struct MiningStatusResponse {
    pub mining: bool,
    pub job: Option<MiningJob>,
}

#[derive(Serialize)]
pub struct CancelResponse {
    pub cancelled: MiningJob,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub height: usize,
    pub difficulty: u32,
    pub tip_hash: String,
    pub target_block_time_secs: f64,
    pub last_mining_duration_secs: Option<f64>,
    pub mining: Option<MiningJob>,
}
