use crate::blockchain::MAX_TXS_PER_BLOCK;
use crate::error::ChainError;
use actix_web::{HttpResponse, Responder, get, post, web};
use log::{debug, warn};

use super::models::{
    AppState, ChainResponse, DifficultyResponse, NewBlockRequest, ValidateResponse,
};

/// Get the full blockchain.
#[get("/chain/")]
pub async fn get_chain(state: web::Data<AppState>) -> impl Responder {
    let bc = state.blockchain.lock().expect("mutex poisoned");
    let resp = ChainResponse {
        length: bc.len(),
        difficulty: bc.difficulty(),
        chain: bc.dump(),
    };
    HttpResponse::Ok().json(resp)
}

/// Validate the whole chain.
#[get("/validate/")]
pub async fn validate_chain(state: web::Data<AppState>) -> impl Responder {
    let bc = state.blockchain.lock().expect("mutex poisoned");
    let result = bc.validate();
    if let Err(e) = &result {
        warn!("GET /validate/ - chain is invalid: {e}");
    }
    let resp = ValidateResponse {
        valid: result.is_ok(),
        length: bc.len(),
        difficulty: bc.difficulty(),
        error: result.err().map(|e| e.to_string()),
    };
    HttpResponse::Ok().json(resp)
}

/// Mine a new block carrying the given transactions and append it.
/// The nonce search runs on the blocking pool; the request completes once
/// the block is sealed. It fails with 409 if the job is cancelled or if
/// another block is already being mined (requests are not queued).
#[post("/blocks/")]
pub async fn add_block(
    state: web::Data<AppState>,
    req: web::Json<NewBlockRequest>,
) -> impl Responder {
    let transactions = req.into_inner().transactions;
    if transactions.len() > MAX_TXS_PER_BLOCK {
        warn!(
            "POST /blocks/ - rejected: {} txs (max {})",
            transactions.len(),
            MAX_TXS_PER_BLOCK
        );
        return HttpResponse::BadRequest()
            .body(format!("at most {MAX_TXS_PER_BLOCK} transactions per block"));
    }
    debug!("POST /blocks/ - received {} txs", transactions.len());

    let worker = state.clone();
    let outcome =
        web::block(move || worker.miner.mine_next(&worker.blockchain, transactions)).await;

    match outcome {
        Ok(Ok(mined)) => HttpResponse::Ok().json(mined),
        Ok(Err(
            e @ (ChainError::MiningCancelled
            | ChainError::MinerBusy
            | ChainError::MinerShutDown
            | ChainError::StaleCandidate { .. }),
        )) => {
            warn!("POST /blocks/ - {e}");
            HttpResponse::Conflict().body(e.to_string())
        }
        Ok(Err(e)) => {
            warn!("POST /blocks/ - {e}");
            HttpResponse::InternalServerError().body(e.to_string())
        }
        Err(e) => {
            warn!("POST /blocks/ - mining worker failed: {e}");
            HttpResponse::InternalServerError().body("mining worker failed")
        }
    }
}

/// Get current PoW difficulty.
#[get("/difficulty/")]
pub async fn get_difficulty(state: web::Data<AppState>) -> impl Responder {
    let bc = state.blockchain.lock().expect("mutex poisoned");
    HttpResponse::Ok().json(DifficultyResponse {
        difficulty: bc.difficulty(),
    })
}
