use actix_web::{HttpResponse, Responder, get, post, web};
use log::{debug, info};

use super::models::{AppState, CancelResponse, MiningStatusResponse};

/// Report the mining job in flight, if any.
#[get("/mining/")]
pub async fn get_mining_status(state: web::Data<AppState>) -> impl Responder {
    let job = state.miner.current_job();
    HttpResponse::Ok().json(MiningStatusResponse {
        mining: job.is_some(),
        job,
    })
}

/// Abort the mining job in flight. The pending `POST /blocks/` request
/// then fails with 409 and nothing is appended.
#[post("/mining/cancel/")]
pub async fn cancel_mining(state: web::Data<AppState>) -> impl Responder {
    match state.miner.cancel_current() {
        Some(job) => {
            info!("POST /mining/cancel/ - job {} (block #{})", job.job_id, job.index);
            HttpResponse::Ok().json(CancelResponse { cancelled: job })
        }
        None => {
            debug!("POST /mining/cancel/ - nothing to cancel");
            HttpResponse::NotFound().body("no mining job in progress")
        }
    }
}
