use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AppState, StatsResponse};

#[get("/stats/")]
pub async fn get_stats(state: web::Data<AppState>) -> impl Responder {
    let (height, difficulty, tip_hash, target, last) = {
        let bc = state.blockchain.lock().expect("mutex poisoned");
        (
            bc.len(),
            bc.difficulty(),
            bc.tip().current_hash.clone(),
            bc.target_block_time(),
            bc.last_mining_duration(),
        )
    };

    HttpResponse::Ok().json(StatsResponse {
        height,
        difficulty,
        tip_hash,
        target_block_time_secs: target.as_secs_f64(),
        last_mining_duration_secs: last.map(|d| d.as_secs_f64()),
        mining: state.miner.current_job(),
    })
}
