use actix_web::{App, HttpServer, rt, web};
use dotenvy::dotenv;
use log::info;
use std::io;

use pow_ledger::api::{self, AppState};
use pow_ledger::blockchain::Blockchain;
use pow_ledger::config::Settings;

#[actix_web::main]
async fn main() -> io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let settings = Settings::from_env().map_err(io::Error::other)?;
    let blockchain = Blockchain::new(settings.initial_difficulty, settings.target_block_time)
        .map_err(io::Error::other)?;
    info!(
        "Chain ready: difficulty={} target_block_time={:.3}s",
        blockchain.difficulty(),
        settings.target_block_time.as_secs_f64()
    );

    let Settings { host, port, .. } = settings;
    println!("⛓️ Starting blockchain API at http://{host}:{port}");

    let state = web::Data::new(AppState::new(blockchain));
    let server_state = state.clone();

    let server = HttpServer::new(move || {
        App::new()
            .app_data(server_state.clone())
            .configure(api::init_routes)
    })
    .bind((host.as_str(), port))?
    .run();

    // Graceful shutdown waits for in-flight requests, and a pending
    // `POST /blocks/` only returns once its nonce search stops.
    let signal_state = state.clone();
    rt::spawn(async move {
        if rt::signal::ctrl_c().await.is_ok() {
            if let Some(job) = signal_state.miner.shutdown() {
                info!("Shutdown: cancelled mining job {}", job.job_id);
            }
        }
    });

    server.await?;

    // Covers stops that did not come through Ctrl-C.
    if let Some(job) = state.miner.shutdown() {
        info!("Shutdown: cancelled mining job {}", job.job_id);
    }
    Ok(())
}
