mod api;
mod blockchain;
mod config;
mod error;
mod events;
mod service;

use actix_web::{App, HttpServer, rt, web};
use dotenvy::dotenv;
use log::{error, info};

use api::AppState;
use config::Config;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let config = Config::from_env();
    info!(
        "config: difficulty={}, pow_max_attempts={:?}, event_buffer={}",
        config.difficulty, config.pow_max_attempts, config.event_buffer
    );

    println!(
        "⛓️ Starting ledger API at http://{}:{}",
        config.host, config.port
    );

    let state = web::Data::new(AppState::new(&config));
    let server_state = state.clone();

    let server = HttpServer::new(move || {
        App::new()
            .app_data(server_state.clone())
            .configure(api::init_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .disable_signals()
    .run();

    // Cancel running searches first so the graceful stop is not held up by
    // requests still mining on the blocking pool.
    let handle = server.handle();
    rt::spawn(async move {
        if let Err(e) = rt::signal::ctrl_c().await {
            error!("failed to listen for ctrl-c: {e}");
            return;
        }
        state.ledger.shutdown();
        handle.stop(true).await;
    });

    server.await
}
