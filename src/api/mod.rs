mod chain;
mod error;
mod events;
mod health;
pub mod models;
mod stats;

use actix_web::web::{self, ServiceConfig};

pub use models::AppState;

pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(health::health_check)
            .service(chain::get_chain)
            .service(chain::get_block)
            .service(chain::submit_premined)
            .service(chain::submit_block)
            .service(chain::validate_chain)
            .service(stats::get_stats)
            .service(events::stream_events),
    );
}
