use actix_web::{HttpResponse, get, web};

use super::models::{AppState, HealthResponse};

/// Liveness plus current height. Reports `stopping` with 503 once mining has
/// been cancelled so a balancer can drain the node.
#[get("/health/")]
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let height = state.ledger.chain().len();
    if state.ledger.is_shutting_down() {
        return HttpResponse::ServiceUnavailable().json(HealthResponse {
            status: "stopping",
            height,
        });
    }
    HttpResponse::Ok().json(HealthResponse { status: "ok", height })
}
