use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AppState, StatsResponse};

/// How many recent block intervals the average covers.
pub const STATS_WINDOW: usize = 10;

#[get("/stats/")]
pub async fn get_stats(state: web::Data<AppState>) -> impl Responder {
    let (height, difficulty, last_interval, avg_interval) = {
        let bc = state.ledger.chain();
        let chain = bc.chain();
        let intervals: Vec<i64> = chain
            .windows(2)
            .map(|w| (w[1].timestamp - w[0].timestamp).max(0))
            .collect();

        let last = intervals.last().copied();
        let recent = &intervals[intervals.len().saturating_sub(STATS_WINDOW)..];
        let avg = if recent.is_empty() {
            None
        } else {
            Some(recent.iter().sum::<i64>() as f64 / recent.len() as f64)
        };

        (bc.len(), bc.difficulty(), last, avg)
    };

    HttpResponse::Ok().json(StatsResponse {
        height,
        difficulty,
        last_interval_ms: last_interval,
        avg_interval_ms: avg_interval,
        subscribers: state.ledger.events().subscriber_count(),
    })
}
