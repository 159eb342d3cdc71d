use actix_web::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use actix_web::{HttpResponse, get, web};
use futures::stream;
use log::{info, warn};
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use super::models::AppState;
use crate::events::LedgerEvent;

/// Encode one event as a Server-Sent Events frame.
pub fn sse_frame(event: &LedgerEvent) -> serde_json::Result<web::Bytes> {
    let data = event.data()?;
    Ok(web::Bytes::from(format!(
        "event: {}\ndata: {}\n\n",
        event.name(),
        data
    )))
}

/// Server-Sent Events feed: the full chain first, then every admitted block.
/// A subscriber that falls behind the channel gets a fresh full snapshot and
/// continues from there.
#[get("/events/")]
pub async fn stream_events(state: web::Data<AppState>) -> HttpResponse {
    let subscriber = Uuid::new_v4();
    let (snapshot, rx) = state.ledger.subscribe();
    info!(
        "EVENTS - subscriber {subscriber} attached (chain length {})",
        snapshot.len()
    );

    let first = Some(LedgerEvent::ChainUpdated(snapshot));
    let frames = stream::unfold((first, rx), move |(pending, mut rx)| {
        let state = state.clone();
        async move {
            if let Some(event) = pending {
                return Some((sse_frame(&event), (None, rx)));
            }
            let received = rx.recv().await;
            let event = match received {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    warn!("EVENTS - subscriber {subscriber} lagged by {skipped}, resending chain");
                    // Blocks still buffered in the old receiver are in the snapshot.
                    let (snapshot, fresh) = state.ledger.subscribe();
                    rx = fresh;
                    LedgerEvent::ChainUpdated(snapshot)
                }
                Err(RecvError::Closed) => {
                    info!("EVENTS - subscriber {subscriber} stream closed");
                    return None;
                }
            };
            Some((sse_frame(&event), (None, rx)))
        }
    });

    HttpResponse::Ok()
        .insert_header((CONTENT_TYPE, "text/event-stream"))
        .insert_header((CACHE_CONTROL, "no-cache"))
        .streaming(frames)
}
