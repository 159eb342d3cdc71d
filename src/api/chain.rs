use actix_web::{Either, Error, HttpResponse, Responder, get, post, web};
use log::{debug, info, warn};

use super::models::{AppState, ChainResponse, SubmitRequest, ValidateResponse, ViolationReport};
use crate::blockchain::Block;
use crate::error::LedgerError;

/// Get the full blockchain.
#[get("/chain/")]
pub async fn get_chain(state: web::Data<AppState>) -> impl Responder {
    let bc = state.ledger.chain();
    let resp = ChainResponse {
        length: bc.len(),
        difficulty: bc.difficulty(),
        chain: bc.chain(),
    };
    HttpResponse::Ok().json(resp)
}

/// Get a single block by position.
#[get("/blocks/{index}/")]
pub async fn get_block(state: web::Data<AppState>, path: web::Path<(u64,)>) -> impl Responder {
    let index = path.into_inner().0;
    match state.ledger.get_block(index) {
        Some(block) => HttpResponse::Ok().json(block),
        None => HttpResponse::NotFound().body(format!("no block at index {index}")),
    }
}

/// Submit a payload (JSON or HTML form): build a candidate on the tail,
/// mine it on the blocking pool and append it.
#[post("/blocks/")]
pub async fn submit_block(
    state: web::Data<AppState>,
    body: Either<web::Json<SubmitRequest>, web::Form<SubmitRequest>>,
) -> Result<HttpResponse, Error> {
    let payload = match body {
        Either::Left(json) => json.into_inner().payload,
        Either::Right(form) => form.into_inner().payload,
    };
    debug!("POST /blocks/ - received payload ({} bytes)", payload.len());

    let worker_state = state.clone();
    let block = web::block(move || worker_state.ledger.submit_payload(payload)).await??;

    info!("POST /blocks/ - admitted block #{}", block.index);
    Ok(HttpResponse::Ok().json(block))
}

/// Append a block mined elsewhere. Its hash and difficulty are checked here,
/// linkage by the ledger.
#[post("/blocks/premined/")]
pub async fn submit_premined(
    state: web::Data<AppState>,
    body: web::Json<Block>,
) -> Result<HttpResponse, Error> {
    let block = body.into_inner();
    let difficulty = state.ledger.chain().difficulty();
    if !block.has_valid_hash() {
        warn!("POST /blocks/premined/ - hash mismatch for block #{}", block.index);
        return Ok(HttpResponse::BadRequest().body("hash mismatch"));
    }
    if !block.meets_difficulty(difficulty) {
        warn!("POST /blocks/premined/ - block #{} below difficulty {difficulty}", block.index);
        return Ok(HttpResponse::BadRequest().body("hash does not meet difficulty"));
    }

    let worker_state = state.clone();
    let block = web::block(move || worker_state.ledger.admit(block)).await??;

    info!("POST /blocks/premined/ - accepted block #{}", block.index);
    Ok(HttpResponse::Ok().json(block))
}

/// Validate the whole chain.
#[get("/validate/")]
pub async fn validate_chain(state: web::Data<AppState>) -> impl Responder {
    let bc = state.ledger.chain();
    let violation = match bc.verify() {
        Ok(()) => None,
        Err(LedgerError::IntegrityViolation { index, kind }) => Some(ViolationReport {
            index,
            reason: kind.to_string(),
        }),
        Err(other) => Some(ViolationReport {
            index: 0,
            reason: other.to_string(),
        }),
    };
    let resp = ValidateResponse {
        valid: violation.is_none(),
        length: bc.len(),
        difficulty: bc.difficulty(),
        violation,
    };
    HttpResponse::Ok().json(resp)
}
