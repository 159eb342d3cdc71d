use serde::{Deserialize, Serialize};

use crate::blockchain::Block;
use crate::config::Config;
use crate::service::LedgerService;

/// Shared application state: one ledger service per process.
pub struct AppState {
    pub ledger: LedgerService,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            ledger: LedgerService::new(config),
        }
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub height: usize,
}

/* ---------- Chain API Models ---------- */

#[derive(Serialize)]
pub struct ChainResponse<'a> {
    pub length: usize,
    pub difficulty: u32,
    pub chain: &'a [Block],
}

#[derive(Deserialize)]
pub struct SubmitRequest {
    pub payload: String,
}

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub length: usize,
    pub difficulty: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violation: Option<ViolationReport>,
}

#[derive(Serialize)]
pub struct ViolationReport {
    pub index: u64,
    pub reason: String,
}

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub detail: String,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub height: usize,
    pub difficulty: u32,
    pub last_interval_ms: Option<i64>,
    pub avg_interval_ms: Option<f64>,
    pub subscribers: usize,
}
