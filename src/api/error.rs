use actix_web::{HttpResponse, ResponseError, http::StatusCode};

use super::models::ErrorResponse;
use crate::error::LedgerError;

impl ResponseError for LedgerError {
    fn status_code(&self) -> StatusCode {
        match self {
            LedgerError::LinkageMismatch { .. } => StatusCode::CONFLICT,
            LedgerError::IndexMismatch { .. } => StatusCode::BAD_REQUEST,
            LedgerError::PowCancelled { .. } | LedgerError::PowBudgetExhausted { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            LedgerError::IntegrityViolation { .. } | LedgerError::EmptyChain => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: "failed to add block".to_string(),
            detail: self.to_string(),
        })
    }
}
