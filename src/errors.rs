use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde_json::json;
use thiserror::Error;

use crate::domain::errors::{BackendError, DomainError, SubmissionRejection};
use crate::domain::order::SubmitBlocker;
use crate::handlers::sessions::BlockerResponse;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Order cannot be submitted yet")]
    Blocked(Vec<SubmitBlocker>),

    #[error("Order was rejected")]
    Rejected(SubmissionRejection),

    #[error("{0}")]
    Backend(String),
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::SessionNotFound(_)
            | DomainError::ItemNotFound(_)
            | DomainError::OrderNotFound(_)
            | DomainError::SessionClosed => AppError::NotFound(e.to_string()),
            DomainError::SubmitBlocked(blockers) => AppError::Blocked(blockers),
            DomainError::SubmissionRejected(rejection) => AppError::Rejected(rejection),
            DomainError::Backend(BackendError::Rejected(msg)) => AppError::BadRequest(msg),
            DomainError::Backend(err) => AppError::Backend(err.to_string()),
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Blocked(_) => StatusCode::CONFLICT,
            AppError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Backend(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::Blocked(blockers) => json!({
                "error": self.to_string(),
                "blockers": blockers.iter().map(BlockerResponse::from).collect::<Vec<_>>(),
            }),
            AppError::Rejected(rejection) => json!({
                "error": self.to_string(),
                "general": rejection.general,
                "items": rejection.items.iter().map(|e| json!({
                    "index": e.index,
                    "item_id": e.item_id,
                    "field": e.field,
                    "message": e.message,
                })).collect::<Vec<_>>(),
            }),
            _ => json!({ "error": self.to_string() }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
