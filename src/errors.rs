use actix_web::{http::StatusCode, HttpResponse};
use log::error;
use thiserror::Error;

use crate::application::CheckoutError;
use crate::domain::errors::DomainError;
use crate::webhook::EnvelopeError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    BadGateway(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotFound => AppError::NotFound,
            DomainError::InvalidInput(msg) => AppError::BadRequest(msg),
            DomainError::InvalidTransition(msg) => AppError::Conflict(msg),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<EnvelopeError> for AppError {
    fn from(e: EnvelopeError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl From<CheckoutError> for AppError {
    fn from(e: CheckoutError) -> Self {
        match e {
            CheckoutError::UnknownPlan(_) | CheckoutError::InvalidEmail | CheckoutError::CustomDataTooLong => {
                AppError::BadRequest(e.to_string())
            },
            CheckoutError::NotConfigured => AppError::Unavailable(e.to_string()),
            CheckoutError::Gateway(e) => AppError::BadGateway(format!("Payment gateway error: {e}")),
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::Internal(msg) => {
                error!("Request failed: {msg}");
                "Internal server error".to_string()
            },
            AppError::BadGateway(msg) => {
                error!("{msg}");
                "Payment gateway unavailable".to_string()
            },
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(serde_json::json!({ "error": message }))
    }
}
