use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Record store error: {0}")]
    RecordStoreError(#[from] sea_orm::DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid role for billing: {0}")]
    InvalidRoleError(String),

    #[error("Already subscribed: {0}")]
    AlreadySubscribedError(String),

    #[error("Payment gateway unavailable: {0}")]
    GatewayUnavailableError(String),

    #[error("Payment gateway rejected the request: {0}")]
    GatewayRejectedError(String),

    #[error("Subscription not found: {0}")]
    SubscriptionNotFoundError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        use actix_web::http::StatusCode;

        let (status_code, error_code, message) = match self {
            AppError::ValidationError(msg) => {
                log::warn!("Validation error: {msg}");
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::InvalidRoleError(msg) => {
                log::warn!("Invalid role for billing: {msg}");
                (StatusCode::BAD_REQUEST, "INVALID_ROLE", msg.clone())
            }
            AppError::AlreadySubscribedError(msg) => {
                log::warn!("Subscription rejected: {msg}");
                (StatusCode::CONFLICT, "ALREADY_SUBSCRIBED", msg.clone())
            }
            AppError::GatewayRejectedError(msg) => {
                log::warn!("Payment gateway rejected request: {msg}");
                (
                    StatusCode::PAYMENT_REQUIRED,
                    "GATEWAY_REJECTED",
                    msg.clone(),
                )
            }
            AppError::GatewayUnavailableError(msg) => {
                log::error!("Payment gateway unavailable: {msg}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "GATEWAY_UNAVAILABLE",
                    "Payment gateway unavailable, retry later".to_string(),
                )
            }
            AppError::SubscriptionNotFoundError(id) => {
                log::warn!("No record matches subscription {id}");
                (
                    StatusCode::NOT_FOUND,
                    "SUBSCRIPTION_NOT_FOUND",
                    format!("Subscription {id} not found"),
                )
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::RecordStoreError(err) => {
                log::error!("Record store error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "RECORD_STORE_ERROR",
                    "Record store error".to_string(),
                )
            }
            _ => {
                log::error!("Internal error: {self}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                )
            }
        };

        HttpResponse::build(status_code).json(json!({
            "success": false,
            "error": {
                "code": error_code,
                "message": message
            }
        }))
    }
}
