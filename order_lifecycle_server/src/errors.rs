use std::time::Duration;

use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use order_lifecycle_engine::{OrderFlowError, WebhookError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Invalid request body. {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("The request timed out after {0:?}. The operation will still complete in the background.")]
    RequestTimeout(Duration),
    #[error("{0}")]
    OrderFlow(#[from] OrderFlowError),
    #[error("{0}")]
    Webhook(#[from] WebhookError),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::RequestTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::OrderFlow(e) => match e {
                OrderFlowError::OrderNotFound(_) => StatusCode::NOT_FOUND,
                OrderFlowError::TransitionNotAllowed { .. } |
                OrderFlowError::LockNotAcquired(_) |
                OrderFlowError::LockExpired(_) |
                OrderFlowError::TransitionConflict(_) => StatusCode::CONFLICT,
                OrderFlowError::InvalidOrder(_) => StatusCode::BAD_REQUEST,
                OrderFlowError::LeaseStoreError(_) |
                OrderFlowError::DatabaseError(_) |
                OrderFlowError::TaskFailed(..) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                },
            },
            Self::Webhook(e) => match e {
                WebhookError::Signature(_) => StatusCode::UNAUTHORIZED,
                WebhookError::MalformedPayload(_) |
                WebhookError::MissingIdentifiers |
                WebhookError::UnknownShippingStatus(_) => StatusCode::BAD_REQUEST,
                WebhookError::OrderNotFound(_) => StatusCode::NOT_FOUND,
                WebhookError::OrderNotShipping { .. } => StatusCode::CONFLICT,
                WebhookError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("💻️ {self}");
        }
        HttpResponse::build(status)
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}
