use axum::response::{IntoResponse, Response};
use axum::{Json, http::StatusCode};
use care_core::{NormalizeError, NotifyError};
use care_store::StoreError;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum IngressError {
    #[error("failed to normalize webhook event")]
    Normalize(#[from] NormalizeError),
    #[error("failed to persist record")]
    Store(#[from] StoreError),
    #[error("Phone number is required")]
    MissingPhone,
    #[error("Failed to send feedback request")]
    Notify(#[from] NotifyError),
}

impl IngressError {
    pub fn status(&self) -> StatusCode {
        match self {
            IngressError::MissingPhone => StatusCode::BAD_REQUEST,
            IngressError::Normalize(_) | IngressError::Store(_) | IngressError::Notify(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn message(&self) -> String {
        match self {
            IngressError::Normalize(_) | IngressError::Store(_) => {
                "Failed to process webhook event".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for IngressError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message(),
        });
        (self.status(), body).into_response()
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}
