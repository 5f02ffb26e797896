use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::SimError;
use crate::feed::backend::BackendError;

/// Handler failure, rendered as `{"detail": ...}`.
#[derive(Debug)]
pub enum ApiError {
    Sim(SimError),
    Backend(BackendError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Sim(SimError::SituationNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Sim(SimError::InvalidQuery(_)) => StatusCode::BAD_REQUEST,
            ApiError::Sim(SimError::MalformedRow { .. } | SimError::StoreStatus { .. } | SimError::DataStore(_)) => {
                StatusCode::BAD_GATEWAY
            }
            ApiError::Backend(BackendError::Unreachable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Backend(BackendError::InvalidFormat) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Backend(BackendError::Upstream { status, .. }) => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
        }
    }
}

impl From<SimError> for ApiError {
    fn from(err: SimError) -> Self {
        ApiError::Sim(err)
    }
}

impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        ApiError::Backend(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            ApiError::Sim(e) => e.to_string(),
            ApiError::Backend(e) => e.to_string(),
        };

        if status.is_server_error() {
            tracing::error!(%status, detail = %detail, "request failed");
        } else {
            tracing::warn!(%status, detail = %detail, "request rejected");
        }

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
