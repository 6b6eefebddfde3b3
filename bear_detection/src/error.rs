use crate::inference::InferenceError;
use crate::intake::IntakeError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectError {
    #[error("{0}")]
    Validation(#[from] IntakeError),
    #[error("Inference call failed: {0}")]
    Upstream(InferenceError),
    #[error("Internal server error: {0}")]
    InvalidResponse(InferenceError),
    #[error("Internal server error: failed to decode image: {0}")]
    Decode(image::ImageError),
    #[error("Internal server error: failed to encode image: {0}")]
    Encode(image::ImageError),
    #[error("Internal server error: rendering task failed: {0}")]
    Render(#[from] tokio::task::JoinError),
}

impl From<InferenceError> for DetectError {
    fn from(err: InferenceError) -> Self {
        if err.is_upstream() {
            DetectError::Upstream(err)
        } else {
            DetectError::InvalidResponse(err)
        }
    }
}

impl DetectError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DetectError::Validation(_) => StatusCode::BAD_REQUEST,
            DetectError::Upstream(_) => StatusCode::SERVICE_UNAVAILABLE,
            DetectError::InvalidResponse(_)
            | DetectError::Decode(_)
            | DetectError::Encode(_)
            | DetectError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl IntoResponse for DetectError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_client_error() {
            tracing::warn!("Rejected detection request: {}", self);
        } else {
            tracing::error!("Detection request failed: {:?}", self);
        }

        let body = ErrorBody {
            success: false,
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            DetectError::from(IntakeError::MissingFile).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            DetectError::from(InferenceError::Status(StatusCode::INTERNAL_SERVER_ERROR))
                .status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            DetectError::from(InferenceError::InvalidResponse("not json".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_validation_message_is_passed_through() {
        let err = DetectError::from(IntakeError::EmptyFilename);
        assert_eq!(err.to_string(), "empty filename");
    }
}
