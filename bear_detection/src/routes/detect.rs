use crate::{
    error::DetectError,
    intake::{read_upload, IntakeError},
    pipeline::DetectionResponse,
    server::SharedState,
};
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use tracing::instrument;

pub const ROUTE: &str = "/api/detect";

#[instrument(skip(state, multipart))]
pub async fn detect(
    State(state): State<SharedState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<DetectionResponse>, DetectError> {
    state.metrics.record_request(ROUTE);

    let multipart = multipart.map_err(|e| IntakeError::MalformedBody(e.body_text()))?;
    let upload = read_upload(multipart).await?;

    let outcome = state.pipeline.run(upload).await?;

    state
        .metrics
        .record_inference_duration(outcome.inference_ms, ROUTE);
    if outcome.response.bear_detected {
        state.metrics.record_bear_detection(ROUTE);
    }

    Ok(Json(outcome.response))
}
