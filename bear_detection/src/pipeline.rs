use crate::annotate::Annotator;
use crate::detection::DetectionSummary;
use crate::encode::to_base64_jpeg;
use crate::error::DetectError;
use crate::inference::DetectionClient;
use crate::intake::UploadedImage;
use image::RgbImage;
use serde::Serialize;
use std::{sync::Arc, time::Instant};
use tracing::instrument;

#[derive(Debug, Serialize)]
pub struct DetectionResponse {
    pub success: bool,
    pub bear_detected: bool,
    pub confidence: f64,
    pub processed_image: String,
}

impl DetectionResponse {
    fn new(summary: DetectionSummary, processed_image: String) -> Self {
        Self {
            success: true,
            bear_detected: summary.bear_detected,
            confidence: summary.confidence,
            processed_image,
        }
    }
}

/// Result of one pipeline run plus how long the inference call took.
#[derive(Debug)]
pub struct DetectionOutcome {
    pub response: DetectionResponse,
    pub inference_ms: u64,
}

/// Decode, detect, annotate, encode. Holds no per-request state.
pub struct DetectionPipeline {
    client: Arc<dyn DetectionClient>,
    annotator: Arc<Annotator>,
    jpeg_quality: u8,
}

impl DetectionPipeline {
    pub fn new(client: Arc<dyn DetectionClient>, annotator: Annotator, jpeg_quality: u8) -> Self {
        Self {
            client,
            annotator: Arc::new(annotator),
            jpeg_quality,
        }
    }

    #[instrument(skip(self, upload), fields(filename = %upload.filename, size = upload.bytes.len()))]
    pub async fn run(&self, upload: UploadedImage) -> Result<DetectionOutcome, DetectError> {
        // Fail on undecodable uploads before spending an inference call.
        let bytes = upload.bytes.clone();
        let image = tokio::task::spawn_blocking(move || decode(&bytes)).await??;

        let started = Instant::now();
        let detections = self.client.detect(&upload).await?;
        let inference_ms = started.elapsed().as_millis() as u64;

        let annotator = self.annotator.clone();
        let quality = self.jpeg_quality;
        let (summary, processed_image) = tokio::task::spawn_blocking(move || {
            let mut image = image;
            let summary = annotator.annotate(&mut image, &detections);
            to_base64_jpeg(&image, quality)
                .map(|encoded| (summary, encoded))
                .map_err(DetectError::Encode)
        })
        .await??;

        tracing::info!(
            "Detection finished: bear_detected={}, confidence={:.2}, inference_ms={}",
            summary.bear_detected,
            summary.confidence,
            inference_ms
        );

        Ok(DetectionOutcome {
            response: DetectionResponse::new(summary, processed_image),
            inference_ms,
        })
    }
}

fn decode(bytes: &[u8]) -> Result<RgbImage, DetectError> {
    let image = image::load_from_memory(bytes).map_err(DetectError::Decode)?;
    Ok(image.to_rgb8())
}
