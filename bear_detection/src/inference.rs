use crate::config::InferenceConfig;
use crate::detection::{parse_detections, Detection};
use crate::intake::UploadedImage;
use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, StatusCode,
};
use thiserror::Error;
use tracing::instrument;

const FILE_FIELD: &str = "file";

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(reqwest::Error),
    #[error("Request to inference endpoint failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Inference endpoint returned status {0}")]
    Status(StatusCode),
    #[error("Unexpected inference response: {0}")]
    InvalidResponse(String),
}

impl InferenceError {
    /// Whether the endpoint itself failed, as opposed to answering with
    /// something this service cannot read.
    pub fn is_upstream(&self) -> bool {
        matches!(self, InferenceError::Request(_) | InferenceError::Status(_))
    }
}

#[async_trait]
pub trait DetectionClient: Send + Sync + 'static {
    async fn detect(&self, image: &UploadedImage) -> Result<Vec<Detection>, InferenceError>;
}

/// Forwards uploads to a remote detection endpoint over multipart HTTP.
pub struct HttpDetectionClient {
    client: Client,
    url: String,
}

impl HttpDetectionClient {
    pub fn new(config: &InferenceConfig) -> Result<Self, InferenceError> {
        let client = Client::builder()
            .timeout(config.get_timeout())
            .build()
            .map_err(InferenceError::ClientBuild)?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    fn file_part(image: &UploadedImage) -> Part {
        let part = || Part::bytes(image.bytes.to_vec()).file_name(image.filename.clone());
        match part().mime_str(&image.content_type) {
            Ok(part) => part,
            Err(e) => {
                tracing::warn!(
                    "Dropping unparseable content type {:?}: {}",
                    image.content_type,
                    e
                );
                part()
            }
        }
    }
}

#[async_trait]
impl DetectionClient for HttpDetectionClient {
    #[instrument(skip(self, image), fields(filename = %image.filename, size = image.bytes.len()))]
    async fn detect(&self, image: &UploadedImage) -> Result<Vec<Detection>, InferenceError> {
        let form = Form::new().part(FILE_FIELD, Self::file_part(image));

        let response = self.client.post(&self.url).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(InferenceError::Status(status));
        }

        let body = response.bytes().await?;
        let payload: serde_json::Value = serde_json::from_slice(&body)
            .map_err(|e| InferenceError::InvalidResponse(e.to_string()))?;
        let detections = parse_detections(&payload).map_err(InferenceError::InvalidResponse)?;

        tracing::debug!("Received {} detections", detections.len());
        for (i, detection) in detections.iter().enumerate() {
            tracing::debug!(
                "Detection {}: label={}, confidence={:.3}, bbox=({:.1}, {:.1}, {:.1}, {:.1})",
                i,
                detection.label,
                detection.confidence,
                detection.bbox.x1,
                detection.bbox.y1,
                detection.bbox.x2,
                detection.bbox.y2
            );
        }

        Ok(detections)
    }
}
