use axum::extract::{multipart::MultipartError, Multipart};
use bytes::Bytes;
use thiserror::Error;

pub const IMAGE_FIELD: &str = "image";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("missing file")]
    MissingFile,
    #[error("empty filename")]
    EmptyFilename,
    #[error("malformed multipart body: {0}")]
    MalformedBody(String),
}

impl From<MultipartError> for IntakeError {
    fn from(err: MultipartError) -> Self {
        IntakeError::MalformedBody(err.body_text())
    }
}

/// An image part lifted out of the request. Lives only as long as the request.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub bytes: Bytes,
    pub content_type: String,
    pub filename: String,
}

/// Takes the first `image` part of the form. Other parts are skipped.
pub async fn read_upload(mut multipart: Multipart) -> Result<UploadedImage, IntakeError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        if filename.is_empty() {
            return Err(IntakeError::EmptyFilename);
        }
        let content_type = field
            .content_type()
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        let bytes = field.bytes().await?;

        return Ok(UploadedImage {
            bytes,
            content_type,
            filename,
        });
    }

    Err(IntakeError::MissingFile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, extract::FromRequest, http::Request};

    const BOUNDARY: &str = "intake-boundary";

    async fn multipart_from(body: String) -> Multipart {
        let request = Request::builder()
            .method("POST")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();
        Multipart::from_request(request, &()).await.unwrap()
    }

    fn part(name: &str, filename: Option<&str>, content_type: Option<&str>, data: &str) -> String {
        let mut disposition = format!("form-data; name=\"{}\"", name);
        if let Some(filename) = filename {
            disposition.push_str(&format!("; filename=\"{}\"", filename));
        }
        let mut part = format!("--{}\r\nContent-Disposition: {}\r\n", BOUNDARY, disposition);
        if let Some(content_type) = content_type {
            part.push_str(&format!("Content-Type: {}\r\n", content_type));
        }
        part.push_str(&format!("\r\n{}\r\n", data));
        part
    }

    fn close() -> String {
        format!("--{}--\r\n", BOUNDARY)
    }

    #[tokio::test]
    async fn test_reads_image_part() {
        let body = format!(
            "{}{}{}",
            part("note", None, None, "hello"),
            part("image", Some("bear.jpg"), Some("image/jpeg"), "raw"),
            close()
        );

        let upload = read_upload(multipart_from(body).await).await.unwrap();

        assert_eq!(upload.filename, "bear.jpg");
        assert_eq!(upload.content_type, "image/jpeg");
        assert_eq!(&upload.bytes[..], b"raw");
    }

    #[tokio::test]
    async fn test_missing_image_part() {
        let body = format!("{}{}", part("file", Some("bear.jpg"), None, "raw"), close());

        let err = read_upload(multipart_from(body).await).await.unwrap_err();

        assert!(matches!(err, IntakeError::MissingFile));
        assert_eq!(err.to_string(), "missing file");
    }

    #[tokio::test]
    async fn test_empty_filename() {
        let body = format!("{}{}", part("image", Some(""), None, "raw"), close());

        let err = read_upload(multipart_from(body).await).await.unwrap_err();

        assert!(matches!(err, IntakeError::EmptyFilename));
    }

    #[tokio::test]
    async fn test_absent_filename_counts_as_empty() {
        let body = format!("{}{}", part("image", None, None, "raw"), close());

        let err = read_upload(multipart_from(body).await).await.unwrap_err();

        assert!(matches!(err, IntakeError::EmptyFilename));
    }

    #[tokio::test]
    async fn test_default_content_type() {
        let body = format!("{}{}", part("image", Some("x.png"), None, "raw"), close());

        let upload = read_upload(multipart_from(body).await).await.unwrap();

        assert_eq!(upload.content_type, DEFAULT_CONTENT_TYPE);
    }
}
