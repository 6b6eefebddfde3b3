use base64::{engine::general_purpose::STANDARD, Engine};
use image::{codecs::jpeg::JpegEncoder, ImageError, RgbImage};

pub fn to_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, ImageError> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality).encode_image(image)?;
    Ok(buf)
}

/// JPEG-encodes the image and wraps the bytes as standard base64.
pub fn to_base64_jpeg(image: &RgbImage, quality: u8) -> Result<String, ImageError> {
    Ok(STANDARD.encode(to_jpeg(image, quality)?))
}
