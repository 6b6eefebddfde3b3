use ab_glyph::{Font, FontArc, InvalidFont, PxScale, ScaleFont};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use std::path::{Path, PathBuf};

const EMBEDDED_FONT: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

/// Font used for box labels.
#[derive(Clone)]
pub struct Typeface {
    font: FontArc,
    scale: PxScale,
}

impl std::fmt::Debug for Typeface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Typeface")
            .field("scale", &self.scale.y)
            .finish()
    }
}

impl Typeface {
    /// DejaVu Sans compiled into the binary.
    pub fn embedded(size: f32) -> Result<Self, InvalidFont> {
        let font = FontArc::try_from_slice(EMBEDDED_FONT)?;
        Ok(Self::new(font, size))
    }

    /// Tries each candidate in order and keeps the first font that parses,
    /// falling back to the embedded font.
    pub fn load(candidates: &[PathBuf], size: f32) -> Result<Self, InvalidFont> {
        for path in candidates {
            match read_font(path) {
                Ok(font) => {
                    tracing::info!("Using label font {}", path.display());
                    return Ok(Self::new(font, size));
                }
                Err(e) => tracing::debug!("Skipping font {}: {}", path.display(), e),
            }
        }

        tracing::info!("Using embedded label font");
        Self::embedded(size)
    }

    fn new(font: FontArc, size: f32) -> Self {
        Self {
            font,
            scale: PxScale::from(size),
        }
    }

    /// Width and height in pixels of the line `text` occupies when drawn.
    pub fn text_size(&self, text: &str) -> (u32, u32) {
        let (width, _) = text_size(self.scale, &self.font, text);
        if width == 0 {
            return (0, 0);
        }
        let height = self.font.as_scaled(self.scale).height().ceil() as u32;
        (width, height)
    }

    /// Draws `text` with its top-left corner at `(x, y)`. Pixels outside the
    /// canvas are dropped.
    pub fn draw(&self, image: &mut RgbImage, color: Rgb<u8>, x: i32, y: i32, text: &str) {
        draw_text_mut(image, color, x, y, self.scale, &self.font, text);
    }
}

fn read_font(path: &Path) -> Result<FontArc, String> {
    let data = std::fs::read(path).map_err(|e| e.to_string())?;
    FontArc::try_from_vec(data).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    #[test]
    fn test_missing_fonts_fall_back_to_embedded() {
        let candidates = vec![
            PathBuf::from("/definitely/not/here.ttf"),
            PathBuf::from("Cargo.toml"),
        ];

        let typeface = Typeface::load(&candidates, 20.0).unwrap();
        let embedded = Typeface::embedded(20.0).unwrap();

        assert_eq!(typeface.text_size("bear: 0.87"), embedded.text_size("bear: 0.87"));
    }

    #[test]
    fn test_loads_font_from_path() {
        let path = PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/assets/DejaVuSans.ttf"));

        let typeface = Typeface::load(&[path], 32.0).unwrap();

        assert_eq!(typeface.text_size("bear").1, 32);
    }

    #[test]
    fn test_text_size_scales_with_font_size() {
        let small = Typeface::embedded(20.0).unwrap();
        let large = Typeface::embedded(40.0).unwrap();

        assert_eq!(small.text_size(""), (0, 0));
        let (w, h) = small.text_size("bear: 0.87");
        assert!(w > 0);
        assert_eq!(h, 20);
        assert!(large.text_size("bear: 0.87").0 > w);
    }

    #[test]
    fn test_draw_stays_within_text_size() {
        let mut image = RgbImage::from_pixel(200, 40, WHITE);
        let typeface = Typeface::embedded(20.0).unwrap();
        let text = "bear: 0.87";
        let (w, h) = typeface.text_size(text);

        typeface.draw(&mut image, BLACK, 10, 5, text);

        let mut inked = 0;
        for (x, y, pixel) in image.enumerate_pixels() {
            if *pixel != WHITE {
                inked += 1;
                assert!(x >= 10 && x <= 10 + w, "x {} outside text box", x);
                assert!(y >= 5 && y < 5 + h, "y {} outside text box", y);
            }
        }
        assert!(inked > 0);
    }

    #[test]
    fn test_lowercase_and_non_ascii_render() {
        let typeface = Typeface::embedded(20.0).unwrap();
        let mut lower = RgbImage::from_pixel(120, 30, WHITE);
        let mut upper = RgbImage::from_pixel(120, 30, WHITE);

        typeface.draw(&mut lower, BLACK, 0, 0, "bear");
        typeface.draw(&mut upper, BLACK, 0, 0, "BEAR");

        assert_ne!(lower, upper);
        assert!(typeface.text_size("ours brun é").0 > 0);
    }

    #[test]
    fn test_draw_clips_off_canvas() {
        let mut image = RgbImage::from_pixel(20, 20, WHITE);
        let typeface = Typeface::embedded(20.0).unwrap();

        typeface.draw(&mut image, BLACK, -8, -6, "bear");
        typeface.draw(&mut image, BLACK, 15, 15, "bear");
    }
}
