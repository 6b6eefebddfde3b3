use crate::config::AnnotationConfig;
use crate::detection::{BoundingBox, Detection, DetectionSummary};
use crate::typeface::Typeface;
use ab_glyph::InvalidFont;
use image::{Rgb, RgbImage};
use imageproc::{
    drawing::{draw_filled_rect_mut, draw_hollow_rect_mut},
    rect::Rect,
};

pub const OUTLINE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const TEXT_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

const OUTLINE_WIDTH: i64 = 5;
const LABEL_OFFSET_ABOVE: f32 = 25.0;
const LABEL_OFFSET_INSIDE: f32 = 5.0;
// Keeps rasterized coordinates just outside the canvas. The outline is drawn
// inward, so anything beyond this margin is never visible.
const CANVAS_MARGIN: i64 = OUTLINE_WIDTH + 1;

/// Draws boxes and labels for detections of a single target class.
#[derive(Debug)]
pub struct Annotator {
    target_label: String,
    typeface: Typeface,
}

impl Annotator {
    pub fn new(target_label: impl Into<String>, typeface: Typeface) -> Self {
        Self {
            target_label: target_label.into(),
            typeface,
        }
    }

    pub fn from_config(config: &AnnotationConfig) -> Result<Self, InvalidFont> {
        let typeface = Typeface::load(&config.font_paths, config.font_size)?;
        Ok(Self::new(config.target_label.clone(), typeface))
    }

    pub fn is_target(&self, detection: &Detection) -> bool {
        detection.label == self.target_label
    }

    /// Draws every target detection in the order received and returns the
    /// summary over exactly those detections.
    pub fn annotate(&self, image: &mut RgbImage, detections: &[Detection]) -> DetectionSummary {
        let mut summary = DetectionSummary::default();

        for detection in detections {
            if !self.is_target(detection) {
                continue;
            }
            summary.record(detection.confidence);
            self.draw_outline(image, &detection.bbox);
            self.draw_label(image, detection);
        }

        summary
    }

    fn draw_outline(&self, image: &mut RgbImage, bbox: &BoundingBox) {
        let (width, height) = (image.width() as i64, image.height() as i64);
        let clamp_x = |v: f32| round(v).clamp(-CANVAS_MARGIN, width + CANVAS_MARGIN);
        let clamp_y = |v: f32| round(v).clamp(-CANVAS_MARGIN, height + CANVAS_MARGIN);

        let (x1, x2) = ordered(clamp_x(bbox.x1), clamp_x(bbox.x2));
        let (y1, y2) = ordered(clamp_y(bbox.y1), clamp_y(bbox.y2));

        for inset in 0..OUTLINE_WIDTH {
            let (left, top) = (x1 + inset, y1 + inset);
            let (right, bottom) = (x2 - inset, y2 - inset);
            if right < left || bottom < top {
                break;
            }
            let rect = Rect::at(left as i32, top as i32)
                .of_size((right - left + 1) as u32, (bottom - top + 1) as u32);
            draw_hollow_rect_mut(image, rect, OUTLINE_COLOR);
        }
    }

    fn draw_label(&self, image: &mut RgbImage, detection: &Detection) {
        let text = format!("{}: {:.2}", detection.label, detection.confidence);
        let (text_width, text_height) = self.typeface.text_size(&text);
        if text_width == 0 || text_height == 0 {
            return;
        }

        let (x, y) = label_anchor(&detection.bbox);
        let (width, height) = (image.width() as i64, image.height() as i64);
        if x >= width || y >= height || x + text_width as i64 <= 0 || y + text_height as i64 <= 0
        {
            return;
        }

        let (x, y) = (x as i32, y as i32);
        let background = Rect::at(x, y).of_size(text_width, text_height);
        draw_filled_rect_mut(image, background, OUTLINE_COLOR);
        self.typeface.draw(image, TEXT_COLOR, x, y, &text);
    }
}

/// Top-left corner of a box's label: above the box when there is room,
/// otherwise just inside its top edge. The placement is decided on the
/// unrounded top.
pub fn label_anchor(bbox: &BoundingBox) -> (i64, i64) {
    let left = round(bbox.x1.min(bbox.x2));
    let top = bbox.y1.min(bbox.y2);

    let above = top - LABEL_OFFSET_ABOVE;
    if above < 0.0 {
        (left, round(top + LABEL_OFFSET_INSIDE))
    } else {
        (left, round(above))
    }
}

fn round(v: f32) -> i64 {
    v.round() as i64
}

fn ordered(a: i64, b: i64) -> (i64, i64) {
    (a.min(b), a.max(b))
}
