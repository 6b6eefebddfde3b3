use serde::Serialize;
use serde_json::Value;

/// Box corners in pixel units of the uploaded image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub label: String,
    pub bbox: BoundingBox,
    pub confidence: f64,
}

impl Detection {
    /// Builds a detection from one entry of the inference response.
    ///
    /// Returns `None` when `label` is not a string or `box` is not four finite
    /// numbers. A missing or non-numeric `score` reads as zero.
    pub fn from_value(value: &Value) -> Option<Self> {
        let label = value.get("label")?.as_str()?;
        let coords = value.get("box")?.as_array()?;
        if coords.len() != 4 {
            return None;
        }

        let mut corners = [0f32; 4];
        for (corner, coord) in corners.iter_mut().zip(coords) {
            let v = coord.as_f64()? as f32;
            if !v.is_finite() {
                return None;
            }
            *corner = v;
        }

        let confidence = value
            .get("score")
            .and_then(Value::as_f64)
            .filter(|s| s.is_finite())
            .unwrap_or(0.0);

        Some(Self {
            label: label.to_string(),
            bbox: BoundingBox {
                x1: corners[0],
                y1: corners[1],
                x2: corners[2],
                y2: corners[3],
            },
            confidence,
        })
    }
}

/// Parses the inference response body. `null` reads as no detections and
/// malformed entries are dropped; any other non-array payload is an error.
pub fn parse_detections(payload: &Value) -> Result<Vec<Detection>, String> {
    let entries = match payload {
        Value::Null => return Ok(Vec::new()),
        Value::Array(entries) => entries,
        other => {
            return Err(format!(
                "expected a JSON array of detections, got {}",
                json_kind(other)
            ))
        }
    };

    let detections = entries
        .iter()
        .enumerate()
        .filter_map(|(i, entry)| {
            let detection = Detection::from_value(entry);
            if detection.is_none() {
                tracing::debug!("Skipping malformed detection {}: {}", i, entry);
            }
            detection
        })
        .collect();

    Ok(detections)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DetectionSummary {
    pub bear_detected: bool,
    pub confidence: f64,
}

impl DetectionSummary {
    pub fn record(&mut self, confidence: f64) {
        self.bear_detected = true;
        self.confidence = self.confidence.max(confidence);
    }
}
