//! QR attendance payloads
//!
//! Encoding, parsing and validation of the attendance payload
//! (`{"type":"attendance","eventId":<id>,"timestamp":<ms>}`), rendering it
//! as a QR symbol for terminals, SVG and PNG, and decoding symbols out of
//! still images or raw luma frames.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use image::{GrayImage, Luma};
use qrcode::render::{svg, unicode};
use qrcode::{Color, QrCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::QrConfig;
use crate::utils::errors::{CampusError, Result};
use crate::utils::helpers::truncate_text;

/// Value of the `type` field in every attendance payload
pub const PAYLOAD_TYPE: &str = "attendance";

/// Light border around the symbol, in modules
const QUIET_ZONE: u32 = 4;
/// Default pixel size of one module in PNG output
pub const DEFAULT_MODULE_PIXELS: u32 = 8;

const PREVIEW_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrPayload {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "eventId")]
    pub event_id: i64,
    /// Milliseconds since the Unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl QrPayload {
    /// Payload for `event_id` stamped with the current time
    pub fn new(event_id: i64) -> Self {
        Self::issued_at(event_id, Utc::now())
    }

    pub fn issued_at(event_id: i64, at: DateTime<Utc>) -> Self {
        Self {
            kind: PAYLOAD_TYPE.to_string(),
            event_id,
            timestamp: Some(at.timestamp_millis()),
        }
    }

    /// Payload from a bare identifier scan; carries no timestamp
    pub fn bare(event_id: i64) -> Self {
        Self {
            kind: PAYLOAD_TYPE.to_string(),
            event_id,
            timestamp: None,
        }
    }

    pub fn issued(&self) -> Option<DateTime<Utc>> {
        self.timestamp.and_then(DateTime::<Utc>::from_timestamp_millis)
    }

    /// JSON text embedded in the QR symbol
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Build the QR symbol for this payload
    pub fn to_qr(&self) -> Result<QrCode> {
        Ok(QrCode::new(self.encode()?.as_bytes())?)
    }
}

fn invalid(text: &str) -> CampusError {
    CampusError::InvalidPayload(format!(
        "Expected attendance QR with eventId, got: {}",
        truncate_text(text, PREVIEW_CHARS)
    ))
}

fn positive_id(value: &Value) -> Option<i64> {
    let id = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }?;
    (id > 0).then_some(id)
}

fn timestamp_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Parse scanned text into a payload.
///
/// JSON objects must carry `type == "attendance"` and a positive `eventId`
/// (number or numeric string). Anything that is not a JSON object is read
/// as a bare event identifier and must be a positive integer.
pub fn parse_payload(text: &str) -> Result<QrPayload> {
    let trimmed = text.trim();

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(fields)) => {
            if fields.get("type").and_then(Value::as_str) != Some(PAYLOAD_TYPE) {
                return Err(invalid(trimmed));
            }
            let event_id = fields
                .get("eventId")
                .and_then(positive_id)
                .ok_or_else(|| invalid(trimmed))?;
            Ok(QrPayload {
                kind: PAYLOAD_TYPE.to_string(),
                event_id,
                timestamp: fields.get("timestamp").and_then(timestamp_millis),
            })
        }
        _ => {
            let event_id = positive_id(&Value::String(trimmed.to_string()))
                .ok_or_else(|| invalid(trimmed))?;
            debug!(event_id, "Scanned bare event identifier");
            Ok(QrPayload::bare(event_id))
        }
    }
}

/// Parsing plus the optional freshness window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PayloadValidator {
    max_age: Option<Duration>,
}

impl PayloadValidator {
    pub fn new(max_age: Option<Duration>) -> Self {
        Self { max_age }
    }

    pub fn from_config(config: &QrConfig) -> Self {
        Self::new(config.max_payload_age_seconds.map(Duration::from_secs))
    }

    pub fn max_age(&self) -> Option<Duration> {
        self.max_age
    }

    pub fn validate(&self, text: &str, now: DateTime<Utc>) -> Result<QrPayload> {
        let payload = parse_payload(text)?;
        self.check_fresh(&payload, now)?;
        Ok(payload)
    }

    /// Payloads without a timestamp always pass
    pub fn check_fresh(&self, payload: &QrPayload, now: DateTime<Utc>) -> Result<()> {
        let (Some(max_age), Some(timestamp)) = (self.max_age, payload.timestamp) else {
            return Ok(());
        };
        let skew_millis = now.timestamp_millis().abs_diff(timestamp);
        if u128::from(skew_millis) > max_age.as_millis() {
            warn!(event_id = payload.event_id, skew_millis, "Rejected stale QR payload");
            return Err(CampusError::InvalidPayload(
                "QR code has expired, ask for a fresh one".to_string(),
            ));
        }
        Ok(())
    }
}

/// Terminal rendering using half-block characters
pub fn render_terminal(code: &QrCode) -> String {
    code.render::<unicode::Dense1x2>()
        .dark_color(unicode::Dense1x2::Light)
        .light_color(unicode::Dense1x2::Dark)
        .quiet_zone(true)
        .build()
}

pub fn render_svg(code: &QrCode) -> String {
    code.render::<svg::Color>()
        .min_dimensions(256, 256)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#ffffff"))
        .build()
}

/// Greyscale bitmap with a quiet zone, `module_pixels` pixels per module
pub fn render_luma(code: &QrCode, module_pixels: u32) -> GrayImage {
    let scale = module_pixels.max(1);
    let modules = code.width() as u32;
    let side = (modules + 2 * QUIET_ZONE) * scale;
    let colors = code.to_colors();

    GrayImage::from_fn(side, side, |x, y| {
        let mx = (x / scale).checked_sub(QUIET_ZONE);
        let my = (y / scale).checked_sub(QUIET_ZONE);
        match (mx, my) {
            (Some(mx), Some(my)) if mx < modules && my < modules => {
                match colors[(my * modules + mx) as usize] {
                    Color::Dark => Luma([0u8]),
                    Color::Light => Luma([255u8]),
                }
            }
            _ => Luma([255u8]),
        }
    })
}

/// Output formats for a generated symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QrFormat {
    Text,
    Svg,
    Png,
}

impl QrFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("png") => Ok(QrFormat::Png),
            Some("svg") => Ok(QrFormat::Svg),
            Some("txt") => Ok(QrFormat::Text),
            other => Err(CampusError::Validation(format!(
                "Unsupported QR output format: {}",
                other.unwrap_or("(none)")
            ))),
        }
    }
}

impl std::fmt::Display for QrFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QrFormat::Text => write!(f, "text"),
            QrFormat::Svg => write!(f, "SVG"),
            QrFormat::Png => write!(f, "PNG"),
        }
    }
}

/// Write the payload's QR symbol to `path`, format chosen by extension
pub fn save_qr(payload: &QrPayload, path: &Path) -> Result<QrFormat> {
    let format = QrFormat::from_path(path)?;
    let code = payload.to_qr()?;
    match format {
        QrFormat::Png => render_luma(&code, DEFAULT_MODULE_PIXELS).save(path)?,
        QrFormat::Svg => std::fs::write(path, render_svg(&code))?,
        QrFormat::Text => std::fs::write(path, render_terminal(&code))?,
    }
    debug!(event_id = payload.event_id, path = %path.display(), "QR code written");
    Ok(format)
}

/// One greyscale camera frame, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: usize,
    pub height: usize,
    pub luma: Vec<u8>,
}

impl Frame {
    pub fn new(width: usize, height: usize, luma: Vec<u8>) -> Result<Self> {
        let expected = width.checked_mul(height).ok_or_else(|| {
            CampusError::Validation(format!("Frame of {}x{} is too large", width, height))
        })?;
        if expected == 0 || luma.len() != expected {
            return Err(CampusError::Validation(format!(
                "Frame of {}x{} needs {} luma bytes, got {}",
                width,
                height,
                expected,
                luma.len()
            )));
        }
        Ok(Self { width, height, luma })
    }

    pub fn from_image(image: &GrayImage) -> Self {
        Self {
            width: image.width() as usize,
            height: image.height() as usize,
            luma: image.as_raw().clone(),
        }
    }

    /// Text of the first readable symbol; `None` when no symbol is in view
    pub fn detect(&self) -> Result<Option<String>> {
        let width = self.width;
        let mut prepared =
            rqrr::PreparedImage::prepare_from_greyscale(self.width, self.height, |x, y| {
                self.luma[y * width + x]
            });

        let grids = prepared.detect_grids();
        if grids.is_empty() {
            return Ok(None);
        }

        let mut last_error = None;
        for grid in grids {
            match grid.decode() {
                Ok((_meta, content)) => return Ok(Some(content)),
                Err(e) => last_error = Some(e.to_string()),
            }
        }
        Err(CampusError::InvalidPayload(format!(
            "QR code could not be read: {}",
            last_error.unwrap_or_default()
        )))
    }

    /// Like `detect`, but a frame without a symbol is an error
    pub fn decode(&self) -> Result<String> {
        self.detect()?
            .ok_or_else(|| CampusError::InvalidPayload("No QR code found".to_string()))
    }
}

/// Decode the first QR symbol in a PNG or JPEG file
pub fn decode_image_file(path: &Path) -> Result<String> {
    let image = image::open(path)?.to_luma8();
    Frame::from_image(&image).decode()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    #[test]
    fn test_encode_then_parse_keeps_event() {
        let payload = QrPayload::new(42);
        let text = payload.encode().unwrap();
        assert!(text.contains(r#""type":"attendance""#));
        assert!(text.contains(r#""eventId":42"#));

        let parsed = parse_payload(&text).unwrap();
        assert_eq!(parsed.kind, PAYLOAD_TYPE);
        assert_eq!(parsed.event_id, 42);
        assert_eq!(parsed.timestamp, payload.timestamp);
    }

    #[test]
    fn test_event_id_may_be_numeric_string() {
        let parsed = parse_payload(r#"{"type":"attendance","eventId":"17"}"#).unwrap();
        assert_eq!(parsed.event_id, 17);
        assert!(parsed.timestamp.is_none());
    }

    #[test]
    fn test_bare_identifier_fallback() {
        assert_eq!(parse_payload(" 9 ").unwrap(), QrPayload::bare(9));
        assert_matches!(parse_payload("hello world"), Err(CampusError::InvalidPayload(_)));
        assert_matches!(parse_payload("0"), Err(CampusError::InvalidPayload(_)));
        assert_matches!(parse_payload("-4"), Err(CampusError::InvalidPayload(_)));
        assert_matches!(parse_payload(""), Err(CampusError::InvalidPayload(_)));
    }

    #[test]
    fn test_wrong_type_or_missing_event_is_rejected() {
        assert_matches!(
            parse_payload(r#"{"type":"ticket","eventId":3}"#),
            Err(CampusError::InvalidPayload(_))
        );
        assert_matches!(
            parse_payload(r#"{"type":"attendance"}"#),
            Err(CampusError::InvalidPayload(_))
        );
        assert_matches!(
            parse_payload(r#"{"type":"attendance","eventId":"abc"}"#),
            Err(CampusError::InvalidPayload(_))
        );
        assert_matches!(parse_payload("[1,2]"), Err(CampusError::InvalidPayload(_)));
    }

    #[test]
    fn test_freshness_window() {
        let issued = Utc.with_ymd_and_hms(2024, 9, 1, 10, 0, 0).unwrap();
        let payload = QrPayload::issued_at(5, issued);
        let text = payload.encode().unwrap();

        let validator = PayloadValidator::new(Some(Duration::from_secs(600)));
        assert!(validator.validate(&text, issued + chrono::Duration::minutes(5)).is_ok());
        assert_matches!(
            validator.validate(&text, issued + chrono::Duration::minutes(11)),
            Err(CampusError::InvalidPayload(msg)) if msg.contains("expired")
        );

        // Bare identifiers carry no timestamp.
        assert!(validator.validate("5", issued + chrono::Duration::days(3)).is_ok());
        // Disabled window accepts anything.
        assert!(PayloadValidator::default()
            .validate(&text, issued + chrono::Duration::days(30))
            .is_ok());
    }

    #[test]
    fn test_extreme_timestamps_expire_instead_of_overflowing() {
        let validator = PayloadValidator::new(Some(Duration::from_secs(600)));
        let now = Utc.with_ymd_and_hms(2024, 9, 1, 10, 0, 0).unwrap();

        for text in [
            r#"{"type":"attendance","eventId":5,"timestamp":-9223372036854775808}"#,
            r#"{"type":"attendance","eventId":5,"timestamp":9223372036854775807}"#,
            r#"{"type":"attendance","eventId":5,"timestamp":-1e30}"#,
        ] {
            assert_matches!(
                validator.validate(text, now),
                Err(CampusError::InvalidPayload(msg)) if msg.contains("expired")
            );
        }
    }

    #[test]
    fn test_generated_png_decodes_back() {
        let payload = QrPayload::issued_at(42, Utc.with_ymd_and_hms(2024, 9, 1, 10, 0, 0).unwrap());
        let code = payload.to_qr().unwrap();
        let image = render_luma(&code, 4);

        let text = Frame::from_image(&image).decode().unwrap();
        assert_eq!(parse_payload(&text).unwrap(), payload);
    }

    #[test]
    fn test_blank_frame_has_no_code() {
        let frame = Frame::new(64, 64, vec![255; 64 * 64]).unwrap();
        assert_matches!(frame.decode(), Err(CampusError::InvalidPayload(_)));
        assert!(Frame::new(4, 4, vec![0; 3]).is_err());
    }

    #[test]
    fn test_oversized_frame_dimensions_are_rejected() {
        assert_matches!(Frame::new(usize::MAX, 2, vec![]), Err(CampusError::Validation(_)));
        assert_matches!(Frame::new(0, 8, vec![]), Err(CampusError::Validation(_)));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(QrFormat::from_path(Path::new("a.PNG")).unwrap(), QrFormat::Png);
        assert_eq!(QrFormat::from_path(Path::new("a.svg")).unwrap(), QrFormat::Svg);
        assert!(QrFormat::from_path(Path::new("a.gif")).is_err());
    }

    #[test]
    fn test_save_and_decode_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("event.png");
        let payload = QrPayload::new(7);

        assert_eq!(save_qr(&payload, &path).unwrap(), QrFormat::Png);
        let text = decode_image_file(&path).unwrap();
        assert_eq!(parse_payload(&text).unwrap().event_id, 7);
    }

    #[test]
    fn test_terminal_and_svg_rendering() {
        let code = QrPayload::bare(1).to_qr().unwrap();
        assert!(render_svg(&code).contains("<svg"));
        assert!(!render_terminal(&code).is_empty());
    }
}
