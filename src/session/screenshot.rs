use super::types::{DeviceSession, run_command};
use crate::error::{LocateError, LocateResult};
use crate::template_matching::{Bitmap, ColorMode};
use base64::Engine;
use std::time::{Duration, Instant};

/// Fetches the device framebuffer through a screenshot command and decodes it
#[derive(Debug, Clone)]
pub struct ScreenshotAcquirer {
    command: String,
    timeout: Duration,
    mode: ColorMode,
}

impl ScreenshotAcquirer {
    pub fn new(command: impl Into<String>, timeout: Duration, mode: ColorMode) -> Self {
        Self {
            command: command.into(),
            timeout,
            mode,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn acquire<S: DeviceSession>(&self, session: &S) -> LocateResult<Bitmap> {
        let start = Instant::now();
        let value = run_command(session, &self.command, Vec::new(), self.timeout).await?;
        let payload = value.as_str().ok_or_else(|| {
            LocateError::session(
                self.command.as_str(),
                format!("expected a base64 string, got {value}"),
            )
        })?;

        let bytes = decode_payload(payload)?;
        let bitmap = Bitmap::decode(&bytes, self.mode)?;
        log::debug!(
            "screenshot {}x{} ({} bytes) in {}ms",
            bitmap.width(),
            bitmap.height(),
            bytes.len(),
            start.elapsed().as_millis()
        );
        Ok(bitmap)
    }
}

/// Decode a base64 image payload, tolerating a data-URL prefix and line breaks
pub fn decode_payload(payload: &str) -> LocateResult<Vec<u8>> {
    let body = match payload.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(',')
            .map(|(_, data)| data)
            .ok_or_else(|| LocateError::invalid_input("data URL without a payload"))?,
        None => payload,
    };
    let compact: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if compact.is_empty() {
        return Err(LocateError::invalid_input("screenshot payload is empty"));
    }

    base64::engine::general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| LocateError::invalid_input(format!("screenshot payload is not base64: {e}")))
}
