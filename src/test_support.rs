// In-memory device session for exercising the locator without a device
use crate::session::DeviceSession;
use crate::session::commands::AUTOMOTIVE_SCREENSHOT;
use base64::Engine;
use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::sync::Mutex;
use std::time::Duration;

pub struct FakeSession {
    screens: Mutex<VecDeque<Value>>,
    responses: Mutex<HashMap<String, Result<Value, String>>>,
    calls: Mutex<Vec<(String, Vec<Value>)>>,
    screenshot_delay: Option<Duration>,
}

impl FakeSession {
    pub fn new() -> Self {
        Self {
            screens: Mutex::new(VecDeque::new()),
            responses: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            screenshot_delay: None,
        }
    }

    /// Screenshots are served in order; the last one repeats
    pub fn with_screens(self, screens: Vec<Value>) -> Self {
        *self.screens.lock().unwrap() = screens.into();
        self
    }

    pub fn with_screenshot_delay(mut self, delay: Duration) -> Self {
        self.screenshot_delay = Some(delay);
        self
    }

    pub fn with_response(self, script: &str, response: Result<Value, String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(script.to_string(), response);
        self
    }

    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, script: &str) -> Vec<Vec<Value>> {
        self.calls()
            .into_iter()
            .filter(|(name, _)| name == script)
            .map(|(_, args)| args)
            .collect()
    }
}

impl DeviceSession for FakeSession {
    async fn execute_script(&self, script: &str, args: Vec<Value>) -> Result<Value, String> {
        self.calls
            .lock()
            .unwrap()
            .push((script.to_string(), args));

        if let Some(response) = self.responses.lock().unwrap().get(script) {
            return response.clone();
        }

        if script == AUTOMOTIVE_SCREENSHOT {
            if let Some(delay) = self.screenshot_delay {
                tokio::time::sleep(delay).await;
            }
            let mut screens = self.screens.lock().unwrap();
            return match screens.len() {
                0 => Err("no screenshot available".to_string()),
                1 => Ok(screens[0].clone()),
                _ => Ok(screens.pop_front().unwrap_or(Value::Null)),
            };
        }

        Ok(Value::Null)
    }

    fn session_id(&self) -> &str {
        "fake-session"
    }
}

pub fn png_base64(image: &DynamicImage) -> String {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Black screen with a white square of `size` at (x, y)
pub fn screen_with_square(width: u32, height: u32, size: u32, at: Option<(u32, u32)>) -> Value {
    let image = GrayImage::from_fn(width, height, |px, py| match at {
        Some((x, y)) if px >= x && px < x + size && py >= y && py < y + size => Luma([255]),
        _ => Luma([0]),
    });
    Value::String(png_base64(&DynamicImage::ImageLuma8(image)))
}

pub fn white_square(size: u32) -> GrayImage {
    GrayImage::from_pixel(size, size, Luma([255]))
}
