//! Template matching data types
use crate::error::{LocateError, LocateResult};
use image::{DynamicImage, GrayImage, RgbImage};
use serde::{Deserialize, Serialize};

/// Which pixel representation screenshots and templates are matched in
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Single intensity channel
    Luma,
    /// Three interleaved colour channels
    #[default]
    Rgb,
}

impl ColorMode {
    pub fn channels(self) -> u8 {
        match self {
            ColorMode::Luma => 1,
            ColorMode::Rgb => 3,
        }
    }
}

/// A decoded image: row-major, interleaved 8-bit samples
#[derive(Clone, Debug, PartialEq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    channels: u8,
    pixels: Vec<u8>,
}

impl Bitmap {
    /// Wrap raw samples, checking that the buffer matches the dimensions
    pub fn new(width: u32, height: u32, channels: u8, pixels: Vec<u8>) -> LocateResult<Self> {
        if channels != 1 && channels != 3 {
            return Err(LocateError::invalid_input(format!(
                "unsupported channel count {channels}, expected 1 or 3"
            )));
        }
        let expected = width as usize * height as usize * channels as usize;
        if pixels.len() != expected {
            return Err(LocateError::invalid_input(format!(
                "pixel buffer holds {} samples, {width}x{height}x{channels} needs {expected}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            pixels,
        })
    }

    pub fn from_luma(image: GrayImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            channels: 1,
            pixels: image.into_raw(),
        }
    }

    pub fn from_rgb(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            channels: 3,
            pixels: image.into_raw(),
        }
    }

    pub fn from_dynamic(image: &DynamicImage, mode: ColorMode) -> Self {
        match mode {
            ColorMode::Luma => Self::from_luma(image.to_luma8()),
            ColorMode::Rgb => Self::from_rgb(image.to_rgb8()),
        }
    }

    /// Decode PNG/JPEG bytes
    pub fn decode(bytes: &[u8], mode: ColorMode) -> LocateResult<Self> {
        if bytes.is_empty() {
            return Err(LocateError::invalid_input("image payload is empty"));
        }
        let image = image::load_from_memory(bytes)?;
        Ok(Self::from_dynamic(&image, mode))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Samples of one row
    pub fn row(&self, y: u32) -> &[u8] {
        let stride = self.width as usize * self.channels as usize;
        let start = y as usize * stride;
        &self.pixels[start..start + stride]
    }

    /// Copy out a sub-rectangle
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> LocateResult<Bitmap> {
        if x.checked_add(width).is_none_or(|right| right > self.width)
            || y.checked_add(height).is_none_or(|bottom| bottom > self.height)
        {
            return Err(LocateError::invalid_input(format!(
                "crop region [{x},{y},{width},{height}] exceeds image bounds ({}x{})",
                self.width, self.height
            )));
        }

        let ch = self.channels as usize;
        let mut pixels = Vec::with_capacity(width as usize * height as usize * ch);
        for row in y..y + height {
            let line = self.row(row);
            pixels.extend_from_slice(&line[x as usize * ch..(x + width) as usize * ch]);
        }

        Ok(Bitmap {
            width,
            height,
            channels: self.channels,
            pixels,
        })
    }
}

/// Minimum confidence a match must reach, in [0, 1]
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f32", into = "f32")]
pub struct Threshold(f32);

impl Threshold {
    pub const DEFAULT: f32 = 0.8;

    pub fn new(value: f32) -> LocateResult<Self> {
        if !(0.0..=1.0).contains(&value) {
            return Err(LocateError::invalid_input(format!(
                "threshold {value} is outside [0, 1]"
            )));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Inclusive comparison: a score equal to the threshold is a match
    pub fn accepts(self, score: f32) -> bool {
        score >= self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl TryFrom<f32> for Threshold {
    type Error = LocateError;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        Threshold::new(value)
    }
}

impl From<Threshold> for f32 {
    fn from(threshold: Threshold) -> Self {
        threshold.0
    }
}

/// Which point of a matched window a tap lands on
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TapAnchor {
    #[default]
    TopLeft,
    Center,
}

/// Best window found for a template
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MatchResult {
    /// Left edge of the window in the screenshot
    pub x: u32,
    /// Top edge of the window in the screenshot
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Normalized correlation score in [-1, 1]
    pub score: f32,
}

impl MatchResult {
    pub fn center(&self) -> (u32, u32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn anchor(&self, anchor: TapAnchor) -> (u32, u32) {
        match anchor {
            TapAnchor::TopLeft => (self.x, self.y),
            TapAnchor::Center => self.center(),
        }
    }
}

impl std::fmt::Display for MatchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{},{},{},{}] - {}%",
            self.x,
            self.y,
            self.width,
            self.height,
            (self.score * 100.0) as i32
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitmap_rejects_short_buffer() {
        let err = Bitmap::new(4, 4, 3, vec![0; 10]).unwrap_err();
        assert!(matches!(err, LocateError::InvalidInput { .. }));
    }

    #[test]
    fn test_bitmap_rejects_unknown_channels() {
        assert!(Bitmap::new(1, 1, 2, vec![0; 2]).is_err());
    }

    #[test]
    fn test_crop_copies_region() {
        let pixels: Vec<u8> = (0..16).collect();
        let bitmap = Bitmap::new(4, 4, 1, pixels).unwrap();
        let crop = bitmap.crop(1, 2, 2, 2).unwrap();
        assert_eq!(crop.pixels(), &[9, 10, 13, 14]);
    }

    #[test]
    fn test_crop_out_of_bounds() {
        let bitmap = Bitmap::new(4, 4, 1, vec![0; 16]).unwrap();
        assert!(bitmap.crop(3, 0, 2, 1).is_err());
        assert!(bitmap.crop(0, 0, u32::MAX, 1).is_err());
    }

    #[test]
    fn test_decode_garbage_is_invalid_input() {
        let err = Bitmap::decode(b"not an image", ColorMode::Rgb).unwrap_err();
        assert!(matches!(err, LocateError::InvalidInput { .. }));
    }

    #[test]
    fn test_threshold_range() {
        assert!(Threshold::new(0.0).is_ok());
        assert!(Threshold::new(1.0).is_ok());
        assert!(Threshold::new(1.01).is_err());
        assert!(Threshold::new(-0.1).is_err());
        assert!(Threshold::new(f32::NAN).is_err());
        assert_eq!(Threshold::default().value(), 0.8);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let threshold = Threshold::new(0.75).unwrap();
        assert!(threshold.accepts(0.75));
        assert!(!threshold.accepts(0.7499));
    }

    #[test]
    fn test_anchor_points() {
        let m = MatchResult {
            x: 40,
            y: 60,
            width: 10,
            height: 20,
            score: 1.0,
        };
        assert_eq!(m.anchor(TapAnchor::TopLeft), (40, 60));
        assert_eq!(m.anchor(TapAnchor::Center), (45, 70));
        assert_eq!(m.to_string(), "[40,60,10,20] - 100%");
    }
}
