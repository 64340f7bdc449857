//! Reference glyphs loaded from local storage

use super::types::{Bitmap, ColorMode};
use crate::error::{LocateError, LocateResult};
use std::path::Path;

/// Rectangle embedded in a template file name, e.g. `login-[300,1682,50,50].png`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    /// Parse the `[x,y,width,height]` part of a file name, if any
    pub fn parse_from_name(name: &str) -> Option<Self> {
        let start = name.find('[')?;
        let end = name[start..].find(']')? + start;
        let parts: Vec<&str> = name[start + 1..end].split(',').collect();
        if parts.len() != 4 {
            return None;
        }
        if let (Ok(x), Ok(y), Ok(width), Ok(height)) = (
            parts[0].trim().parse::<u32>(),
            parts[1].trim().parse::<u32>(),
            parts[2].trim().parse::<u32>(),
            parts[3].trim().parse::<u32>(),
        ) && width > 0
            && height > 0
        {
            return Some(Self {
                x,
                y,
                width,
                height,
            });
        }
        None
    }
}

#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    bitmap: Bitmap,
    crop: Option<CropRegion>,
}

impl Template {
    /// Load a PNG/JPEG template.
    ///
    /// A file whose name carries a `[x,y,w,h]` region is a full reference
    /// screenshot; only that region is kept.
    pub fn open(path: impl AsRef<Path>, mode: ColorMode) -> LocateResult<Self> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|e| {
            LocateError::invalid_input(format!("failed to load template {}: {e}", path.display()))
        })?;

        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();

        let full = Bitmap::from_dynamic(&image, mode);
        let crop = CropRegion::parse_from_name(&name);
        let bitmap = match crop {
            Some(region) => full.crop(region.x, region.y, region.width, region.height)?,
            None => full,
        };

        log::debug!(
            "loaded template '{}' {}x{}{}",
            name,
            bitmap.width(),
            bitmap.height(),
            if crop.is_some() { " (cropped)" } else { "" }
        );

        Ok(Self { name, bitmap, crop })
    }

    pub fn from_bitmap(name: impl Into<String>, bitmap: Bitmap) -> Self {
        Self {
            name: name.into(),
            bitmap,
            crop: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bitmap(&self) -> &Bitmap {
        &self.bitmap
    }

    /// Region of the reference screenshot this template was cut from
    pub fn crop(&self) -> Option<CropRegion> {
        self.crop
    }
}
