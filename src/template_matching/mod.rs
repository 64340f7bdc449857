/// Template matching module for locating UI glyphs in screenshots
///
/// This module provides:
/// - Zero-mean normalized cross-correlation over the whole screen
/// - Deterministic row-major tie-breaking
/// - Inclusive thresholding with a typed `NotFound` failure
/// - Template files with an optional embedded crop region
pub mod matcher;
pub mod template;
pub mod types;

pub use matcher::{ScoreSurface, locate, score_surface};
pub use template::{CropRegion, Template};
pub use types::{Bitmap, ColorMode, MatchResult, TapAnchor, Threshold};
