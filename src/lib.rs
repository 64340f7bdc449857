pub mod capabilities;
pub mod config;
pub mod device_query;
pub mod error;
pub mod locator;
pub mod session;
pub mod template_matching;
pub mod transaction;

#[cfg(test)]
pub(crate) mod test_support;

pub use capabilities::{CapabilitySet, Platform};
pub use config::{CloudConfig, LocatorConfig};
pub use device_query::DeviceQuery;
pub use error::{LocateError, LocateResult};
pub use locator::ScreenLocator;
pub use session::{DeviceSession, TapAction};
pub use template_matching::{Bitmap, ColorMode, MatchResult, TapAnchor, Template, Threshold};
