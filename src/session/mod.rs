// Session module - the remote device seen through its script-execution command.
// Screenshots come in as base64 payloads and taps go out as vendor commands.

pub mod commands;
pub mod screenshot;
pub mod tap;
pub mod types;


pub use commands::{ReportStatus, VendorCommands};
pub use screenshot::{ScreenshotAcquirer, decode_payload};
pub use tap::TapDispatcher;
pub use types::{DeviceSession, TapAction, run_command};
