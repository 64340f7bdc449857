// Core device-session types and traits
use crate::error::{LocateError, LocateResult};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

// Trait over a remote device session's generic script-execution command.
// A WebDriver client implements this outside the crate; every vendor
// extension goes through it.
#[allow(async_fn_in_trait)]
pub trait DeviceSession: Send + Sync {
    async fn execute_script(&self, script: &str, args: Vec<Value>) -> Result<Value, String>;

    fn session_id(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TapAction {
    pub x: u32,
    pub y: u32,
    pub score: f32,
}

/// Run one session command, mapping failures and the deadline into `LocateError`.
pub async fn run_command<S: DeviceSession>(
    session: &S,
    script: &str,
    args: Vec<Value>,
    timeout: Duration,
) -> LocateResult<Value> {
    log::debug!("[{}] executing '{}'", session.session_id(), script);
    match tokio::time::timeout(timeout, session.execute_script(script, args)).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(LocateError::session(script, e)),
        Err(_) => Err(LocateError::Timeout {
            duration: timeout,
            description: format!("'{script}' did not complete"),
        }),
    }
}
