use super::types::{DeviceSession, run_command};
use crate::error::LocateResult;
use serde_json::json;
use std::time::Duration;

/// Injects a tap at a screen coordinate through the session's tap command
#[derive(Debug, Clone)]
pub struct TapDispatcher {
    command: String,
    timeout: Duration,
}

impl TapDispatcher {
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            timeout,
        }
    }

    pub async fn tap<S: DeviceSession>(&self, session: &S, x: u32, y: u32) -> LocateResult<()> {
        log::info!("tap at ({x},{y})");
        run_command(session, &self.command, vec![json!(x), json!(y)], self.timeout).await?;
        Ok(())
    }
}
