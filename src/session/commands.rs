//! Vendor extension commands run through the session's script execution

use super::types::{DeviceSession, run_command};
use crate::error::{LocateError, LocateResult};
use serde_json::{Value, json};
use std::time::Duration;

pub const AUTOMOTIVE_SCREENSHOT: &str = "digitalai:automotive.getScreenshot";
pub const AUTOMOTIVE_TAP: &str = "digitalai:automotive.tap";
pub const REPORT: &str = "seetest:client.report";
pub const SET_REPORT_STATUS: &str = "seetest:client.setReportStatus";
pub const START_STEPS_GROUP: &str = "seetest:client.startStepsGroup";
pub const STOP_STEPS_GROUP: &str = "seetest:client.stopStepsGroup";
pub const SET_LOCATION_PLAYBACK_FILE: &str = "seetest:client.setLocationPlaybackFile";
pub const START_PERFORMANCE_TRANSACTION: &str =
    "seetest:client.startPerformanceTransactionForApplication";
pub const END_PERFORMANCE_TRANSACTION: &str = "seetest:client.endPerformanceTransaction";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStatus {
    Passed,
    Failed,
    Skipped,
}

impl ReportStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportStatus::Passed => "Passed",
            ReportStatus::Failed => "Failed",
            ReportStatus::Skipped => "Skipped",
        }
    }
}

/// Typed wrappers over the vendor commands used around template taps
pub struct VendorCommands<'a, S: DeviceSession> {
    session: &'a S,
    timeout: Duration,
}

impl<'a, S: DeviceSession> VendorCommands<'a, S> {
    pub fn new(session: &'a S, timeout: Duration) -> Self {
        Self { session, timeout }
    }

    async fn run(&self, script: &str, args: Vec<Value>) -> LocateResult<Value> {
        run_command(self.session, script, args, self.timeout).await
    }

    /// Add a custom step to the test report
    pub async fn report_step(&self, message: &str, passed: bool) -> LocateResult<()> {
        self.run(REPORT, vec![json!(message), json!(passed.to_string())])
            .await?;
        Ok(())
    }

    pub async fn set_report_status(
        &self,
        status: ReportStatus,
        message: &str,
        stacktrace: Option<&str>,
    ) -> LocateResult<()> {
        let mut args = vec![json!(status.as_str()), json!(message)];
        if let Some(trace) = stacktrace {
            args.push(json!(trace));
        }
        self.run(SET_REPORT_STATUS, args).await?;
        Ok(())
    }

    pub async fn start_steps_group(&self, name: &str) -> LocateResult<()> {
        self.run(START_STEPS_GROUP, vec![json!(name)]).await?;
        Ok(())
    }

    pub async fn stop_steps_group(&self) -> LocateResult<()> {
        self.run(STOP_STEPS_GROUP, Vec::new()).await?;
        Ok(())
    }

    /// Replay a location file, moving the device every `delay_ms`
    pub async fn set_location_playback_file(
        &self,
        file: &str,
        delay_ms: u64,
        provider: &str,
    ) -> LocateResult<()> {
        self.run(
            SET_LOCATION_PLAYBACK_FILE,
            vec![json!(file), json!(delay_ms), json!(provider)],
        )
        .await?;
        Ok(())
    }

    pub async fn start_performance_transaction(
        &self,
        application: &str,
        monitor: &str,
    ) -> LocateResult<()> {
        self.run(
            START_PERFORMANCE_TRANSACTION,
            vec![json!(application), json!(monitor)],
        )
        .await?;
        Ok(())
    }

    /// End the running transaction; returns the raw JSON report text
    pub async fn end_performance_transaction(&self, name: &str) -> LocateResult<String> {
        let value = self.run(END_PERFORMANCE_TRANSACTION, vec![json!(name)]).await?;
        match value {
            Value::String(text) => Ok(text),
            Value::Object(_) => Ok(value.to_string()),
            other => Err(LocateError::session(
                END_PERFORMANCE_TRANSACTION,
                format!("unexpected transaction response {other}"),
            )),
        }
    }
}
