//! Screen locator: screenshot → template match → tap
//!
//! Each attempt fetches a fresh screenshot. `NotFound` and `Timeout` are
//! retried up to the configured number of attempts with a fixed pause in
//! between; every other failure is returned immediately.

use crate::config::LocatorConfig;
use crate::error::{LocateError, LocateResult};
use crate::session::{DeviceSession, ScreenshotAcquirer, TapAction, TapDispatcher};
use crate::template_matching::{MatchResult, TapAnchor, Template, Threshold, locate};
use std::time::Duration;


pub struct ScreenLocator {
    acquirer: ScreenshotAcquirer,
    dispatcher: TapDispatcher,
    threshold: Threshold,
    attempts: u32,
    retry_delay: Duration,
    anchor: TapAnchor,
}

impl ScreenLocator {
    pub fn new(config: &LocatorConfig) -> Self {
        Self {
            acquirer: ScreenshotAcquirer::new(
                config.screenshot_command.as_str(),
                config.timeout(),
                config.color_mode,
            ),
            dispatcher: TapDispatcher::new(config.tap_command.as_str(), config.timeout()),
            threshold: config.threshold,
            attempts: config.attempts.max(1),
            retry_delay: config.retry_delay(),
            anchor: config.anchor,
        }
    }

    pub fn threshold(&self) -> Threshold {
        self.threshold
    }

    /// Locate `template` on the current screen, retrying on absence or timeout.
    pub async fn find<S: DeviceSession>(
        &self,
        session: &S,
        template: &Template,
    ) -> LocateResult<MatchResult> {
        let mut attempt = 1;
        loop {
            match self.find_once(session, template).await {
                Ok(found) => return Ok(found),
                Err(e) if e.is_retryable() && attempt < self.attempts => {
                    log::warn!(
                        "'{}' attempt {}/{} failed: {}",
                        template.name(),
                        attempt,
                        self.attempts,
                        e
                    );
                    tokio::time::sleep(self.retry_delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Locate `template` and tap it.
    pub async fn tap_template<S: DeviceSession>(
        &self,
        session: &S,
        template: &Template,
    ) -> LocateResult<TapAction> {
        let found = self.find(session, template).await?;
        self.tap_match(session, &found).await
    }

    /// Tap `template` if it is on screen now. Absence is `Ok(None)`.
    pub async fn tap_if_present<S: DeviceSession>(
        &self,
        session: &S,
        template: &Template,
    ) -> LocateResult<Option<TapAction>> {
        match self.find_optional(session, template).await? {
            Some(found) => self.tap_match(session, &found).await.map(Some),
            None => Ok(None),
        }
    }

    /// If `template` is visible, tap `fallback` to get it out of the way.
    ///
    /// Used for overlays (side menus, banners) whose presence is optional.
    pub async fn ensure_dismissed<S: DeviceSession>(
        &self,
        session: &S,
        template: &Template,
        fallback: (u32, u32),
    ) -> LocateResult<Option<TapAction>> {
        let Some(found) = self.find_optional(session, template).await? else {
            log::info!("'{}' not shown, nothing to dismiss", template.name());
            return Ok(None);
        };

        let (x, y) = fallback;
        self.dispatcher.tap(session, x, y).await?;
        Ok(Some(TapAction {
            x,
            y,
            score: found.score,
        }))
    }

    async fn find_once<S: DeviceSession>(
        &self,
        session: &S,
        template: &Template,
    ) -> LocateResult<MatchResult> {
        let screen = self.acquirer.acquire(session).await?;
        let found = locate(&screen, template.bitmap(), self.threshold)?;
        log::info!("found '{}' at {}", template.name(), found);
        Ok(found)
    }

    async fn find_optional<S: DeviceSession>(
        &self,
        session: &S,
        template: &Template,
    ) -> LocateResult<Option<MatchResult>> {
        match self.find_once(session, template).await {
            Ok(found) => Ok(Some(found)),
            Err(LocateError::NotFound { best_score, .. }) => {
                log::debug!("'{}' absent (best {:.3})", template.name(), best_score);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn tap_match<S: DeviceSession>(
        &self,
        session: &S,
        found: &MatchResult,
    ) -> LocateResult<TapAction> {
        let (x, y) = found.anchor(self.anchor);
        self.dispatcher.tap(session, x, y).await?;
        Ok(TapAction {
            x,
            y,
            score: found.score,
        })
    }
}
