//! Configuration for cloud sessions and the screen locator.
//!
//! Values are read through a key lookup so callers and tests can inject
//! their own source. In production the lookup is the process environment
//! layered over a `.env` file in the working directory. Blank values fall
//! back to the defaults declared next to each key.

use crate::capabilities::Platform;
use crate::device_query::DeviceQuery;
use crate::error::{LocateError, LocateResult};
use crate::session::commands::{AUTOMOTIVE_SCREENSHOT, AUTOMOTIVE_TAP};
use crate::template_matching::{ColorMode, TapAnchor, Threshold};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub const CLOUD_URL: &str = "CLOUD_URL";
pub const DEFAULT_CLOUD_URL: &str = "http://localhost:4723";

pub const ACCESS_KEY: &str = "ACCESS_KEY";
pub const DEFAULT_ACCESS_KEY: &str = "";

pub const APPIUM_VERSION: &str = "APPIUM_VERSION";
pub const DEFAULT_APPIUM_VERSION: &str = "2.0.0";

pub const ANDROID_DEVICE_QUERY: &str = "ANDROID_DEVICE_QUERY";
pub const DEFAULT_ANDROID_DEVICE_QUERY: &str = "@os='android'";

pub const IOS_DEVICE_QUERY: &str = "IOS_DEVICE_QUERY";
pub const DEFAULT_IOS_DEVICE_QUERY: &str = "@os='ios'";

pub const LOCATOR_THRESHOLD: &str = "LOCATOR_THRESHOLD";
pub const LOCATOR_ATTEMPTS: &str = "LOCATOR_ATTEMPTS";
pub const DEFAULT_ATTEMPTS: u32 = 3;

pub const LOCATOR_RETRY_DELAY_MS: &str = "LOCATOR_RETRY_DELAY_MS";
pub const DEFAULT_RETRY_DELAY_MS: u64 = 3000;

pub const LOCATOR_TIMEOUT_MS: &str = "LOCATOR_TIMEOUT_MS";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

const HUB_SUFFIX: &str = "/wd/hub";

pub const DOTENV_FILE: &str = ".env";

/// Read `KEY=value` pairs from a dotenv file without touching the process environment.
///
/// A missing file is an empty map; malformed lines are skipped with a warning.
pub fn load_dotenv(path: impl AsRef<Path>) -> HashMap<String, String> {
    let path = path.as_ref();
    match dotenvy::from_path_iter(path) {
        Ok(entries) => entries
            .filter_map(|entry| match entry {
                Ok(pair) => Some(pair),
                Err(e) => {
                    log::warn!("skipping line in {}: {}", path.display(), e);
                    None
                }
            })
            .collect(),
        Err(e) if e.not_found() => HashMap::new(),
        Err(e) => {
            log::warn!("cannot read {}: {}", path.display(), e);
            HashMap::new()
        }
    }
}

/// Lookup that prefers `primary` and falls back to `file` for unset or blank keys
pub fn layered_lookup(
    primary: impl Fn(&str) -> Option<String>,
    file: HashMap<String, String>,
) -> impl Fn(&str) -> Option<String> {
    move |key: &str| {
        primary(key)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| file.get(key).cloned())
    }
}

/// Process environment first, then `.env`, then the defaults
fn env_lookup() -> impl Fn(&str) -> Option<String> {
    layered_lookup(|key| std::env::var(key).ok(), load_dotenv(DOTENV_FILE))
}

fn lookup_value(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_value<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> LocateResult<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    lookup_value(lookup, key)
        .map(|raw| {
            raw.parse::<T>().map_err(|e| LocateError::Config {
                key: key.to_string(),
                description: format!("'{raw}': {e}"),
            })
        })
        .transpose()
}

/// Where and as whom sessions are opened
#[derive(Debug, Clone, PartialEq)]
pub struct CloudConfig {
    hub_url: String,
    access_key: String,
    appium_version: String,
    android_device_query: DeviceQuery,
    ios_device_query: DeviceQuery,
}

impl CloudConfig {
    pub fn from_env() -> LocateResult<Self> {
        Self::from_lookup(env_lookup())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> LocateResult<Self> {
        let url = lookup_value(&lookup, CLOUD_URL).unwrap_or_else(|| DEFAULT_CLOUD_URL.to_string());
        let hub_url = if url.ends_with(HUB_SUFFIX) {
            url
        } else {
            format!("{}{HUB_SUFFIX}", url.trim_end_matches('/'))
        };

        let device_query = |key: &str, default: &str| -> LocateResult<DeviceQuery> {
            let raw = lookup_value(&lookup, key).unwrap_or_else(|| default.to_string());
            DeviceQuery::parse(&raw).map_err(|e| LocateError::Config {
                key: key.to_string(),
                description: e.to_string(),
            })
        };

        Ok(Self {
            android_device_query: device_query(ANDROID_DEVICE_QUERY, DEFAULT_ANDROID_DEVICE_QUERY)?,
            ios_device_query: device_query(IOS_DEVICE_QUERY, DEFAULT_IOS_DEVICE_QUERY)?,
            access_key: lookup_value(&lookup, ACCESS_KEY)
                .unwrap_or_else(|| DEFAULT_ACCESS_KEY.to_string()),
            appium_version: lookup_value(&lookup, APPIUM_VERSION)
                .unwrap_or_else(|| DEFAULT_APPIUM_VERSION.to_string()),
            hub_url,
        })
    }

    /// Hub endpoint, always ending in `/wd/hub`
    pub fn hub_url(&self) -> &str {
        &self.hub_url
    }

    /// REST API root of the cloud, i.e. the hub URL without `/wd/hub`
    pub fn api_base_url(&self) -> &str {
        self.hub_url.strip_suffix(HUB_SUFFIX).unwrap_or(&self.hub_url)
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    pub fn appium_version(&self) -> &str {
        &self.appium_version
    }

    pub fn device_query(&self, platform: Platform) -> &DeviceQuery {
        match platform {
            Platform::Android => &self.android_device_query,
            Platform::Ios => &self.ios_device_query,
        }
    }
}

/// Matching, retry and command settings for the screen locator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    /// Minimum correlation for a match (inclusive)
    pub threshold: Threshold,
    /// Screenshot+match attempts before giving up (at least 1)
    pub attempts: u32,
    /// Pause between attempts
    pub retry_delay_ms: u64,
    /// Deadline for each screenshot or tap command
    pub timeout_ms: u64,
    pub anchor: TapAnchor,
    pub color_mode: ColorMode,
    pub screenshot_command: String,
    pub tap_command: String,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            threshold: Threshold::default(),
            attempts: DEFAULT_ATTEMPTS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            anchor: TapAnchor::default(),
            color_mode: ColorMode::default(),
            screenshot_command: AUTOMOTIVE_SCREENSHOT.to_string(),
            tap_command: AUTOMOTIVE_TAP.to_string(),
        }
    }
}

impl LocatorConfig {
    pub fn from_env() -> LocateResult<Self> {
        Self::from_lookup(env_lookup())
    }

    /// Defaults overridden by any `LOCATOR_*` keys present
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> LocateResult<Self> {
        let mut config = Self::default();
        if let Some(value) = parse_value::<f32>(&lookup, LOCATOR_THRESHOLD)? {
            config.threshold = Threshold::new(value).map_err(|e| LocateError::Config {
                key: LOCATOR_THRESHOLD.to_string(),
                description: e.to_string(),
            })?;
        }
        if let Some(value) = parse_value::<u32>(&lookup, LOCATOR_ATTEMPTS)? {
            config.attempts = value;
        }
        if let Some(value) = parse_value::<u64>(&lookup, LOCATOR_RETRY_DELAY_MS)? {
            config.retry_delay_ms = value;
        }
        if let Some(value) = parse_value::<u64>(&lookup, LOCATOR_TIMEOUT_MS)? {
            config.timeout_ms = value;
        }
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file; missing fields keep their defaults
    pub fn load(path: impl AsRef<Path>) -> LocateResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| LocateError::Config {
            key: path.display().to_string(),
            description: e.to_string(),
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|e| LocateError::Config {
            key: path.display().to_string(),
            description: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> LocateResult<()> {
        if self.attempts == 0 {
            return Err(LocateError::Config {
                key: LOCATOR_ATTEMPTS.to_string(),
                description: "must be at least 1".to_string(),
            });
        }
        if self.timeout_ms == 0 {
            return Err(LocateError::Config {
                key: LOCATOR_TIMEOUT_MS.to_string(),
                description: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_cloud_defaults() {
        let config = CloudConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.hub_url(), "http://localhost:4723/wd/hub");
        assert_eq!(config.api_base_url(), "http://localhost:4723");
        assert_eq!(config.access_key(), "");
        assert_eq!(config.appium_version(), "2.0.0");
        assert_eq!(config.device_query(Platform::Android).as_str(), "@os='android'");
        assert_eq!(config.device_query(Platform::Ios).as_str(), "@os='ios'");
    }

    #[test]
    fn test_cloud_url_suffix_not_duplicated() {
        let config =
            CloudConfig::from_lookup(lookup(&[(CLOUD_URL, "https://cloud.example/wd/hub")])).unwrap();
        assert_eq!(config.hub_url(), "https://cloud.example/wd/hub");
        assert_eq!(config.api_base_url(), "https://cloud.example");

        let config = CloudConfig::from_lookup(lookup(&[(CLOUD_URL, "https://cloud.example/")])).unwrap();
        assert_eq!(config.hub_url(), "https://cloud.example/wd/hub");
    }

    #[test]
    fn test_blank_values_use_defaults_and_values_are_trimmed() {
        let config = CloudConfig::from_lookup(lookup(&[
            (APPIUM_VERSION, "   "),
            (ACCESS_KEY, "  key-123 \n"),
        ]))
        .unwrap();
        assert_eq!(config.appium_version(), DEFAULT_APPIUM_VERSION);
        assert_eq!(config.access_key(), "key-123");
    }

    #[test]
    fn test_invalid_device_query_names_the_key() {
        let err = CloudConfig::from_lookup(lookup(&[(IOS_DEVICE_QUERY, "ios")])).unwrap_err();
        match err {
            LocateError::Config { key, .. } => assert_eq!(key, IOS_DEVICE_QUERY),
            other => panic!("expected Config, got {other:?}"),
        }
    }

    fn write_dotenv(name: &str, contents: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("screen-locator-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(DOTENV_FILE);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_dotenv_file_fills_gaps_left_by_environment() {
        let path = write_dotenv(
            "layered",
            "ACCESS_KEY=file-key\nAPPIUM_VERSION=1.22.3\nCLOUD_URL=https://file.example\nIOS_DEVICE_QUERY=\n",
        );
        let file = load_dotenv(&path);
        assert_eq!(file.get(ACCESS_KEY).map(String::as_str), Some("file-key"));

        let config = CloudConfig::from_lookup(layered_lookup(
            lookup(&[(ACCESS_KEY, "env-key"), (APPIUM_VERSION, "  ")]),
            file,
        ))
        .unwrap();

        // environment wins over the file
        assert_eq!(config.access_key(), "env-key");
        // blank environment value falls through to the file
        assert_eq!(config.appium_version(), "1.22.3");
        assert_eq!(config.hub_url(), "https://file.example/wd/hub");
        // blank in both falls back to the default
        assert_eq!(config.device_query(Platform::Ios).as_str(), DEFAULT_IOS_DEVICE_QUERY);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_dotenv_file_is_empty() {
        let path = std::env::temp_dir().join("screen-locator-no-such-dir").join(DOTENV_FILE);
        assert!(load_dotenv(path).is_empty());
    }

    #[test]
    fn test_locator_defaults() {
        let config = LocatorConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, LocatorConfig::default());
        assert_eq!(config.threshold.value(), 0.8);
        assert_eq!(config.attempts, 3);
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.screenshot_command, AUTOMOTIVE_SCREENSHOT);
    }

    #[test]
    fn test_default_anchor_is_match_origin() {
        assert_eq!(LocatorConfig::default().anchor, TapAnchor::TopLeft);
        let config: LocatorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.anchor, TapAnchor::TopLeft);
    }

    #[test]
    fn test_locator_overrides() {
        let config = LocatorConfig::from_lookup(lookup(&[
            (LOCATOR_THRESHOLD, "0.9"),
            (LOCATOR_ATTEMPTS, "5"),
            (LOCATOR_RETRY_DELAY_MS, "250"),
        ]))
        .unwrap();
        assert_eq!(config.threshold.value(), 0.9);
        assert_eq!(config.attempts, 5);
        assert_eq!(config.retry_delay(), Duration::from_millis(250));
    }

    #[test]
    fn test_locator_rejects_bad_values() {
        for pairs in [
            [(LOCATOR_THRESHOLD, "high")],
            [(LOCATOR_THRESHOLD, "1.5")],
            [(LOCATOR_ATTEMPTS, "0")],
            [(LOCATOR_TIMEOUT_MS, "-1")],
        ] {
            let err = LocatorConfig::from_lookup(lookup(&pairs)).unwrap_err();
            assert!(matches!(err, LocateError::Config { .. }), "{pairs:?}");
        }
    }

    #[test]
    fn test_locator_json_partial() {
        let config: LocatorConfig =
            serde_json::from_str(r#"{"threshold":0.95,"anchor":"center","color_mode":"luma"}"#)
                .unwrap();
        assert_eq!(config.threshold.value(), 0.95);
        assert_eq!(config.anchor, TapAnchor::Center);
        assert_eq!(config.color_mode, ColorMode::Luma);
        assert_eq!(config.attempts, DEFAULT_ATTEMPTS);

        assert!(serde_json::from_str::<LocatorConfig>(r#"{"threshold":2.0}"#).is_err());
    }
}
