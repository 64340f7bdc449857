//! Session capabilities for the cloud device platform

use crate::config::CloudConfig;
use crate::error::{LocateError, LocateResult};
use serde_json::{Map, Value, json};
use std::str::FromStr;

pub const VENDOR_PREFIX: &str = "digitalai:";
pub const EXPERIBANK_PACKAGE: &str = "com.experitest.ExperiBank";
pub const EXPERIBANK_ACTIVITY: &str = ".LoginActivity";
pub const EXPERIBANK_BUNDLE_ID: &str = "com.experitest.ExperiBank";
pub const EXPERIBANK_CLOUD_APP: &str = "cloud:com.experitest.ExperiBank";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Android,
    Ios,
}

impl Platform {
    pub fn platform_name(self) -> &'static str {
        match self {
            Platform::Android => "Android",
            Platform::Ios => "iOS",
        }
    }

    pub fn automation_name(self) -> &'static str {
        match self {
            Platform::Android => "UiAutomator2",
            Platform::Ios => "XCUITest",
        }
    }
}

impl FromStr for Platform {
    type Err = LocateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "android" => Ok(Platform::Android),
            "ios" => Ok(Platform::Ios),
            other => Err(LocateError::Config {
                key: "platform".to_string(),
                description: format!("unknown platform '{other}', expected 'android' or 'ios'"),
            }),
        }
    }
}

/// W3C capability map with vendor-prefixed extensions
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilitySet {
    platform: Platform,
    caps: Map<String, Value>,
}

impl CapabilitySet {
    pub fn for_platform(platform: Platform, cloud: &CloudConfig, test_name: &str) -> Self {
        let mut caps = Map::new();
        caps.insert("platformName".into(), json!(platform.platform_name()));
        caps.insert("appium:automationName".into(), json!(platform.automation_name()));

        let set = Self { platform, caps };
        set.vendor("accessKey", json!(cloud.access_key()))
            .vendor("appiumVersion", json!(cloud.appium_version()))
            .vendor("deviceQuery", json!(cloud.device_query(platform).as_str()))
            .vendor("testName", json!(test_name))
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Set `appium:<key>`
    pub fn appium(mut self, key: &str, value: Value) -> Self {
        self.caps.insert(format!("appium:{key}"), value);
        self
    }

    /// Set `digitalai:<key>`
    pub fn vendor(mut self, key: &str, value: Value) -> Self {
        self.caps.insert(format!("{VENDOR_PREFIX}{key}"), value);
        self
    }

    /// Point the session at the ExperiBank demo app
    pub fn experibank(self) -> Self {
        match self.platform {
            Platform::Android => self
                .appium("app", json!(format!("{EXPERIBANK_CLOUD_APP}/{EXPERIBANK_ACTIVITY}")))
                .appium("appPackage", json!(EXPERIBANK_PACKAGE))
                .appium("appActivity", json!(EXPERIBANK_ACTIVITY)),
            Platform::Ios => self
                .appium("app", json!(EXPERIBANK_CLOUD_APP))
                .appium("bundleId", json!(EXPERIBANK_BUNDLE_ID)),
        }
    }

    pub fn instrument_app(self, enabled: bool) -> Self {
        self.vendor("instrumentApp", json!(enabled))
    }

    /// Stream the car head-unit projection at the given resolution, e.g. `1280x720`
    pub fn automotive_projection(self, screen_size: &str) -> LocateResult<Self> {
        let valid = screen_size
            .split_once('x')
            .is_some_and(|(w, h)| w.parse::<u32>().is_ok() && h.parse::<u32>().is_ok());
        if !valid {
            return Err(LocateError::Config {
                key: "automotiveProjection".to_string(),
                description: format!("expected WIDTHxHEIGHT, got '{screen_size}'"),
            });
        }
        Ok(self.vendor("automotiveProjection", json!(screen_size)))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.caps.get(key)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.caps)
    }

    /// `{"capabilities": {"alwaysMatch": {...}}}` body for a new-session request
    pub fn to_session_request(&self) -> Value {
        json!({ "capabilities": { "alwaysMatch": self.caps } })
    }
}
