use std::time::Duration;

use checkout_common::Secret;
use log::*;

pub const DEFAULT_SDN_API_URL: &str = "https://api.trade.gov/consolidated_screening_list/search";
pub const DEFAULT_SDN_SOURCES: &str = "SDN,ISN";

fn timeout_from_env(var: &str) -> Option<Duration> {
    let value = std::env::var(var).ok()?;
    match value.parse::<u64>() {
        Ok(secs) => Some(Duration::from_secs(secs)),
        Err(e) => {
            warn!("🪛️ Invalid value for {var}: {value}. {e}. No timeout will be applied.");
            None
        },
    }
}

/// Settings for the consolidated screening list (SDN) API.
#[derive(Debug, Clone, Default)]
pub struct SdnConfig {
    pub api_url: String,
    pub api_key: Secret<String>,
    /// Comma-separated list of the lists to search, e.g. "SDN,ISN"
    pub sources: String,
    pub timeout: Option<Duration>,
}

impl SdnConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("CHK_SDN_CHECK_API_URL").unwrap_or_else(|_| {
            info!("🪛️ CHK_SDN_CHECK_API_URL not set, using {DEFAULT_SDN_API_URL}");
            DEFAULT_SDN_API_URL.to_string()
        });
        let api_key = Secret::new(std::env::var("CHK_SDN_CHECK_API_KEY").unwrap_or_else(|_| {
            warn!("🪛️ CHK_SDN_CHECK_API_KEY not set. SDN checks will not be able to reach the screening list.");
            String::default()
        }));
        let sources = std::env::var("CHK_SDN_CHECK_API_LIST").unwrap_or_else(|_| {
            info!("🪛️ CHK_SDN_CHECK_API_LIST not set, using {DEFAULT_SDN_SOURCES}");
            DEFAULT_SDN_SOURCES.to_string()
        });
        let timeout = timeout_from_env("CHK_SDN_CHECK_TIMEOUT_SECS");
        Self { api_url, api_key, sources, timeout }
    }
}

/// Settings for calls to the LMS.
#[derive(Debug, Clone, Default)]
pub struct LmsConfig {
    pub lms_url_root: String,
    pub timeout: Option<Duration>,
}

impl LmsConfig {
    pub fn new<S: Into<String>>(lms_url_root: S) -> Self {
        Self { lms_url_root: lms_url_root.into(), timeout: None }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn new_from_env_or_default() -> Self {
        let lms_url_root = std::env::var("CHK_LMS_URL_ROOT").unwrap_or_else(|_| {
            warn!("🪛️ CHK_LMS_URL_ROOT not set, using (probably useless) default http://localhost:18000");
            "http://localhost:18000".to_string()
        });
        let timeout = timeout_from_env("CHK_LMS_TIMEOUT_SECS");
        Self { lms_url_root, timeout }
    }
}
