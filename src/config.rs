use std::env;
use std::time::Duration;

use anyhow::{Result, bail};

use crate::credential::{AuthStyle, CarrierCredential};
use crate::types::CarrierMode;

pub const DEFAULT_AWB_URL: &str = "https://track.delhivery.com/api/v1/packages/json/?waybill={}";
pub const DEFAULT_ORDER_URL: &str = "https://track.delhivery.com/api/v1/packages/json/?ref_ids={}";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);
pub const MAX_REDIRECTS: usize = 5;

/// Carrier URL templates, each with one `{}` slot for the encoded CSV
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub waybill: String,
    pub ref_ids: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            waybill: DEFAULT_AWB_URL.to_string(),
            ref_ids: DEFAULT_ORDER_URL.to_string(),
        }
    }
}

/// Apps Script deployments behind the sheet lookup and the relays
#[derive(Debug, Clone, Default)]
pub struct ScriptEndpoints {
    pub read: Option<String>,
    pub write: Option<String>,
    pub admin: Option<String>,
}

/// Process-wide tracking configuration, immutable once loaded
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub surface: CarrierCredential,
    pub express: CarrierCredential,
    pub auth_style: AuthStyle,
    pub endpoints: Endpoints,
    pub scripts: ScriptEndpoints,
    pub timeout: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            surface: CarrierCredential::new(CarrierMode::Surface, ""),
            express: CarrierCredential::new(CarrierMode::Express, ""),
            auth_style: AuthStyle::default(),
            endpoints: Endpoints::default(),
            scripts: ScriptEndpoints::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl TrackerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let endpoints = Endpoints {
            waybill: get("DLV_AWB_URL").unwrap_or_else(|| DEFAULT_AWB_URL.to_string()),
            ref_ids: get("DLV_ORDER_URL").unwrap_or_else(|| DEFAULT_ORDER_URL.to_string()),
        };
        for template in [&endpoints.waybill, &endpoints.ref_ids] {
            if !template.contains("{}") {
                bail!("URL template '{}' has no '{{}}' slot", template);
            }
        }

        let timeout = match get("UPSTREAM_TIMEOUT_SECS") {
            Some(secs) => Duration::from_secs(secs.parse()?),
            None => DEFAULT_TIMEOUT,
        };

        Ok(Self {
            surface: CarrierCredential::new(
                CarrierMode::Surface,
                get("DLV_SURFACE_TOKEN").unwrap_or_default(),
            ),
            express: CarrierCredential::new(
                CarrierMode::Express,
                get("DLV_EXPRESS_TOKEN").unwrap_or_default(),
            ),
            auth_style: get("DLV_AUTH_STYLE")
                .map(|s| AuthStyle::parse(&s))
                .unwrap_or_default(),
            endpoints,
            scripts: ScriptEndpoints {
                read: get("SHEET_SCRIPT_URL"),
                write: get("SHEET_WRITE_URL"),
                admin: get("ADMIN_SCRIPT_URL"),
            },
            timeout,
        })
    }

    pub fn credential(&self, mode: CarrierMode) -> &CarrierCredential {
        match mode {
            CarrierMode::Surface => &self.surface,
            CarrierMode::Express => &self.express,
        }
    }
}

/// HTTP client shared by every outbound call: bounded timeout and redirects
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = TrackerConfig::from_lookup(lookup(&[])).unwrap();
        assert!(!config.surface.is_present());
        assert!(!config.express.is_present());
        assert_eq!(config.auth_style, AuthStyle::Token);
        assert_eq!(config.endpoints.waybill, DEFAULT_AWB_URL);
        assert_eq!(config.timeout, Duration::from_secs(20));
        assert!(config.scripts.read.is_none());
    }

    #[test]
    fn test_reads_tokens_and_style() {
        let config = TrackerConfig::from_lookup(lookup(&[
            ("DLV_SURFACE_TOKEN", "s-token"),
            ("DLV_EXPRESS_TOKEN", "  "),
            ("DLV_AUTH_STYLE", "bearer"),
            ("SHEET_SCRIPT_URL", "https://script.example/exec"),
            ("UPSTREAM_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();

        assert_eq!(config.credential(CarrierMode::Surface).token(), "s-token");
        assert!(!config.credential(CarrierMode::Express).is_present());
        assert_eq!(config.auth_style, AuthStyle::Bearer);
        assert_eq!(
            config.scripts.read.as_deref(),
            Some("https://script.example/exec")
        );
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_rejects_template_without_slot() {
        let result =
            TrackerConfig::from_lookup(lookup(&[("DLV_AWB_URL", "https://x.example/?waybill=")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_bad_timeout() {
        assert!(TrackerConfig::from_lookup(lookup(&[("UPSTREAM_TIMEOUT_SECS", "soon")])).is_err());
    }
}
