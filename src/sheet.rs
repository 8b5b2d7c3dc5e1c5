//! Spreadsheet-backed order lookup.
//!
//! The sheet lives behind a deployed Apps Script endpoint that answers
//! `?id=<order>` or `?awb=<waybill>` with `{ok, data: {awb, ...}}`.

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode};

use crate::config::{self, TrackerConfig};
use crate::error::RelayError;
use crate::types::SheetResponse;

/// Translates a merchant order ID into a carrier waybill
#[async_trait]
pub trait SheetLookup: Send + Sync {
    /// `None` when the sheet has no waybill for the order or cannot be reached.
    async fn awb_for_order(&self, order_id: &str) -> Option<String>;

    fn is_configured(&self) -> bool {
        true
    }
}

/// Which column the read endpoint should search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetKey {
    Id,
    Awb,
}

impl SheetKey {
    fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Awb => "awb",
        }
    }
}

/// Apps Script read endpoint client
#[derive(Clone)]
pub struct AppsScriptSheet {
    http_client: Client,
    url: Option<String>,
}

impl AppsScriptSheet {
    pub fn new(config: &TrackerConfig) -> Result<Self> {
        Ok(Self::with_http_client(
            config::http_client(config.timeout)?,
            config.scripts.read.clone(),
        ))
    }

    pub fn with_http_client(http_client: Client, url: Option<String>) -> Self {
        Self { http_client, url }
    }

    /// Raw GET against the read endpoint; status and body are returned untouched.
    pub async fn query(&self, key: SheetKey, value: &str) -> Result<(StatusCode, Bytes), RelayError> {
        let url = self.url.as_deref().ok_or(RelayError::NotConfigured)?;

        let response = self
            .http_client
            .get(url)
            .query(&[(key.as_str(), value)])
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        Ok((status, body))
    }
}

#[async_trait]
impl SheetLookup for AppsScriptSheet {
    async fn awb_for_order(&self, order_id: &str) -> Option<String> {
        let (status, body) = match self.query(SheetKey::Id, order_id).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!("Sheet lookup for {} failed: {}", order_id, e);
                return None;
            }
        };

        if status.as_u16() >= 300 {
            tracing::warn!("Sheet lookup for {} returned {}", order_id, status);
            return None;
        }

        match serde_json::from_slice::<SheetResponse>(&body) {
            Ok(reply) => reply.awb(),
            Err(e) => {
                tracing::warn!("Sheet lookup for {} returned unreadable body: {}", order_id, e);
                None
            }
        }
    }

    fn is_configured(&self) -> bool {
        self.url.is_some()
    }
}
