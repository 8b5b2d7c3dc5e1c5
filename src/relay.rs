//! Pass-through relays from the admin UI to the Apps Script deployments.

use anyhow::Result;
use bytes::Bytes;
use reqwest::{Client, StatusCode, header};

use crate::config::{self, TrackerConfig};
use crate::error::RelayError;

#[derive(Clone)]
pub struct ScriptRelay {
    http_client: Client,
    write_url: Option<String>,
    admin_url: Option<String>,
}

impl ScriptRelay {
    pub fn new(config: &TrackerConfig) -> Result<Self> {
        Ok(Self::with_http_client(
            config::http_client(config.timeout)?,
            config.scripts.write.clone(),
            config.scripts.admin.clone(),
        ))
    }

    pub fn with_http_client(
        http_client: Client,
        write_url: Option<String>,
        admin_url: Option<String>,
    ) -> Self {
        Self {
            http_client,
            write_url,
            admin_url,
        }
    }

    /// Forward a sheet write. The body must be a JSON object or array; it is
    /// re-serialized before sending. Upstream status and body are relayed as-is.
    pub async fn write(&self, body: &[u8]) -> Result<(StatusCode, Bytes), RelayError> {
        if body.is_empty() {
            return Err(RelayError::EmptyBody);
        }
        // Whitespace-only bodies fail to parse and land here too.
        let payload: serde_json::Value =
            serde_json::from_slice(body).map_err(|_| RelayError::InvalidJson)?;
        if !(payload.is_object() || payload.is_array()) {
            return Err(RelayError::InvalidJson);
        }

        let url = self.write_url.as_deref().ok_or(RelayError::NotConfigured)?;
        let response = self
            .http_client
            .post(url)
            .header(header::ACCEPT, "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(RelayError::WriteFailed)?;

        let status = response.status();
        let body = response.bytes().await.map_err(RelayError::WriteFailed)?;
        Ok((status, body))
    }

    /// Forward an admin call body untouched.
    ///
    /// Apps Script answers with an HTML login page when the deployment is not
    /// public, so any HTML body is reported instead of relayed.
    pub async fn admin(&self, body: Bytes) -> Result<Bytes, RelayError> {
        let url = self.admin_url.as_deref().ok_or(RelayError::NotConfigured)?;
        let response = self
            .http_client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() >= 400 {
            return Err(RelayError::UpstreamStatus(status));
        }

        let body = response.bytes().await?;
        if looks_like_html(&body) {
            tracing::warn!("Admin relay got HTML back from Apps Script");
            return Err(RelayError::HtmlResponse);
        }
        Ok(body)
    }
}

fn looks_like_html(body: &[u8]) -> bool {
    body.windows(5).any(|w| w.eq_ignore_ascii_case(b"<html"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relay() -> ScriptRelay {
        ScriptRelay::with_http_client(Client::new(), None, None)
    }

    #[test]
    fn test_html_detection() {
        assert!(looks_like_html(b"<!DOCTYPE html><HTML><body>Sign in</body>"));
        assert!(looks_like_html(b"  <html lang=\"en\">"));
        assert!(!looks_like_html(br#"{"ok":true,"note":"<b>html</b>"}"#));
        assert!(!looks_like_html(b""));
    }

    #[tokio::test]
    async fn test_write_validates_before_config() {
        assert!(matches!(relay().write(b"").await, Err(RelayError::EmptyBody)));
        assert!(matches!(relay().write(b"  \n").await, Err(RelayError::InvalidJson)));
        assert!(matches!(relay().write(b"{oops").await, Err(RelayError::InvalidJson)));
        assert!(matches!(relay().write(b"5").await, Err(RelayError::InvalidJson)));
        assert!(matches!(relay().write(br#""text""#).await, Err(RelayError::InvalidJson)));
        // Arrays pass validation and reach the missing endpoint.
        assert!(matches!(relay().write(b"[1,2]").await, Err(RelayError::NotConfigured)));
        assert!(matches!(
            relay().write(br#"{"action":"upsert"}"#).await,
            Err(RelayError::NotConfigured)
        ));
    }

    #[tokio::test]
    async fn test_admin_requires_endpoint() {
        let result = relay().admin(Bytes::from_static(b"{}")).await;
        assert!(matches!(result, Err(RelayError::NotConfigured)));
    }
}
