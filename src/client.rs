use anyhow::Result;
use reqwest::{Client, header};
use url::form_urlencoded;

use crate::config::{self, TrackerConfig};
use crate::credential::{AuthStyle, CarrierCredential};
use crate::types::ShipmentPayload;

/// Delhivery tracking API client.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Clone)]
pub struct CarrierClient {
    http_client: Client,
    auth_style: AuthStyle,
}

impl CarrierClient {
    pub fn new(config: &TrackerConfig) -> Result<Self> {
        Ok(Self::with_http_client(
            config::http_client(config.timeout)?,
            config.auth_style,
        ))
    }

    pub fn with_http_client(http_client: Client, auth_style: AuthStyle) -> Self {
        Self {
            http_client,
            auth_style,
        }
    }

    pub fn auth_style(&self) -> AuthStyle {
        self.auth_style
    }

    /// Fetch shipments for an already-capped CSV of identifiers.
    ///
    /// Returns `None` without any request when the credential is absent, and
    /// `None` after every header shape has been tried without a usable payload.
    /// Neither case is an error: callers move on to their next fallback.
    pub async fn fetch_shipment(
        &self,
        template: &str,
        ids_csv: &str,
        credential: &CarrierCredential,
    ) -> Option<ShipmentPayload> {
        if !credential.is_present() {
            return None;
        }

        let url = fill_template(template, ids_csv);

        for shape in self.auth_style.shapes() {
            let (name, value) = match shape.header(credential.token()) {
                Ok(header) => header,
                Err(e) => {
                    tracing::debug!(mode = %credential.mode(), ?shape, "Unusable token header: {}", e);
                    continue;
                }
            };

            let response = match self
                .http_client
                .get(&url)
                .header(name, value)
                .header(header::ACCEPT, "application/json")
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    tracing::debug!(mode = %credential.mode(), ?shape, "Carrier request failed: {}", e);
                    continue;
                }
            };

            let status = response.status();
            if status.as_u16() >= 300 {
                tracing::debug!(mode = %credential.mode(), ?shape, %status, "Carrier rejected request");
                continue;
            }

            let body = match response.bytes().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::debug!(mode = %credential.mode(), ?shape, "Failed to read carrier body: {}", e);
                    continue;
                }
            };

            if let Some(payload) = ShipmentPayload::from_body(body) {
                tracing::debug!(
                    mode = %credential.mode(),
                    ?shape,
                    shipments = payload.shipment_count(),
                    "Carrier returned shipments"
                );
                return Some(payload);
            }
            tracing::debug!(mode = %credential.mode(), ?shape, "Carrier returned no shipment data");
        }

        None
    }
}

/// Substitute the form-encoded CSV into the template's `{}` slot
pub fn fill_template(template: &str, ids_csv: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(ids_csv.as_bytes()).collect();
    template.replacen("{}", &encoded, 1)
}
