use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::TrackError;

/// Delhivery accepts at most this many identifiers per call.
pub const MAX_IDENTIFIERS: usize = 50;

/// Delhivery service tier, each backed by its own API token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CarrierMode {
    Surface,
    Express,
}

impl CarrierMode {
    /// Parse a `service` hint. Anything other than surface/express is ignored.
    pub fn from_hint(hint: &str) -> Option<Self> {
        match hint.trim().to_lowercase().as_str() {
            "surface" => Some(Self::Surface),
            "express" => Some(Self::Express),
            _ => None,
        }
    }

    pub fn other(self) -> Self {
        match self {
            Self::Surface => Self::Express,
            Self::Express => Self::Surface,
        }
    }
}

impl fmt::Display for CarrierMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Surface => write!(f, "surface"),
            Self::Express => write!(f, "express"),
        }
    }
}

/// Which kind of identifier the client sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    Waybill,
    OrderId,
}

/// Parsed inbound tracking request.
///
/// The raw CSV is kept as-is; it is split into an [`IdentifierList`] only
/// after credential availability has been checked.
#[derive(Debug, Clone)]
pub struct TrackingQuery {
    pub kind: IdentifierKind,
    pub raw: String,
    pub hint: Option<CarrierMode>,
}

impl TrackingQuery {
    /// Build a query from the `awb`, `id` and `service` parameters.
    /// An order ID takes precedence when both are given.
    pub fn from_params(
        awb: Option<&str>,
        id: Option<&str>,
        service: Option<&str>,
    ) -> Result<Self, TrackError> {
        let awb = awb.map(str::trim).unwrap_or("");
        let id = id.map(str::trim).unwrap_or("");
        let hint = service.and_then(CarrierMode::from_hint);

        let (kind, raw) = if !id.is_empty() {
            (IdentifierKind::OrderId, id)
        } else if !awb.is_empty() {
            (IdentifierKind::Waybill, awb)
        } else {
            return Err(TrackError::MissingIdentifier);
        };

        Ok(Self {
            kind,
            raw: raw.to_string(),
            hint,
        })
    }

    pub fn waybill(raw: impl Into<String>) -> Self {
        Self {
            kind: IdentifierKind::Waybill,
            raw: raw.into(),
            hint: None,
        }
    }

    pub fn order_id(raw: impl Into<String>) -> Self {
        Self {
            kind: IdentifierKind::OrderId,
            raw: raw.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: Option<CarrierMode>) -> Self {
        self.hint = hint;
        self
    }
}

/// Comma-separated identifiers, trimmed, blanks dropped, at most 50
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierList {
    values: Vec<String>,
}

impl IdentifierList {
    pub fn parse(raw: &str) -> Result<Self, TrackError> {
        let values: Vec<String> = raw
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if values.len() > MAX_IDENTIFIERS {
            return Err(TrackError::TooManyValues);
        }
        if values.is_empty() {
            return Err(TrackError::MissingIdentifier);
        }

        Ok(Self { values })
    }

    pub fn first(&self) -> &str {
        &self.values[0]
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Re-joined form sent upstream
    pub fn to_csv(&self) -> String {
        self.values.join(",")
    }
}

/// Carrier response that carries at least one shipment.
///
/// The body bytes are kept as received so they can be handed back to the
/// caller verbatim; the parsed value is only used for inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct ShipmentPayload {
    body: Bytes,
    value: Value,
}

impl ShipmentPayload {
    /// Accept a body only if it is an object with a non-empty `ShipmentData` array.
    pub fn from_body(body: impl Into<Bytes>) -> Option<Self> {
        let body = body.into();
        let value: Value = serde_json::from_slice(&body).ok()?;
        let has_shipments = value
            .get("ShipmentData")
            .and_then(Value::as_array)
            .is_some_and(|list| !list.is_empty());

        has_shipments.then_some(Self { body, value })
    }

    pub fn shipment_count(&self) -> usize {
        self.value["ShipmentData"].as_array().map_or(0, Vec::len)
    }

    pub fn as_value(&self) -> &Value {
        &self.value
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn into_body(self) -> Bytes {
        self.body
    }
}

/// Response of the Apps Script read endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct SheetResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub data: Option<SheetRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SheetRow {
    /// Sheets hand numeric cells back as JSON numbers
    #[serde(default)]
    pub awb: Option<Value>,
}

impl SheetResponse {
    /// Trimmed waybill, if the sheet reported success and the row has one
    pub fn awb(&self) -> Option<String> {
        if !self.ok {
            return None;
        }
        let awb = match self.data.as_ref()?.awb.as_ref()? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        (!awb.is_empty()).then_some(awb)
    }
}

/// Self-test output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Diagnostics {
    pub ok: bool,
    pub diag: DiagnosticsDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiagnosticsDetail {
    pub surface_token_present: bool,
    pub express_token_present: bool,
    pub auth_header_format: String,
    pub sheet_lookup_configured: bool,
}
