use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Failure of a tracking request.
///
/// Individual carrier attempts never surface here; only exhaustion of every
/// fallback does, carrying the trail of what was tried.
#[derive(thiserror::Error, Debug)]
pub enum TrackError {
    #[error("Missing awb or id")]
    MissingIdentifier,
    #[error("Too many values (max 50)")]
    TooManyValues,
    #[error("Delhivery request failed")]
    NoTokens,
    #[error("No data found for this Order ID")]
    OrderNotFound { detail: String },
    #[error("Delhivery request failed")]
    Upstream { detail: String },
}

impl TrackError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingIdentifier | Self::TooManyValues => StatusCode::BAD_REQUEST,
            Self::OrderNotFound { .. } => StatusCode::NOT_FOUND,
            Self::NoTokens | Self::Upstream { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::NoTokens => Some("No tokens present"),
            Self::OrderNotFound { detail } | Self::Upstream { detail } => Some(detail),
            Self::MissingIdentifier | Self::TooManyValues => None,
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
            detail: self.detail().map(str::to_string),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl IntoResponse for TrackError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

/// Failure of one of the Apps Script relays
#[derive(thiserror::Error, Debug)]
pub enum RelayError {
    #[error("Relay endpoint not configured")]
    NotConfigured,
    #[error("Empty body")]
    EmptyBody,
    #[error("Invalid JSON")]
    InvalidJson,
    #[error("Write request failed")]
    WriteFailed(#[source] reqwest::Error),
    #[error("Upstream error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Proxy failed: HTTP {}", .0.as_u16())]
    UpstreamStatus(StatusCode),
    #[error("Apps Script returned HTML (check deployment link or permissions)")]
    HtmlResponse,
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::EmptyBody | Self::InvalidJson => StatusCode::BAD_REQUEST,
            Self::NotConfigured | Self::WriteFailed(_) | Self::Transport(_) => {
                StatusCode::BAD_GATEWAY
            }
            Self::UpstreamStatus(status) => *status,
            Self::HtmlResponse => StatusCode::OK,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let mut body = serde_json::json!({
            "ok": false,
            "error": self.to_string(),
        });
        if let Self::WriteFailed(source) = &self {
            body["detail"] = source.to_string().into();
        }

        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(TrackError::MissingIdentifier.status(), StatusCode::BAD_REQUEST);
        assert_eq!(TrackError::TooManyValues.status(), StatusCode::BAD_REQUEST);
        assert_eq!(TrackError::NoTokens.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            TrackError::OrderNotFound {
                detail: "x".into()
            }
            .status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_no_tokens_body() {
        let body = serde_json::to_value(TrackError::NoTokens.body()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"error": "Delhivery request failed", "detail": "No tokens present"})
        );
    }

    #[test]
    fn test_detail_omitted_for_input_errors() {
        let body = serde_json::to_value(TrackError::TooManyValues.body()).unwrap();
        assert_eq!(body, serde_json::json!({"error": "Too many values (max 50)"}));
    }

    #[test]
    fn test_relay_status_passthrough() {
        let err = RelayError::UpstreamStatus(StatusCode::FORBIDDEN);
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.to_string(), "Proxy failed: HTTP 403");
    }
}
