//! Delhivery API credentials and the authorization header shapes tried for them.
//!
//! Delhivery documents the token header differently across account types, so
//! every call walks a small fixed list of shapes. The configured [`AuthStyle`]
//! only decides which shape goes first.

use std::fmt;

use reqwest::header::{AUTHORIZATION, HeaderName, HeaderValue, InvalidHeaderValue};

use crate::types::CarrierMode;

/// API token for one service tier. An empty token means the tier is not configured.
#[derive(Clone)]
pub struct CarrierCredential {
    mode: CarrierMode,
    token: String,
}

impl CarrierCredential {
    pub fn new(mode: CarrierMode, token: impl Into<String>) -> Self {
        Self {
            mode,
            token: token.into().trim().to_string(),
        }
    }

    pub fn mode(&self) -> CarrierMode {
        self.mode
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn is_present(&self) -> bool {
        !self.token.is_empty()
    }
}

// Tokens stay out of logs.
impl fmt::Debug for CarrierCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CarrierCredential")
            .field("mode", &self.mode)
            .field("present", &self.is_present())
            .finish()
    }
}

/// Preferred header format for the account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthStyle {
    #[default]
    Token,
    Bearer,
    X,
}

impl AuthStyle {
    /// Unknown values fall back to `Token`, which most accounts use.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "bearer" => Self::Bearer,
            "x" => Self::X,
            _ => Self::Token,
        }
    }

    /// Header shapes in the order they are tried
    pub fn shapes(self) -> [AuthHeaderShape; 4] {
        use AuthHeaderShape::*;
        match self {
            Self::Bearer => [Bearer, Token, TokenEquals, XAuthorizationToken],
            Self::X => [XAuthorizationToken, Token, TokenEquals, Bearer],
            Self::Token => [Token, TokenEquals, Bearer, XAuthorizationToken],
        }
    }
}

impl fmt::Display for AuthStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token => write!(f, "Token"),
            Self::Bearer => write!(f, "Bearer"),
            Self::X => write!(f, "X"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthHeaderShape {
    /// `Authorization: Token <t>`
    Token,
    /// `Authorization: Token token=<t>`
    TokenEquals,
    /// `Authorization: Bearer <t>`
    Bearer,
    /// `X-Authorization-Token: <t>`
    XAuthorizationToken,
}

impl AuthHeaderShape {
    pub fn header(self, token: &str) -> Result<(HeaderName, HeaderValue), InvalidHeaderValue> {
        let (name, value) = match self {
            Self::Token => (AUTHORIZATION, format!("Token {}", token)),
            Self::TokenEquals => (AUTHORIZATION, format!("Token token={}", token)),
            Self::Bearer => (AUTHORIZATION, format!("Bearer {}", token)),
            Self::XAuthorizationToken => (
                HeaderName::from_static("x-authorization-token"),
                token.to_string(),
            ),
        };
        Ok((name, HeaderValue::from_str(&value)?))
    }
}
