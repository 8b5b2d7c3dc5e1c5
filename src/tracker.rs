use std::sync::Arc;

use anyhow::Result;

use crate::client::CarrierClient;
use crate::config::TrackerConfig;
use crate::credential::CarrierCredential;
use crate::diagnostics;
use crate::error::TrackError;
use crate::resolver::{AttemptLog, OrderResolver, Strategy, try_sequence};
use crate::sheet::{AppsScriptSheet, SheetLookup};
use crate::types::{CarrierMode, Diagnostics, IdentifierKind, IdentifierList, ShipmentPayload, TrackingQuery};

/// Entry point for tracking requests.
///
/// Holds only read-only configuration and pooled clients, so one instance is
/// shared by every request.
pub struct Tracker {
    config: TrackerConfig,
    carrier: CarrierClient,
    sheet: Arc<dyn SheetLookup>,
}

impl Tracker {
    pub fn new(config: TrackerConfig) -> Result<Self> {
        let carrier = CarrierClient::new(&config)?;
        let sheet = Arc::new(AppsScriptSheet::new(&config)?);
        Ok(Self::with_parts(config, carrier, sheet))
    }

    pub fn with_parts(
        config: TrackerConfig,
        carrier: CarrierClient,
        sheet: Arc<dyn SheetLookup>,
    ) -> Self {
        Self {
            config,
            carrier,
            sheet,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Credentials in the order they should be tried.
    ///
    /// A usable hint puts its tier first and keeps the other tier second even
    /// if that one has no token; the carrier client skips it. Without a usable
    /// hint only configured tiers are listed, surface first.
    pub fn trial_order(&self, hint: Option<CarrierMode>) -> Vec<&CarrierCredential> {
        if let Some(mode) = hint
            && self.config.credential(mode).is_present()
        {
            return vec![
                self.config.credential(mode),
                self.config.credential(mode.other()),
            ];
        }

        [&self.config.surface, &self.config.express]
            .into_iter()
            .filter(|c| c.is_present())
            .collect()
    }

    pub async fn handle(&self, query: &TrackingQuery) -> Result<ShipmentPayload, TrackError> {
        if query.raw.trim().is_empty() {
            return Err(TrackError::MissingIdentifier);
        }

        let sequence = self.trial_order(query.hint);
        if sequence.is_empty() {
            tracing::warn!("No carrier tokens configured");
            return Err(TrackError::NoTokens);
        }

        let ids = IdentifierList::parse(&query.raw)?;
        tracing::info!(
            "Tracking {} {:?} identifier(s), trying {:?}",
            ids.len(),
            query.kind,
            sequence.iter().map(|c| c.mode()).collect::<Vec<_>>()
        );

        match query.kind {
            IdentifierKind::OrderId => {
                OrderResolver::new(&self.carrier, self.sheet.as_ref(), &self.config.endpoints)
                    .resolve_by_order_id(&ids, &sequence)
                    .await
            }
            IdentifierKind::Waybill => {
                let mut log = AttemptLog::default();
                try_sequence(
                    &self.carrier,
                    &self.config.endpoints.waybill,
                    &ids,
                    &sequence,
                    Strategy::Awb,
                    &mut log,
                )
                .await
                .ok_or_else(|| TrackError::Upstream {
                    detail: log.joined(),
                })
            }
        }
    }

    pub fn self_test(&self) -> Diagnostics {
        diagnostics::self_test(&self.config, self.sheet.is_configured())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct NoSheet;

    #[async_trait]
    impl SheetLookup for NoSheet {
        async fn awb_for_order(&self, _order_id: &str) -> Option<String> {
            None
        }
    }

    fn tracker(surface: &str, express: &str) -> Tracker {
        let config = TrackerConfig {
            surface: CarrierCredential::new(CarrierMode::Surface, surface),
            express: CarrierCredential::new(CarrierMode::Express, express),
            ..Default::default()
        };
        let carrier = CarrierClient::new(&config).unwrap();
        Tracker::with_parts(config, carrier, Arc::new(NoSheet))
    }

    fn modes(sequence: &[&CarrierCredential]) -> Vec<CarrierMode> {
        sequence.iter().map(|c| c.mode()).collect()
    }

    #[test]
    fn test_default_order_surface_first() {
        let t = tracker("s", "e");
        assert_eq!(
            modes(&t.trial_order(None)),
            vec![CarrierMode::Surface, CarrierMode::Express]
        );
    }

    #[test]
    fn test_express_hint_goes_first() {
        let t = tracker("s", "e");
        assert_eq!(
            modes(&t.trial_order(Some(CarrierMode::Express))),
            vec![CarrierMode::Express, CarrierMode::Surface]
        );
    }

    #[test]
    fn test_hint_for_missing_token_ignored() {
        let t = tracker("s", "");
        assert_eq!(
            modes(&t.trial_order(Some(CarrierMode::Express))),
            vec![CarrierMode::Surface]
        );
    }

    #[test]
    fn test_hint_keeps_absent_fallback() {
        let t = tracker("", "e");
        assert_eq!(
            modes(&t.trial_order(Some(CarrierMode::Express))),
            vec![CarrierMode::Express, CarrierMode::Surface]
        );
        assert_eq!(modes(&t.trial_order(None)), vec![CarrierMode::Express]);
    }

    #[tokio::test]
    async fn test_no_tokens_fails_before_split() {
        let t = tracker("", "");
        let many = (0..60).map(|i| i.to_string()).collect::<Vec<_>>().join(",");
        let err = t.handle(&TrackingQuery::waybill(many)).await.unwrap_err();
        assert!(matches!(err, TrackError::NoTokens));
    }

    #[tokio::test]
    async fn test_too_many_values() {
        let t = tracker("s", "");
        let many = (0..51).map(|i| format!("ORD{}", i)).collect::<Vec<_>>().join(",");
        let err = t.handle(&TrackingQuery::order_id(many)).await.unwrap_err();
        assert!(matches!(err, TrackError::TooManyValues));
    }

    #[tokio::test]
    async fn test_blank_list_is_missing() {
        let t = tracker("s", "");
        let err = t.handle(&TrackingQuery::waybill(" , ,")).await.unwrap_err();
        assert!(matches!(err, TrackError::MissingIdentifier));
    }
}
