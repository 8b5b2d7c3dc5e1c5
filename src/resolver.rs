use crate::client::CarrierClient;
use crate::config::Endpoints;
use crate::credential::CarrierCredential;
use crate::error::TrackError;
use crate::sheet::SheetLookup;
use crate::types::{IdentifierList, ShipmentPayload};

/// Lookup strategy, as it appears in the attempt trail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    RefIds,
    SheetAwb,
    Awb,
}

impl Strategy {
    pub fn label(self) -> &'static str {
        match self {
            Self::RefIds => "ref_ids",
            Self::SheetAwb => "sheet→awb",
            Self::Awb => "awb",
        }
    }
}

/// Failed (credential, strategy) pairs, in the order they were tried
#[derive(Debug, Default, Clone)]
pub struct AttemptLog {
    entries: Vec<String>,
}

impl AttemptLog {
    pub fn record(&mut self, credential: &CarrierCredential, strategy: Strategy) {
        self.entries
            .push(format!("{}({}): no data", credential.mode(), strategy.label()));
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn joined(&self) -> String {
        self.entries.join(" | ")
    }
}

/// Try each credential in order with one template; first payload wins.
pub async fn try_sequence(
    carrier: &CarrierClient,
    template: &str,
    ids: &IdentifierList,
    sequence: &[&CarrierCredential],
    strategy: Strategy,
    log: &mut AttemptLog,
) -> Option<ShipmentPayload> {
    let csv = ids.to_csv();
    for credential in sequence {
        if let Some(payload) = carrier.fetch_shipment(template, &csv, credential).await {
            tracing::info!(
                "Found {} shipment(s) via {}({})",
                payload.shipment_count(),
                credential.mode(),
                strategy.label()
            );
            return Some(payload);
        }
        log.record(credential, strategy);
    }
    None
}

/// Resolves order IDs to shipments: carrier `ref_ids` lookup first, then the
/// sheet's waybill for the first order ID.
pub struct OrderResolver<'a> {
    carrier: &'a CarrierClient,
    sheet: &'a dyn SheetLookup,
    endpoints: &'a Endpoints,
}

impl<'a> OrderResolver<'a> {
    pub fn new(
        carrier: &'a CarrierClient,
        sheet: &'a dyn SheetLookup,
        endpoints: &'a Endpoints,
    ) -> Self {
        Self {
            carrier,
            sheet,
            endpoints,
        }
    }

    pub async fn resolve_by_order_id(
        &self,
        order_ids: &IdentifierList,
        sequence: &[&CarrierCredential],
    ) -> Result<ShipmentPayload, TrackError> {
        let mut log = AttemptLog::default();

        if let Some(payload) = try_sequence(
            self.carrier,
            &self.endpoints.ref_ids,
            order_ids,
            sequence,
            Strategy::RefIds,
            &mut log,
        )
        .await
        {
            return Ok(payload);
        }

        let first = order_ids.first();
        tracing::info!("No ref_ids match, asking sheet for the waybill of {}", first);
        let Some(awb) = self.sheet.awb_for_order(first).await else {
            return Err(TrackError::OrderNotFound {
                detail: "Sheet did not return AWB".to_string(),
            });
        };

        let waybills = IdentifierList::parse(&awb)?;
        if let Some(payload) = try_sequence(
            self.carrier,
            &self.endpoints.waybill,
            &waybills,
            sequence,
            Strategy::SheetAwb,
            &mut log,
        )
        .await
        {
            return Ok(payload);
        }

        Err(TrackError::OrderNotFound {
            detail: log.joined(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CarrierMode;

    #[test]
    fn test_attempt_log_format() {
        let surface = CarrierCredential::new(CarrierMode::Surface, "s");
        let express = CarrierCredential::new(CarrierMode::Express, "e");

        let mut log = AttemptLog::default();
        log.record(&surface, Strategy::RefIds);
        log.record(&express, Strategy::SheetAwb);

        assert_eq!(log.entries().len(), 2);
        assert_eq!(
            log.joined(),
            "surface(ref_ids): no data | express(sheet→awb): no data"
        );
    }
}
