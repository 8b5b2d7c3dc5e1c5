use crate::config::TrackerConfig;
use crate::types::{Diagnostics, DiagnosticsDetail};

/// Report which credentials are configured. Makes no network calls.
pub fn self_test(config: &TrackerConfig, sheet_configured: bool) -> Diagnostics {
    Diagnostics {
        ok: true,
        diag: DiagnosticsDetail {
            surface_token_present: config.surface.is_present(),
            express_token_present: config.express.is_present(),
            auth_header_format: config.auth_style.to_string(),
            sheet_lookup_configured: sheet_configured,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::{AuthStyle, CarrierCredential};
    use crate::types::CarrierMode;

    #[test]
    fn test_reports_presence_only() {
        let config = TrackerConfig {
            express: CarrierCredential::new(CarrierMode::Express, "e-token"),
            auth_style: AuthStyle::Bearer,
            ..Default::default()
        };

        let report = self_test(&config, false);
        assert!(report.ok);
        assert!(!report.diag.surface_token_present);
        assert!(report.diag.express_token_present);
        assert_eq!(report.diag.auth_header_format, "Bearer");
        assert!(!report.diag.sheet_lookup_configured);

        let json = serde_json::to_string(&report).unwrap();
        assert!(!json.contains("e-token"));
    }
}
