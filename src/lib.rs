pub mod client;
pub mod config;
pub mod credential;
pub mod diagnostics;
pub mod error;
pub mod relay;
pub mod resolver;
pub mod server;
pub mod sheet;
pub mod tracker;
pub mod types;

pub use client::CarrierClient;
pub use config::TrackerConfig;
pub use credential::{AuthStyle, CarrierCredential};
pub use error::{RelayError, TrackError};
pub use sheet::{AppsScriptSheet, SheetLookup};
pub use tracker::Tracker;
pub use types::{CarrierMode, Diagnostics, IdentifierKind, ShipmentPayload, TrackingQuery};
