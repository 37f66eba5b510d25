//! HubSpot integration
//!
//! OAuth authorization-code handshake backed by the ephemeral cache, and
//! the paginated CRM loader that turns companies into integration items.

pub mod client;
pub mod config;
pub mod flows;
pub mod items;
pub mod state;

pub use config::HubSpotConfig;
pub use flows::{CLOSE_WINDOW_HTML, CallbackParams, HubSpotFlows};
pub use items::ItemFetcher;
pub use state::{CodeVerifier, Credentials, FLOW_TTL_SECONDS, StateData, flow_key};
