pub mod health;
pub mod hubspot;

pub use health::create_health_routes;
pub use hubspot::create_hubspot_routes;
