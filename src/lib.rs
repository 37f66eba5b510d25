pub mod cache;
pub mod config;
pub mod error;
pub mod health;
pub mod hubspot;
pub mod integration_item;
pub mod routes;
pub mod server;
pub mod shutdown;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::Config;
pub use error::AppError;
pub use integration_item::IntegrationItem;
pub use server::Server;
