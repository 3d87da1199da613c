//! HTTP API handlers for tlm-gw

pub mod health;
pub mod search;

pub use health::health_routes;
pub use search::search;
