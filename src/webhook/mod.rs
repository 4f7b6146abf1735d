//! Inbound webhook — HTTP surface and payload normalization.

pub mod payload;
pub mod routes;

pub use payload::InboundMessage;
pub use routes::webhook_routes;
