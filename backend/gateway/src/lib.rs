//! OrderIQ HTTP API.
//!
//! Text and image extraction endpoints, per-request spreadsheet download,
//! and a health probe.

pub mod download;
pub mod error;
pub mod extract_api;
pub mod health_api;
pub mod mime_detect;
pub mod server;

pub use error::ApiError;
pub use server::{build_router, start_server, GatewayLimits, GatewayState};
