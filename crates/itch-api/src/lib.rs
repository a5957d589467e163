// itch-api: Async Rust client for the itch.io server API

pub mod api;
pub mod client;
mod collections;
pub mod error;
mod games;
mod profile;
pub mod transport;

pub use api::ItchApi;
pub use client::{DEFAULT_BASE_URL, ItchClient};
pub use error::Error;
pub use transport::TransportConfig;
