//! HTTP/HTTPS surface and CLI of the acquisition service.
//!
//! The plain server answers local clients without authentication; the TLS
//! server mirrors the same queries for remote clients behind token auth.
//! Both read the archive through the same repositories the sink writes.

pub mod api;
pub mod auth;
pub mod error;
pub mod remote;
pub mod state;

pub use error::ApiError;
pub use state::AppState;
