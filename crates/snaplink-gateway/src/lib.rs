//! HTTP gateway for Snaplink.
//!
//! Exposes the [`Shortener`](snaplink_core::Shortener) facade over axum:
//! link creation, 302 redirects, previews, deletion and a recent-links
//! listing.

pub mod app;
pub mod cli;
pub mod error;
pub mod handlers;
pub mod model;
pub mod state;

pub use app::App;
pub use state::AppState;
