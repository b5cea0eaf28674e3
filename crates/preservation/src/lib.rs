//! Preservation mode for axum hosts.
//!
//! Puts a whole site into a read-only archival state. While the lock is on,
//! every mutation passing an interception site is refused; administrators can
//! lift the lock on the preservation screen or bypass it per request with an
//! override token.
//!
//! # Usage
//!
//! - Build the app with [`app::AppBuilder`]
//! - Mount host routes with [`routes::init`], guarding mutating routes with
//!   [`middleware::intercept`]
//! - Wrap the returned router in the host's auth layer, which inserts the
//!   [`types::Principal`] and [`types::SessionId`] extensions

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

// Re-export shared types
pub use preservation_types::action;
pub use preservation_types::error;
pub use preservation_types::extract;
pub use preservation_types::settings_adapter;
pub use preservation_types::template;
pub use preservation_types::types;
pub use preservation_types::utils;

// Core re-exports
pub use preservation_core::capability;
pub use preservation_core::guard;
pub use preservation_core::intercept;
pub use preservation_core::lock;
pub use preservation_core::middleware;
pub use preservation_core::notice;
pub use preservation_core::pdp;
pub use preservation_core::settings;
pub use preservation_core::token;

// Local modules
pub mod api;
pub mod app;
pub mod prelude;
pub mod routes;
pub mod screen;

// vim: ts=4
