//! Preservation mode core.
//!
//! A site-wide write-lock: while the lock flag is set, every mutation that
//! passes an interception site is refused unless an administrator presents a
//! valid override token. This crate holds the policy decision point, the
//! token validator, the interception registry and the axum middlewares that
//! wire them into a host router.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod app;
pub mod capability;
pub mod core_settings;
pub mod guard;
pub mod intercept;
pub mod lock;
pub mod middleware;
pub mod notice;
pub mod pdp;
pub mod prelude;
pub mod settings;
pub mod token;

// Re-export commonly used types
pub use app::{App, AppBuilderOpts, AppState};
pub use guard::Guard;
pub use intercept::{InterceptionRegistry, Site, SiteContext};
pub use middleware::PermissionCheckOutput;

pub fn register_settings(
	registry: &mut settings::SettingsRegistry,
) -> preservation_types::error::ClResult<()> {
	core_settings::register_settings(registry)
}

pub fn register_templates(
	templates: &mut preservation_types::template::TemplateEngine,
) -> preservation_types::error::ClResult<()> {
	notice::register_templates(templates)
}

// vim: ts=4
