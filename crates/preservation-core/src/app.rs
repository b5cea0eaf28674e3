//! App state type

use std::sync::Arc;

use preservation_types::template::TemplateEngine;

use crate::intercept::InterceptionRegistry;
use crate::lock::LockStateProvider;
use crate::settings::service::SettingsService;
use crate::settings::types::FrozenSettingsRegistry;
use crate::token::{OverrideTokens, ReplayGuard};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct AppState {
	pub opts: AppBuilderOpts,

	// Settings subsystem
	pub settings: Arc<SettingsService>,
	pub settings_registry: Arc<FrozenSettingsRegistry>,

	/// Source of the lock flag, snapshotted once per request
	pub lock: Arc<dyn LockStateProvider>,

	pub tokens: OverrideTokens,
	/// Consumed lock settings form tokens
	pub replay: ReplayGuard,
	pub interception: InterceptionRegistry,
	pub templates: TemplateEngine,
}

impl std::fmt::Debug for AppState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AppState")
			.field("opts", &self.opts)
			.field("tokens", &self.tokens)
			.field("replay", &self.replay)
			.field("interception", &self.interception)
			.finish_non_exhaustive()
	}
}

pub type App = Arc<AppState>;

#[derive(Debug, Clone)]
pub struct AppBuilderOpts {
	pub listen: Box<str>,
	/// Override and form token lifetime in seconds
	pub token_lifetime: i64,
	pub replay_capacity: usize,
}

// vim: ts=4
