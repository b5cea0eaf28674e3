//! App builder - constructs and runs the preservation server

use axum::Router;
use std::{net::SocketAddr, str::FromStr, sync::Arc, time::Duration};

use crate::prelude::*;
use crate::settings::SettingsRegistry;
use crate::settings::service::SettingsService;
use preservation_core::intercept::{InterceptionRegistry, SiteDef};
use preservation_core::token::{DEFAULT_TOKEN_LIFETIME, OverrideTokens, ReplayGuard};
use preservation_types::settings_adapter::SettingsAdapter;
use preservation_types::template::TemplateEngine;
pub use preservation_core::app::{AppBuilderOpts, AppState, VERSION};

const DEFAULT_REPLAY_CAPACITY: usize = 1024;
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Host settings registration callback
type RegisterSettingsFn = fn(&mut SettingsRegistry) -> ClResult<()>;

pub struct AppBuilder {
	opts: AppBuilderOpts,
	secret: Option<Box<[u8]>>,
	settings_adapter: Option<Arc<dyn SettingsAdapter>>,
	sites: Vec<SiteDef>,
	settings: Vec<RegisterSettingsFn>,
	templates: Vec<(Box<str>, Box<str>)>,
}

impl AppBuilder {
	pub fn new() -> Self {
		// A subscriber may already be installed by the host or a test harness
		let _ = tracing_subscriber::fmt()
			.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
			.with_target(false)
			.try_init();
		AppBuilder {
			opts: AppBuilderOpts {
				listen: "127.0.0.1:8080".into(),
				token_lifetime: DEFAULT_TOKEN_LIFETIME,
				replay_capacity: DEFAULT_REPLAY_CAPACITY,
			},
			secret: None,
			settings_adapter: None,
			sites: Vec::new(),
			settings: Vec::new(),
			templates: Vec::new(),
		}
	}

	// Opts
	pub fn listen(&mut self, listen: impl Into<Box<str>>) -> &mut Self {
		self.opts.listen = listen.into();
		self
	}
	pub fn token_lifetime(&mut self, seconds: i64) -> &mut Self {
		self.opts.token_lifetime = seconds;
		self
	}
	pub fn replay_capacity(&mut self, capacity: usize) -> &mut Self {
		self.opts.replay_capacity = capacity;
		self
	}
	/// Server secret keying override and form tokens
	pub fn secret(&mut self, secret: impl AsRef<[u8]>) -> &mut Self {
		self.secret = Some(secret.as_ref().into());
		self
	}

	// Adapters
	pub fn settings_adapter(&mut self, settings_adapter: Arc<dyn SettingsAdapter>) -> &mut Self {
		self.settings_adapter = Some(settings_adapter);
		self
	}

	/// Register a host interception site
	pub fn site(&mut self, def: SiteDef) -> &mut Self {
		self.sites.push(def);
		self
	}

	/// Register host settings next to the core ones
	pub fn register_settings(&mut self, f: RegisterSettingsFn) -> &mut Self {
		self.settings.push(f);
		self
	}

	/// Register a host Handlebars template, rendered later through `app.templates`
	pub fn template(&mut self, name: impl Into<Box<str>>, source: impl Into<Box<str>>) -> &mut Self {
		self.templates.push((name.into(), source.into()));
		self
	}

	/// Build the app state and write install defaults
	pub async fn build(self) -> ClResult<App> {
		let Some(secret) = self.secret else {
			error!("FATAL: No token secret configured");
			return Err(Error::ConfigError("No token secret configured".into()));
		};
		let Some(settings_adapter) = self.settings_adapter else {
			error!("FATAL: No settings adapter configured");
			return Err(Error::ConfigError("No settings adapter configured".into()));
		};

		let tokens = OverrideTokens::new(&secret, self.opts.token_lifetime).inspect_err(|e| {
			error!("FATAL: Invalid token configuration: {}", e);
		})?;

		// Initialize settings registry and service
		let mut settings_registry = SettingsRegistry::new();
		preservation_core::register_settings(&mut settings_registry)?;
		for register in self.settings {
			register(&mut settings_registry)?;
		}
		info!("Registered {} settings", settings_registry.len());

		let frozen_registry = Arc::new(settings_registry.freeze());
		let settings_service =
			Arc::new(SettingsService::new(frozen_registry.clone(), settings_adapter));
		settings_service.install_defaults().await?;

		let mut templates = TemplateEngine::new()?;
		preservation_core::register_templates(&mut templates)?;
		crate::screen::register_templates(&mut templates)?;
		for (name, source) in &self.templates {
			templates.register(name, source)?;
		}

		let mut interception = InterceptionRegistry::builtin();
		for def in self.sites {
			interception.register(def)?;
		}
		info!("Interception registry initialized with {} sites", interception.len());

		let app: App = Arc::new(AppState {
			replay: ReplayGuard::new(self.opts.replay_capacity),
			opts: self.opts,
			lock: settings_service.clone(),
			settings: settings_service,
			settings_registry: frozen_registry,
			tokens,
			interception,
			templates,
		});

		Ok(app)
	}

	/// Build the app and serve until ctrl-c.
	///
	/// `host` returns the complete router: usually [`crate::routes::init`] wrapped in
	/// the host's auth layer.
	pub async fn run<F>(self, host: F) -> ClResult<()>
	where
		F: FnOnce(&App) -> Router,
	{
		info!("Preservation mode V{}", VERSION);

		let app = self.build().await?;
		if preservation_core::lock::snapshot(app.lock.as_ref()).await.enabled {
			info!("Preservation mode is ACTIVE");
		} else {
			info!("Preservation mode is off");
		}

		let addr = SocketAddr::from_str(&app.opts.listen).map_err(|_| {
			error!("FATAL: Invalid listen address: {}", app.opts.listen);
			Error::ConfigError(format!("Invalid listen address: {}", app.opts.listen))
		})?;
		let router = host(&app);

		let handle = axum_server::Handle::new();
		tokio::spawn({
			let handle = handle.clone();
			async move {
				if let Err(e) = tokio::signal::ctrl_c().await {
					warn!("Cannot listen for shutdown signal: {}", e);
					return;
				}
				info!("Shutting down");
				handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
			}
		});

		info!("Listening on HTTP {}", addr);
		axum_server::bind(addr).handle(handle).serve(router.into_make_service()).await?;

		Ok(())
	}
}

impl Default for AppBuilder {
	fn default() -> Self {
		Self::new()
	}
}

// vim: ts=4
