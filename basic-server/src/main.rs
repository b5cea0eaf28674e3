use axum::middleware::from_fn_with_state;
use std::{env, path, sync::Arc};

use preservation::app::AppBuilder;
use preservation::prelude::*;
use preservation::routes;
use preservation_settings_adapter_fs::SettingsAdapterFs;

mod auth;
mod host;

pub struct Config {
	pub listen: String,
	pub data_dir: path::PathBuf,
	pub secret: Option<String>,
	pub token_lifetime: Option<i64>,
	pub auth_tokens: String,
}

impl Config {
	fn from_env() -> ClResult<Self> {
		let token_lifetime = match env::var("OVERRIDE_TOKEN_TTL") {
			Ok(ttl) => Some(ttl.parse().map_err(|_| {
				Error::ConfigError(format!("Invalid OVERRIDE_TOKEN_TTL: {}", ttl))
			})?),
			Err(_) => None,
		};

		Ok(Config {
			listen: env::var("LISTEN").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
			data_dir: path::PathBuf::from(env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string())),
			secret: env::var("PRESERVATION_SECRET").ok(),
			token_lifetime,
			auth_tokens: env::var("AUTH_TOKENS").unwrap_or_default(),
		})
	}
}

async fn run(config: Config) -> ClResult<()> {
	let settings_adapter = Arc::new(SettingsAdapterFs::new(config.data_dir.into()).await?);
	let tokens = Arc::new(auth::StaticTokens::parse(&config.auth_tokens)?);
	if tokens.is_empty() {
		warn!("No AUTH_TOKENS configured, every request is anonymous");
	}
	let store = Arc::new(host::PostStore::default());

	let mut builder = AppBuilder::new();
	builder.listen(config.listen).settings_adapter(settings_adapter);
	host::register_templates(&mut builder);
	if let Some(secret) = config.secret {
		builder.secret(secret);
	}
	if let Some(ttl) = config.token_lifetime {
		builder.token_lifetime(ttl);
	}

	builder
		.run(|app| {
			routes::init(app, host::routes(app, store))
				.layer(from_fn_with_state(tokens, auth::authenticate))
		})
		.await
}

#[tokio::main(flavor = "multi_thread")]
async fn main() {
	let config = match Config::from_env() {
		Ok(config) => config,
		Err(e) => {
			eprintln!("Invalid configuration: {}", e);
			std::process::exit(1);
		}
	};

	if let Err(e) = run(config).await {
		error!("Server stopped: {}", e);
		std::process::exit(1);
	}
}

// vim: ts=4
