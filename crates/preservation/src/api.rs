//! Preservation status, override tokens and the settings API

use axum::{
	Json,
	extract::{Path, State},
	http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::prelude::*;
use crate::settings::{PermissionLevel, SettingValue};
use preservation_core::notice::Notice;
use preservation_core::token::IssuedToken;
use preservation_types::action::LOCK_FLAG_KEY;
use preservation_types::extract::{AdminPrincipal, OptionalRequestId, OptionalSession};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
	pub enabled: bool,
	/// Whether this request carries a valid override
	pub override_active: bool,
	pub notice: Notice,
}

/// GET /api/preservation/status
pub async fn get_status(
	State(app): State<App>,
	principal: Principal,
	guard: Guard,
	OptionalRequestId(req_id): OptionalRequestId,
) -> ClResult<(StatusCode, Json<ApiResponse<StatusResponse>>)> {
	let lock = guard.lock();
	let status = StatusResponse {
		enabled: lock.enabled,
		override_active: lock.enabled && guard.override_valid(&app.tokens),
		notice: Notice::for_state(lock, &principal),
	};

	Ok((StatusCode::OK, Json(ApiResponse::new(status).with_req_id(req_id))))
}

/// GET /api/preservation/override-token - Mint an override token for this session
pub async fn get_override_token(
	State(app): State<App>,
	AdminPrincipal(principal): AdminPrincipal,
	OptionalSession(session): OptionalSession,
	OptionalRequestId(req_id): OptionalRequestId,
) -> ClResult<(StatusCode, Json<ApiResponse<IssuedToken>>)> {
	let Some(session) = session else {
		warn!(subject = %principal.id_tag, "Override token requested without a session");
		return Err(Error::Unauthorized);
	};
	let issued = app.tokens.issue(&principal, &session, Purpose::PreservationOverride)?;
	info!(
		target: "preservation::audit",
		subject = %principal.id_tag,
		expires_at = %issued.expires_at,
		"Override token issued"
	);

	Ok((StatusCode::OK, Json(ApiResponse::new(issued).with_req_id(req_id))))
}

/// Response for a single setting with metadata
#[derive(Debug, Serialize)]
pub struct SettingResponse {
	pub key: String,
	/// `null` while a setting without a default is unset
	pub value: Option<SettingValue>,
	pub permission: PermissionLevel,
	pub description: String,
}

async fn setting_response(app: &App, key: &str) -> ClResult<SettingResponse> {
	let definition = app.settings_registry.get(key).ok_or(Error::NotFound)?;
	let value = app.settings.get(key).await?;

	Ok(SettingResponse {
		key: key.to_string(),
		value,
		permission: definition.permission,
		description: definition.description.clone(),
	})
}

fn require_auth(principal: &Principal) -> ClResult<()> {
	if principal.is_anonymous() {
		return Err(Error::Unauthorized);
	}
	Ok(())
}

/// GET /api/settings - List all settings with their current values
pub async fn list_settings(
	State(app): State<App>,
	principal: Principal,
	OptionalRequestId(req_id): OptionalRequestId,
) -> ClResult<(StatusCode, Json<ApiResponse<Vec<SettingResponse>>>)> {
	require_auth(&principal)?;

	let mut settings = Vec::new();
	for definition in app.settings_registry.list() {
		// Wildcard patterns have no value of their own
		if definition.key.ends_with(".*") {
			continue;
		}
		if let Ok(setting) = setting_response(&app, &definition.key).await {
			settings.push(setting);
		}
	}

	Ok((StatusCode::OK, Json(ApiResponse::new(settings).with_req_id(req_id))))
}

/// GET /api/settings/{key}
pub async fn get_setting(
	State(app): State<App>,
	principal: Principal,
	Path(key): Path<String>,
	OptionalRequestId(req_id): OptionalRequestId,
) -> ClResult<(StatusCode, Json<ApiResponse<SettingResponse>>)> {
	require_auth(&principal)?;
	let setting = setting_response(&app, &key).await?;

	Ok((StatusCode::OK, Json(ApiResponse::new(setting).with_req_id(req_id))))
}

#[derive(Debug, Deserialize)]
pub struct UpdateSettingRequest {
	pub value: SettingValue,
}

/// PUT /api/settings/{key} - Update a setting.
///
/// The lock flag is not writable here: it changes only through the
/// preservation screen.
pub async fn update_setting(
	State(app): State<App>,
	principal: Principal,
	guard: Guard,
	Path(key): Path<String>,
	OptionalRequestId(req_id): OptionalRequestId,
	Json(req): Json<UpdateSettingRequest>,
) -> ClResult<(StatusCode, Json<ApiResponse<SettingResponse>>)> {
	require_auth(&principal)?;

	if key == LOCK_FLAG_KEY {
		warn!(subject = %principal.id_tag, "Lock flag write attempted through the settings API");
		return Err(Error::PermissionDenied);
	}
	if app.settings_registry.get(&key).is_none() {
		return Err(Error::NotFound);
	}

	guard.check(&app, &Site::OptionUpdate, &SiteContext::new().option(key.as_str()))?;
	app.settings.set(&key, req.value, &principal).await?;

	let setting = setting_response(&app, &key).await?;
	Ok((StatusCode::OK, Json(ApiResponse::new(setting).with_req_id(req_id))))
}

// vim: ts=4
