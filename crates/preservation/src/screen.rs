//! Lock settings screen

use axum::{Extension, Form, extract::State, response::Html};
use serde::{Deserialize, Serialize};

use crate::prelude::*;
use preservation_core::intercept::LOCK_SETTINGS_SCREEN;
use preservation_core::notice::{LockChanged, MANAGE_URL, Notice};
use preservation_types::extract::{AdminPrincipal, OptionalSession};
use preservation_types::template::TemplateEngine;

pub const FORM_TOKEN_FIELD: &str = "_form_token";
pub const ENABLED_FIELD: &str = "preservation_enabled";

/// Form body of the settings screen. An unchecked checkbox is absent.
#[derive(Debug, Deserialize)]
pub struct LockSettingsForm {
	#[serde(rename = "_form_token")]
	pub form_token: String,
	#[serde(rename = "preservation_enabled", default)]
	pub enabled: Option<String>,
}

pub const SETTINGS_SCREEN: &str = "preservation.settings";
const SETTINGS_SCREEN_SOURCE: &str = include_str!("../templates/settings.html.hbs");

pub fn register_templates(templates: &mut TemplateEngine) -> ClResult<()> {
	templates.register(SETTINGS_SCREEN, SETTINGS_SCREEN_SOURCE)
}

#[derive(Serialize)]
struct SettingsScreen<'a> {
	banner: String,
	saved: bool,
	action: &'a str,
	token_field: &'a str,
	token: &'a str,
	enabled_field: &'a str,
	enabled: bool,
}

fn render(
	templates: &TemplateEngine,
	principal: &Principal,
	lock: LockState,
	form_token: &str,
	saved: bool,
) -> ClResult<String> {
	let banner = Notice::for_state(lock, principal).render_html(templates)?;
	templates.render(
		SETTINGS_SCREEN,
		&SettingsScreen {
			banner,
			saved,
			action: MANAGE_URL,
			token_field: FORM_TOKEN_FIELD,
			token: form_token,
			enabled_field: ENABLED_FIELD,
			enabled: lock.enabled,
		},
	)
}

fn require_session(session: Option<SessionId>, principal: &Principal) -> ClResult<SessionId> {
	session.ok_or_else(|| {
		warn!(subject = %principal.id_tag, "Preservation screen requires a session");
		Error::Unauthorized
	})
}

/// GET /admin/preservation
pub async fn get_settings_screen(
	State(app): State<App>,
	AdminPrincipal(principal): AdminPrincipal,
	OptionalSession(session): OptionalSession,
	guard: Guard,
) -> ClResult<Html<String>> {
	let session = require_session(session, &principal)?;
	let issued = app.tokens.issue(&principal, &session, Purpose::LockSettingsForm)?;

	Ok(Html(render(&app.templates, &principal, guard.lock(), &issued.token, false)?))
}

/// POST /admin/preservation
pub async fn post_settings_screen(
	State(app): State<App>,
	AdminPrincipal(principal): AdminPrincipal,
	OptionalSession(session): OptionalSession,
	guard: Guard,
	Form(form): Form<LockSettingsForm>,
) -> ClResult<(Extension<LockChanged>, Html<String>)> {
	let session = require_session(session, &principal)?;

	if !app.tokens.validate(
		Some(&form.form_token),
		&principal,
		Some(&session),
		Purpose::LockSettingsForm,
	) {
		warn!(subject = %principal.id_tag, "Invalid preservation settings form token");
		return Err(Error::PermissionDenied);
	}
	if !app.replay.consume(&form.form_token) {
		warn!(subject = %principal.id_tag, "Preservation settings form token replayed");
		return Err(Error::PermissionDenied);
	}

	guard.check(&app, &Site::LockSettingsSave, &SiteContext::new().screen(LOCK_SETTINGS_SCREEN))?;

	let enabled = form.enabled.is_some();
	app.lock.set_lock_enabled(enabled).await?;
	info!(
		target: "preservation::audit",
		subject = %principal.id_tag,
		enabled = enabled,
		req_id = guard.request_id().unwrap_or_default(),
		"Preservation mode {}",
		if enabled { "enabled" } else { "disabled" }
	);

	let lock = LockState::new(enabled);
	let issued = app.tokens.issue(&principal, &session, Purpose::LockSettingsForm)?;
	let html = render(&app.templates, &principal, lock, &issued.token, true)?;
	Ok((Extension(LockChanged(lock)), Html(html)))
}


// vim: ts=4
