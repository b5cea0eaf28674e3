//! Interception point registry.
//!
//! A declarative table mapping each interception site to the [`Action`] it
//! guards, the surface a denial is rendered on and how the verdict is
//! enforced. All sites share the single policy in [`crate::pdp`]; a new
//! mutation surface is a new table row, not a new deny branch.
//!
//! The registry is frozen at startup and holds no per-request state.

use axum::http::{Method, Request, Uri, request::Parts};
use std::collections::HashMap;

use preservation_types::action::LOCK_FLAG_KEY;

use crate::capability;
use crate::guard::Guard;
use crate::pdp;
use crate::prelude::*;
use crate::token::OverrideTokens;

/// Admin screen id of the lock settings screen
pub const LOCK_SETTINGS_SCREEN: &str = "preservation";

/// Path prefix of admin screens, the next segment is the screen id
pub const ADMIN_PATH_PREFIX: &str = "/admin/";

/// Identity of an interception site
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Site {
	ContentSave,
	ContentDelete,
	MediaUpload,
	WidgetUpdate,
	MenuUpdate,
	ExtensionChange,
	OptionUpdate,
	LockSettingsSave,
	RestDispatch,
	AdminPost,
	EditScreenRender,
	CapabilityMap,
	/// Host-defined site registered at startup
	Custom(&'static str),
}

impl Site {
	pub fn as_str(&self) -> &'static str {
		match self {
			Site::ContentSave => "content.save",
			Site::ContentDelete => "content.delete",
			Site::MediaUpload => "media.upload",
			Site::WidgetUpdate => "widget.update",
			Site::MenuUpdate => "menu.update",
			Site::ExtensionChange => "extension.change",
			Site::OptionUpdate => "option.update",
			Site::LockSettingsSave => "lock.settings_save",
			Site::RestDispatch => "rest.dispatch",
			Site::AdminPost => "admin.post",
			Site::EditScreenRender => "screen.edit_render",
			Site::CapabilityMap => "capability.map",
			Site::Custom(name) => name,
		}
	}
}

impl std::fmt::Display for Site {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// What a site knows about the effect it is about to permit
#[derive(Debug, Clone, Default)]
pub struct SiteContext {
	pub method: Option<Box<str>>,
	pub route: Option<Box<str>>,
	pub screen: Option<Box<str>>,
	pub option: Option<Box<str>>,
	pub capability: Option<Box<str>>,
}

impl SiteContext {
	pub fn new() -> Self {
		Self::default()
	}

	/// Context of an HTTP request: method, path and admin screen id
	pub fn from_parts(parts: &Parts) -> Self {
		Self::from_method_uri(&parts.method, &parts.uri)
	}

	pub fn from_request<B>(req: &Request<B>) -> Self {
		Self::from_method_uri(req.method(), req.uri())
	}

	fn from_method_uri(method: &Method, uri: &Uri) -> Self {
		let path = uri.path();
		Self {
			method: Some(method.as_str().into()),
			route: Some(path.into()),
			screen: screen_from_path(path).map(Into::into),
			option: None,
			capability: None,
		}
	}

	pub fn method(mut self, method: impl Into<Box<str>>) -> Self {
		self.method = Some(method.into());
		self
	}

	pub fn route(mut self, route: impl Into<Box<str>>) -> Self {
		self.route = Some(route.into());
		self
	}

	pub fn screen(mut self, screen: impl Into<Box<str>>) -> Self {
		self.screen = Some(screen.into());
		self
	}

	pub fn option(mut self, option: impl Into<Box<str>>) -> Self {
		self.option = Some(option.into());
		self
	}

	pub fn capability(mut self, capability: impl Into<Box<str>>) -> Self {
		self.capability = Some(capability.into());
		self
	}
}

/// Admin screen id from a request path (`/admin/{screen}/...`)
pub fn screen_from_path(path: &str) -> Option<&str> {
	path.strip_prefix(ADMIN_PATH_PREFIX)
		.and_then(|rest| rest.split('/').next())
		.filter(|screen| !screen.is_empty())
}

/// How a denial is enforced at a site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enforcement {
	/// Abort the request with a terminal error
	Block,
	/// Remove the capability from the principal seen downstream
	Strip,
}

pub type ActionBuilder = fn(&SiteContext) -> Action;

/// One row of the interception table
#[derive(Clone)]
pub struct SiteDef {
	pub site: Site,
	pub surface: Surface,
	pub enforcement: Enforcement,
	pub action: ActionBuilder,
}

impl std::fmt::Debug for SiteDef {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SiteDef")
			.field("site", &self.site)
			.field("surface", &self.surface)
			.field("enforcement", &self.enforcement)
			.finish_non_exhaustive()
	}
}

fn content_write(_: &SiteContext) -> Action {
	Action::ContentWrite
}

fn content_delete(_: &SiteContext) -> Action {
	Action::ContentDelete
}

fn media_upload(_: &SiteContext) -> Action {
	Action::MediaUpload
}

fn widget_change(_: &SiteContext) -> Action {
	Action::WidgetChange
}

fn menu_change(_: &SiteContext) -> Action {
	Action::MenuChange
}

fn extension_change(_: &SiteContext) -> Action {
	Action::ThemeOrPluginChange
}

fn option_write(ctx: &SiteContext) -> Action {
	match &ctx.option {
		Some(option) => Action::settings_write(option.clone()),
		None => Action::unclassified(Site::OptionUpdate.as_str()),
	}
}

fn lock_flag_write(_: &SiteContext) -> Action {
	Action::settings_write(LOCK_FLAG_KEY)
}

fn rest_write(ctx: &SiteContext) -> Action {
	match (&ctx.method, &ctx.route) {
		(Some(method), Some(route)) => Action::rest_write(method.clone(), route.clone()),
		_ => Action::unclassified(Site::RestDispatch.as_str()),
	}
}

fn admin_post(ctx: &SiteContext) -> Action {
	match ctx.screen.as_deref() {
		// Submitting the lock screen is the lock flag write
		Some(LOCK_SETTINGS_SCREEN) => Action::settings_write(LOCK_FLAG_KEY),
		Some(screen) => Action::screen_access(screen),
		None => Action::unclassified(Site::AdminPost.as_str()),
	}
}

fn edit_screen(ctx: &SiteContext) -> Action {
	match &ctx.screen {
		Some(screen) => Action::screen_access(screen.clone()),
		None => Action::unclassified(Site::EditScreenRender.as_str()),
	}
}

fn capability_grant(ctx: &SiteContext) -> Action {
	ctx.capability
		.as_deref()
		.and_then(capability::action_for)
		.unwrap_or_else(|| Action::unclassified(Site::CapabilityMap.as_str()))
}

const fn row(site: Site, surface: Surface, action: ActionBuilder) -> SiteDef {
	SiteDef { site, surface, enforcement: Enforcement::Block, action }
}

/// Built-in interception sites
pub const BUILTIN_SITES: &[SiteDef] = &[
	row(Site::ContentSave, Surface::Screen, content_write),
	row(Site::ContentDelete, Surface::Screen, content_delete),
	row(Site::MediaUpload, Surface::Screen, media_upload),
	row(Site::WidgetUpdate, Surface::Screen, widget_change),
	row(Site::MenuUpdate, Surface::Screen, menu_change),
	row(Site::ExtensionChange, Surface::Screen, extension_change),
	row(Site::OptionUpdate, Surface::Api, option_write),
	row(Site::LockSettingsSave, Surface::Screen, lock_flag_write),
	row(Site::RestDispatch, Surface::Api, rest_write),
	row(Site::AdminPost, Surface::Screen, admin_post),
	row(Site::EditScreenRender, Surface::Screen, edit_screen),
	SiteDef {
		site: Site::CapabilityMap,
		surface: Surface::Screen,
		enforcement: Enforcement::Strip,
		action: capability_grant,
	},
];

/// Result of evaluating a site for one request
#[derive(Debug, Clone)]
pub struct Evaluation {
	pub action: Action,
	pub verdict: Verdict,
	pub surface: Surface,
	pub enforcement: Enforcement,
}

/// Dispatch table of all interception sites
#[derive(Debug)]
pub struct InterceptionRegistry {
	sites: HashMap<Site, SiteDef>,
}

impl InterceptionRegistry {
	/// Empty registry. Every site dispatched against it is unclassified.
	pub fn new() -> Self {
		Self { sites: HashMap::new() }
	}

	/// Registry holding the built-in sites
	pub fn builtin() -> Self {
		let sites = BUILTIN_SITES.iter().map(|def| (def.site.clone(), def.clone())).collect();
		Self { sites }
	}

	/// Add a site. Registering an existing site is a configuration error.
	pub fn register(&mut self, def: SiteDef) -> ClResult<()> {
		if self.sites.contains_key(&def.site) {
			return Err(Error::ConfigError(format!(
				"Interception site '{}' is already registered",
				def.site
			)));
		}
		debug!("Registering interception site: {}", def.site);
		self.sites.insert(def.site.clone(), def);
		Ok(())
	}

	pub fn get(&self, site: &Site) -> Option<&SiteDef> {
		self.sites.get(site)
	}

	pub fn len(&self) -> usize {
		self.sites.len()
	}

	pub fn is_empty(&self) -> bool {
		self.sites.is_empty()
	}

	/// Build the action a site guards. Unregistered sites are unclassified.
	pub fn classify(&self, site: &Site, ctx: &SiteContext) -> (Action, Surface, Enforcement) {
		match self.sites.get(site) {
			Some(def) => ((def.action)(ctx), def.surface, def.enforcement),
			None => {
				warn!(site = %site, "Dispatch to unregistered interception site");
				(Action::unclassified(site.as_str()), Surface::Api, Enforcement::Block)
			}
		}
	}

	/// Ask the policy about a site without enforcing the verdict
	pub fn evaluate(
		&self,
		site: &Site,
		ctx: &SiteContext,
		guard: &Guard,
		tokens: &OverrideTokens,
	) -> Evaluation {
		let (action, surface, enforcement) = self.classify(site, ctx);
		let lock_enabled = guard.lock().enabled;
		let override_valid = lock_enabled && guard.override_valid(tokens);
		let verdict = pdp::decide(&action, guard.principal(), lock_enabled, override_valid);
		Evaluation { action, verdict, surface, enforcement }
	}

	/// Evaluate a site and turn a denial into a terminal error
	pub fn enforce(
		&self,
		site: &Site,
		ctx: &SiteContext,
		guard: &Guard,
		tokens: &OverrideTokens,
	) -> ClResult<()> {
		let Evaluation { action, verdict, surface, .. } = self.evaluate(site, ctx, guard, tokens);

		match verdict {
			Verdict::Allow => {
				if guard.lock().enabled && !action.is_lock_flag_write() {
					info!(
						target: "preservation::audit",
						site = %site,
						action = %action,
						subject = %guard.principal().id_tag,
						req_id = guard.request_id().unwrap_or_default(),
						"Preservation override used"
					);
				}
				Ok(())
			}
			Verdict::Deny(reason) => {
				let reason = match reason {
					DenyReason::LockActive if guard.override_token_presented() => {
						DenyReason::InvalidOverrideToken
					}
					reason => reason,
				};
				warn!(
					site = %site,
					action = %action,
					subject = %guard.principal().id_tag,
					reason = %reason,
					req_id = guard.request_id().unwrap_or_default(),
					"Write blocked by preservation mode"
				);
				Err(Error::write_forbidden(reason, surface))
			}
		}
	}
}

impl Default for InterceptionRegistry {
	fn default() -> Self {
		Self::builtin()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use preservation_types::types::Capabilities;

	fn tokens() -> OverrideTokens {
		OverrideTokens::new(b"0123456789abcdef0123456789abcdef", 600).unwrap()
	}

	fn admin() -> Principal {
		Principal::new("admin", ["manage_settings", "edit_content"].into_iter().collect())
	}

	fn guard(principal: Principal, locked: bool, token: Option<&str>) -> Guard {
		Guard::new(principal, Some(SessionId::new("s1")), LockState::new(locked), token.map(Into::into))
	}

	#[test]
	fn test_every_builtin_site_registered() {
		let registry = InterceptionRegistry::builtin();
		assert_eq!(registry.len(), BUILTIN_SITES.len());
		for def in BUILTIN_SITES {
			assert!(registry.get(&def.site).is_some(), "{}", def.site);
		}
	}

	#[test]
	fn test_classification() {
		let registry = InterceptionRegistry::builtin();
		let ctx = SiteContext::new();

		assert_eq!(registry.classify(&Site::ContentSave, &ctx).0, Action::ContentWrite);
		assert_eq!(registry.classify(&Site::ExtensionChange, &ctx).0, Action::ThemeOrPluginChange);
		assert_eq!(
			registry.classify(&Site::LockSettingsSave, &ctx).0,
			Action::settings_write(LOCK_FLAG_KEY)
		);
		assert_eq!(
			registry.classify(&Site::OptionUpdate, &ctx.clone().option("site.title")).0,
			Action::settings_write("site.title")
		);
		assert_eq!(
			registry.classify(&Site::RestDispatch, &ctx.clone().method("DELETE").route("/api/posts/1")).0,
			Action::rest_write("DELETE", "/api/posts/1")
		);
	}

	#[test]
	fn test_missing_context_is_unclassified() {
		let registry = InterceptionRegistry::builtin();
		let ctx = SiteContext::new();

		for site in [Site::OptionUpdate, Site::RestDispatch, Site::AdminPost, Site::EditScreenRender] {
			let (action, _, _) = registry.classify(&site, &ctx);
			assert!(matches!(action, Action::Unclassified { .. }), "{}", site);
		}
	}

	#[test]
	fn test_lock_screen_post_is_lock_flag_write() {
		let registry = InterceptionRegistry::builtin();
		let ctx = SiteContext::new().screen(LOCK_SETTINGS_SCREEN);
		assert!(registry.classify(&Site::AdminPost, &ctx).0.is_lock_flag_write());

		let ctx = SiteContext::new().screen("posts");
		assert_eq!(registry.classify(&Site::AdminPost, &ctx).0, Action::screen_access("posts"));
	}

	#[test]
	fn test_screen_from_path() {
		assert_eq!(screen_from_path("/admin/preservation"), Some("preservation"));
		assert_eq!(screen_from_path("/admin/posts/12/edit"), Some("posts"));
		assert_eq!(screen_from_path("/admin/"), None);
		assert_eq!(screen_from_path("/api/posts"), None);
	}

	#[test]
	fn test_unregistered_site_denied_while_locked() {
		let registry = InterceptionRegistry::builtin();
		let g = guard(admin(), true, None);
		let res = registry.enforce(&Site::Custom("gallery.reorder"), &SiteContext::new(), &g, &tokens());
		assert!(matches!(
			res,
			Err(Error::WriteForbidden { reason: DenyReason::UnknownAction, surface: Surface::Api })
		));

		let g = guard(admin(), false, None);
		assert!(
			registry.enforce(&Site::Custom("gallery.reorder"), &SiteContext::new(), &g, &tokens()).is_ok()
		);
	}

	#[test]
	fn test_custom_site_registration() {
		let mut registry = InterceptionRegistry::builtin();
		registry
			.register(SiteDef {
				site: Site::Custom("comment.moderate"),
				surface: Surface::Api,
				enforcement: Enforcement::Block,
				action: |_| Action::ContentWrite,
			})
			.unwrap();
		assert!(registry.register(BUILTIN_SITES[0].clone()).is_err());

		let g = guard(Principal::new("editor", Capabilities::new()), true, None);
		let res = registry.enforce(&Site::Custom("comment.moderate"), &SiteContext::new(), &g, &tokens());
		assert!(matches!(res, Err(Error::WriteForbidden { reason: DenyReason::LockActive, .. })));
	}

	#[test]
	fn test_enforce_with_override() {
		let registry = InterceptionRegistry::builtin();
		let t = tokens();
		let issued =
			t.issue(&admin(), &SessionId::new("s1"), Purpose::PreservationOverride).unwrap();

		let g = guard(admin(), true, Some(&issued.token));
		assert!(registry.enforce(&Site::ExtensionChange, &SiteContext::new(), &g, &t).is_ok());

		let g = guard(admin(), true, None);
		assert!(matches!(
			registry.enforce(&Site::ExtensionChange, &SiteContext::new(), &g, &t),
			Err(Error::WriteForbidden { reason: DenyReason::LockActive, surface: Surface::Screen })
		));
	}

	#[test]
	fn test_bad_override_token_reported() {
		let registry = InterceptionRegistry::builtin();
		let g = guard(admin(), true, Some("bogus"));
		assert!(matches!(
			registry.enforce(&Site::ContentDelete, &SiteContext::new(), &g, &tokens()),
			Err(Error::WriteForbidden { reason: DenyReason::InvalidOverrideToken, .. })
		));
	}

	#[test]
	fn test_lock_settings_save_never_blocked() {
		let registry = InterceptionRegistry::builtin();
		let g = guard(Principal::new("editor", Capabilities::new()), true, Some("bogus"));
		assert!(registry.enforce(&Site::LockSettingsSave, &SiteContext::new(), &g, &tokens()).is_ok());
	}
}

// vim: ts=4
