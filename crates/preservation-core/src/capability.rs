//! Capability stripping.
//!
//! While the lock is active the host's own UI still asks "may this principal
//! edit?". Removing the mutating capabilities from the principal the host sees
//! hides edit affordances and makes the host's own permission checks refuse
//! the write, on top of the blocking sites.

use preservation_types::types::ADMIN_CAPABILITY;

use crate::guard::Guard;
use crate::intercept::{InterceptionRegistry, Site, SiteContext};
use crate::prelude::*;
use crate::token::OverrideTokens;

/// Mutating capabilities and the action each one grants
const MUTATING_CAPABILITIES: &[(&str, fn() -> Action)] = &[
	("edit_content", || Action::ContentWrite),
	("publish_content", || Action::ContentWrite),
	("delete_content", || Action::ContentDelete),
	("upload_media", || Action::MediaUpload),
	("edit_widgets", || Action::WidgetChange),
	("edit_menus", || Action::MenuChange),
	("install_extensions", || Action::ThemeOrPluginChange),
	("activate_extensions", || Action::ThemeOrPluginChange),
	("edit_settings", || Action::settings_write("*")),
];

/// Action a capability grants, `None` for capabilities that do not mutate
pub fn action_for(capability: &str) -> Option<Action> {
	MUTATING_CAPABILITIES.iter().find(|(name, _)| *name == capability).map(|(_, action)| action())
}

/// Whether the capability is subject to stripping
pub fn is_mutating(capability: &str) -> bool {
	MUTATING_CAPABILITIES.iter().any(|(name, _)| *name == capability)
}

/// Principal as the host should see it for this request.
///
/// Each mutating capability is run through the capability site; denied ones
/// are removed. The admin capability and read capabilities are never removed,
/// so an administrator can still reach the lock settings screen.
pub fn strip(
	registry: &InterceptionRegistry,
	guard: &Guard,
	tokens: &OverrideTokens,
) -> Principal {
	let principal = guard.principal();
	if !guard.lock().enabled {
		return principal.clone();
	}

	let mut stripped = principal.clone();
	stripped.capabilities.retain(|capability| {
		if &**capability == ADMIN_CAPABILITY || !is_mutating(capability) {
			return true;
		}
		let ctx = SiteContext::new().capability(&**capability);
		registry.evaluate(&Site::CapabilityMap, &ctx, guard, tokens).verdict.is_allow()
	});

	if stripped.capabilities.len() != principal.capabilities.len() {
		debug!(
			subject = %principal.id_tag,
			removed = principal.capabilities.len() - stripped.capabilities.len(),
			"Mutating capabilities stripped by preservation mode"
		);
	}
	stripped
}


// vim: ts=4
