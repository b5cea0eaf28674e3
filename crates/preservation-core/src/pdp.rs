//! Policy decision point.
//!
//! The one place that decides whether a mutation may proceed. Every
//! interception site funnels through [`decide`], so adding a new mutation
//! surface never adds a new deny branch.
//!
//! Order of evaluation:
//! 1. Lock off: allow everything.
//! 2. Unknown action: deny, override or not.
//! 3. Valid override held by an administrator: allow.
//! 4. Write of the lock flag itself: allow, so the lock can always be lifted.
//! 5. Anything else: deny.

use preservation_types::action::{Action, DenyReason, Verdict};
use preservation_types::types::Principal;

/// Whether the action is one of the known mutation categories
fn is_known(action: &Action) -> bool {
	match action {
		Action::ContentWrite
		| Action::ContentDelete
		| Action::MediaUpload
		| Action::WidgetChange
		| Action::MenuChange
		| Action::ThemeOrPluginChange
		| Action::SettingsWrite { .. }
		| Action::RestWrite { .. }
		| Action::ScreenAccess { .. } => true,
		// Unclassified, and any variant added after this list was written
		_ => false,
	}
}

/// Decide a single action. Pure function of its inputs.
pub fn decide(
	action: &Action,
	principal: &Principal,
	lock_enabled: bool,
	override_valid: bool,
) -> Verdict {
	if !lock_enabled {
		return Verdict::Allow;
	}

	if !is_known(action) {
		return Verdict::Deny(DenyReason::UnknownAction);
	}

	if override_valid && principal.has_admin_capability() {
		return Verdict::Allow;
	}

	if action.is_lock_flag_write() {
		return Verdict::Allow;
	}

	Verdict::Deny(DenyReason::LockActive)
}


// vim: ts=4
