//! Mutation categories and policy outcomes.
//!
//! Every interception site classifies the effect it is about to permit into an
//! [`Action`]. The policy decision point turns an action into a [`Verdict`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Settings key of the preservation lock flag itself.
pub const LOCK_FLAG_KEY: &str = "preservation.enabled";

/// A mutating effect an interception site is about to permit.
///
/// New variants may be added later. Consumers outside this crate must match
/// with a wildcard arm, and that arm has to deny.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Action {
	/// Create or edit a content item
	ContentWrite,
	/// Delete or trash a content item
	ContentDelete,
	/// Accept an uploaded file
	MediaUpload,
	/// Add, remove or reconfigure a widget
	WidgetChange,
	/// Edit navigation menus
	MenuChange,
	/// Install, activate, update or remove a theme or plugin
	ThemeOrPluginChange,
	/// Write a single settings option
	SettingsWrite { option: Box<str> },
	/// Programmatic write through the API
	RestWrite { method: Box<str>, route: Box<str> },
	/// Render or submit an admin screen that edits state
	ScreenAccess { screen: Box<str> },
	/// The site could not classify what it is about to do
	Unclassified { site: Box<str> },
}

impl Action {
	pub fn settings_write(option: impl Into<Box<str>>) -> Self {
		Action::SettingsWrite { option: option.into() }
	}

	pub fn rest_write(method: impl Into<Box<str>>, route: impl Into<Box<str>>) -> Self {
		Action::RestWrite { method: method.into(), route: route.into() }
	}

	pub fn screen_access(screen: impl Into<Box<str>>) -> Self {
		Action::ScreenAccess { screen: screen.into() }
	}

	pub fn unclassified(site: impl Into<Box<str>>) -> Self {
		Action::Unclassified { site: site.into() }
	}

	/// Whether this is the write that toggles the lock flag
	pub fn is_lock_flag_write(&self) -> bool {
		matches!(self, Action::SettingsWrite { option } if option.as_ref() == LOCK_FLAG_KEY)
	}
}

impl fmt::Display for Action {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Action::ContentWrite => write!(f, "content:write"),
			Action::ContentDelete => write!(f, "content:delete"),
			Action::MediaUpload => write!(f, "media:upload"),
			Action::WidgetChange => write!(f, "widget:change"),
			Action::MenuChange => write!(f, "menu:change"),
			Action::ThemeOrPluginChange => write!(f, "extension:change"),
			Action::SettingsWrite { option } => write!(f, "settings:write({})", option),
			Action::RestWrite { method, route } => write!(f, "rest:write({} {})", method, route),
			Action::ScreenAccess { screen } => write!(f, "screen:access({})", screen),
			Action::Unclassified { site } => write!(f, "unclassified({})", site),
		}
	}
}

/// Why a mutation was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
	/// Preservation mode is on and no override applies
	LockActive,
	/// An override token was presented but did not validate
	InvalidOverrideToken,
	/// The interception site could not classify the action
	UnknownAction,
}

impl DenyReason {
	pub fn as_str(&self) -> &'static str {
		match self {
			DenyReason::LockActive => "lock_active",
			DenyReason::InvalidOverrideToken => "invalid_override_token",
			DenyReason::UnknownAction => "unknown_action",
		}
	}
}

impl fmt::Display for DenyReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Outcome of a policy decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
	Allow,
	Deny(DenyReason),
}

impl Verdict {
	pub fn is_allow(&self) -> bool {
		matches!(self, Verdict::Allow)
	}

	pub fn is_deny(&self) -> bool {
		!self.is_allow()
	}
}

/// Where a denial is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
	/// Human-facing admin screens: HTML failure page
	Screen,
	/// Programmatic clients: structured JSON error
	Api,
}

/// The single purpose a token is minted for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Purpose {
	/// Per-request bypass of the lock for administrators
	PreservationOverride,
	/// Replay-resistant token of the lock settings form
	LockSettingsForm,
}

impl Purpose {
	pub fn as_str(&self) -> &'static str {
		match self {
			Purpose::PreservationOverride => "preservation_override",
			Purpose::LockSettingsForm => "lock_settings_form",
		}
	}
}

impl fmt::Display for Purpose {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}


// vim: ts=4
