//! Lock notice shown to administrators and API clients

use serde::Serialize;

use preservation_types::error::WRITE_FORBIDDEN_MESSAGE;
use preservation_types::template::TemplateEngine;

use crate::prelude::*;

/// Response header set on every response while the lock is active
pub const MODE_HEADER: &str = "x-preservation-mode";
pub const MODE_HEADER_ACTIVE: &str = "active";

/// Path of the lock settings screen
pub const MANAGE_URL: &str = "/admin/preservation";

const ACTIVE_MESSAGE: &str = "Historical Preservation Mode is active.";
const ACTIVE_DETAIL: &str = "Saving functionality is disabled.";

/// Banner shown on admin screens while the lock is active
pub const NOTICE_BANNER: &str = "preservation.notice";
const NOTICE_BANNER_SOURCE: &str = include_str!("../templates/notice.html.hbs");

pub fn register_templates(templates: &mut TemplateEngine) -> ClResult<()> {
	templates.register(NOTICE_BANNER, NOTICE_BANNER_SOURCE)
}

#[derive(Serialize)]
struct Banner<'a> {
	message: &'a str,
	detail: &'a str,
	manage_url: Option<&'a str>,
}

/// Response extension from a handler that changed the lock flag.
/// The mode header reports this state instead of the request snapshot.
#[derive(Debug, Clone, Copy)]
pub struct LockChanged(pub LockState);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
	pub active: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub message: Option<&'static str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub write_message: Option<&'static str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub manage_url: Option<&'static str>,
}

impl Notice {
	/// Notice for a lock snapshot. The manage link is only shown to administrators.
	pub fn for_state(lock: LockState, principal: &Principal) -> Self {
		if !lock.enabled {
			return Self { active: false, message: None, write_message: None, manage_url: None };
		}
		Self {
			active: true,
			message: Some(ACTIVE_MESSAGE),
			write_message: Some(WRITE_FORBIDDEN_MESSAGE),
			manage_url: principal.has_admin_capability().then_some(MANAGE_URL),
		}
	}

	/// Banner markup for admin screens, empty while the lock is off
	pub fn render_html(&self, templates: &TemplateEngine) -> ClResult<String> {
		let Some(message) = self.message.filter(|_| self.active) else {
			return Ok(String::new());
		};
		templates.render(
			NOTICE_BANNER,
			&Banner { message, detail: ACTIVE_DETAIL, manage_url: self.manage_url },
		)
	}
}


// vim: ts=4
