//! HTML templates rendered with Handlebars
//!
//! Templates are registered once when the app is built and rendered by name.
//! Values are HTML-escaped unless a template uses a triple-stash.

use handlebars::Handlebars;
use serde::Serialize;
use std::sync::LazyLock;

use crate::error::WRITE_FORBIDDEN_MESSAGE;
use crate::prelude::*;

/// Page shown when a screen request is refused by preservation mode
pub const BLOCKED_PAGE: &str = "blocked";
const BLOCKED_PAGE_SOURCE: &str = include_str!("../templates/blocked.html.hbs");

/// Template registry shared by the preservation crates and the host
#[derive(Clone, Debug)]
pub struct TemplateEngine {
	handlebars: Handlebars<'static>,
}

impl TemplateEngine {
	/// Create an engine with the built-in templates registered
	pub fn new() -> ClResult<Self> {
		let mut handlebars = Handlebars::new();

		// Undefined variables are template bugs
		handlebars.set_strict_mode(true);

		let mut engine = Self { handlebars };
		engine.register(BLOCKED_PAGE, BLOCKED_PAGE_SOURCE)?;
		Ok(engine)
	}

	pub fn register(&mut self, name: &str, source: &str) -> ClResult<()> {
		self.handlebars.register_template_string(name, source).map_err(|e| {
			Error::ConfigError(format!("Invalid template '{}': {}", name, e))
		})
	}

	pub fn has_template(&self, name: &str) -> bool {
		self.handlebars.has_template(name)
	}

	pub fn render<T: Serialize>(&self, name: &str, data: &T) -> ClResult<String> {
		self.handlebars.render(name, data).map_err(|e| {
			error!("Failed to render template '{}': {}", name, e);
			Error::Internal(format!("Failed to render template '{}'", name))
		})
	}
}

/// Built-in templates for responses rendered without app state
static BUILTIN: LazyLock<Option<TemplateEngine>> = LazyLock::new(|| {
	TemplateEngine::new()
		.inspect_err(|e| error!("Cannot register built-in templates: {}", e))
		.ok()
});

#[derive(Serialize)]
struct BlockedPage {
	message: &'static str,
}

/// "Action Blocked" page, falling back to the bare message
pub fn blocked_page() -> String {
	BUILTIN
		.as_ref()
		.and_then(|engine| {
			engine.render(BLOCKED_PAGE, &BlockedPage { message: WRITE_FORBIDDEN_MESSAGE }).ok()
		})
		.unwrap_or_else(|| WRITE_FORBIDDEN_MESSAGE.to_string())
}


// vim: ts=4
