//! Core settings registration
//!
//! Registers the preservation lock flag and the basic site settings.

use preservation_types::action::LOCK_FLAG_KEY;

use crate::prelude::*;
use crate::settings::{PermissionLevel, SettingDefinition, SettingValue, SettingsRegistry};

const MAX_TITLE_LEN: usize = 200;

/// Register all core settings
pub fn register_settings(registry: &mut SettingsRegistry) -> ClResult<()> {
	// The lock flag. Written only through the preservation screen.
	registry.register(
		SettingDefinition::builder(LOCK_FLAG_KEY)
			.description("Disable saving functionality across the site")
			.default(SettingValue::Bool(false))
			.permission(PermissionLevel::Admin)
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder("site.title")
			.description("Site title")
			.default(SettingValue::String(String::new()))
			.permission(PermissionLevel::Admin)
			.validator(|value| match value {
				SettingValue::String(s) if s.chars().count() > MAX_TITLE_LEN => Err(
					Error::ValidationError(format!("Title is longer than {} characters", MAX_TITLE_LEN)),
				),
				_ => Ok(()),
			})
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder("site.description")
			.description("Site tagline")
			.default(SettingValue::String(String::new()))
			.permission(PermissionLevel::Admin)
			.build()?,
	)?;

	// Per-site UI preferences under any `ui.` key, unset until written
	registry.register(
		SettingDefinition::builder("ui.*")
			.description("User interface settings and preferences")
			.permission(PermissionLevel::User)
			.build()?,
	)?;

	Ok(())
}


// vim: ts=4
