//! Setting definitions and the registry they are declared in

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;

use crate::prelude::*;

pub type SettingValidator = Box<dyn Fn(&SettingValue) -> ClResult<()> + Send + Sync>;

/// Who may write a setting through the settings API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
	/// Principals holding the admin capability
	Admin,
	/// Any authenticated principal
	User,
}

impl PermissionLevel {
	pub fn allows(self, principal: &Principal) -> bool {
		match self {
			PermissionLevel::Admin => principal.has_admin_capability(),
			PermissionLevel::User => !principal.is_anonymous(),
		}
	}
}

/// Stored setting value. The kind is fixed by the definition's default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
	// Listed before Int so `true` never deserializes as a number
	Bool(bool),
	Int(i64),
	String(String),
	Json(serde_json::Value),
}

impl SettingValue {
	pub fn kind(&self) -> &'static str {
		match self {
			SettingValue::Bool(_) => "bool",
			SettingValue::Int(_) => "int",
			SettingValue::String(_) => "string",
			SettingValue::Json(_) => "json",
		}
	}

	pub fn same_kind(&self, other: &SettingValue) -> bool {
		self.kind() == other.kind()
	}
}

/// A declared setting. A key ending in `.*` covers every key under that prefix.
pub struct SettingDefinition {
	pub key: String,
	pub description: String,
	/// Value reported while nothing is stored. Without one the setting reads as unset.
	pub default: Option<SettingValue>,
	pub permission: PermissionLevel,
	pub validator: Option<SettingValidator>,
}

impl Debug for SettingDefinition {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SettingDefinition")
			.field("key", &self.key)
			.field("default", &self.default)
			.field("permission", &self.permission)
			.field("validator", &self.validator.is_some())
			.finish_non_exhaustive()
	}
}

impl SettingDefinition {
	pub fn builder(key: impl Into<String>) -> SettingDefinitionBuilder {
		SettingDefinitionBuilder {
			key: key.into(),
			description: None,
			default: None,
			permission: PermissionLevel::Admin,
			validator: None,
		}
	}
}

pub struct SettingDefinitionBuilder {
	key: String,
	description: Option<String>,
	default: Option<SettingValue>,
	permission: PermissionLevel,
	validator: Option<SettingValidator>,
}

impl SettingDefinitionBuilder {
	pub fn description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	pub fn default(mut self, value: SettingValue) -> Self {
		self.default = Some(value);
		self
	}

	/// Defaults to [`PermissionLevel::Admin`]
	pub fn permission(mut self, permission: PermissionLevel) -> Self {
		self.permission = permission;
		self
	}

	pub fn validator<F>(mut self, f: F) -> Self
	where
		F: Fn(&SettingValue) -> ClResult<()> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(f));
		self
	}

	pub fn build(self) -> ClResult<SettingDefinition> {
		let Some(description) = self.description else {
			return Err(Error::ConfigError(format!("Setting '{}' needs a description", self.key)));
		};
		if self.key.is_empty() || self.key.starts_with('.') {
			return Err(Error::ConfigError(format!("Invalid setting key '{}'", self.key)));
		}

		Ok(SettingDefinition {
			key: self.key,
			description,
			default: self.default,
			permission: self.permission,
			validator: self.validator,
		})
	}
}

/// Registry filled while the app is built
#[derive(Default)]
pub struct SettingsRegistry {
	definitions: HashMap<String, SettingDefinition>,
}

impl SettingsRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&mut self, def: SettingDefinition) -> ClResult<()> {
		if self.definitions.contains_key(&def.key) {
			return Err(Error::ConfigError(format!("Setting '{}' is already registered", def.key)));
		}
		debug!(key = %def.key, "Setting registered");
		self.definitions.insert(def.key.clone(), def);
		Ok(())
	}

	pub fn freeze(self) -> FrozenSettingsRegistry {
		FrozenSettingsRegistry { definitions: self.definitions }
	}

	pub fn len(&self) -> usize {
		self.definitions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.definitions.is_empty()
	}
}

/// Read-only registry held by the app state
pub struct FrozenSettingsRegistry {
	definitions: HashMap<String, SettingDefinition>,
}

impl FrozenSettingsRegistry {
	/// Exact key first, then the `<prefix>.*` wildcard covering it
	pub fn get(&self, key: &str) -> Option<&SettingDefinition> {
		self.definitions.get(key).or_else(|| {
			let (prefix, _) = key.split_once('.')?;
			self.definitions.get(&format!("{}.*", prefix))
		})
	}

	/// Definitions sorted by key
	pub fn list(&self) -> Vec<&SettingDefinition> {
		let mut defs: Vec<_> = self.definitions.values().collect();
		defs.sort_by(|a, b| a.key.cmp(&b.key));
		defs
	}

	pub fn len(&self) -> usize {
		self.definitions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.definitions.is_empty()
	}
}


// vim: ts=4
