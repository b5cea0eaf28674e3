//! Settings service with validation and permission checks

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

use crate::lock::LockStateProvider;
use crate::prelude::*;
use preservation_types::action::LOCK_FLAG_KEY;
use preservation_types::settings_adapter::SettingsAdapter;

use super::types::{FrozenSettingsRegistry, SettingValue};

/// Setting value as written
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Setting {
	pub key: String,
	pub value: SettingValue,
	pub updated_at: Timestamp,
}

/// Settings service - main interface for accessing and managing settings.
///
/// Values are read from the adapter on every call, there is no cache: the lock
/// flag must be read fresh for each request.
pub struct SettingsService {
	registry: Arc<FrozenSettingsRegistry>,
	adapter: Arc<dyn SettingsAdapter>,
}

impl SettingsService {
	pub fn new(registry: Arc<FrozenSettingsRegistry>, adapter: Arc<dyn SettingsAdapter>) -> Self {
		Self { registry, adapter }
	}

	pub fn registry(&self) -> &FrozenSettingsRegistry {
		&self.registry
	}

	/// Current value: stored, else the default. `None` for a setting without
	/// a default that was never written.
	pub async fn get(&self, key: &str) -> ClResult<Option<SettingValue>> {
		let def = self.registry.get(key).ok_or(Error::NotFound)?;

		if let Some(json_value) = self.adapter.read_setting(key).await? {
			let value = serde_json::from_value::<SettingValue>(json_value)
				.map_err(|e| Error::ValidationError(format!("Invalid setting value: {}", e)))?;
			return Ok(Some(value));
		}
		Ok(def.default.clone())
	}

	/// Set setting value with validation and permission checks.
	///
	/// Preservation mode is not checked here. Callers pass the interception
	/// site for the write before calling this.
	pub async fn set(
		&self,
		key: &str,
		value: SettingValue,
		principal: &Principal,
	) -> ClResult<Setting> {
		let def = self.registry.get(key).ok_or(Error::NotFound)?;

		if !def.permission.allows(principal) {
			warn!(
				subject = %principal.id_tag,
				key = key,
				permission = ?def.permission,
				"Setting update refused by permission level"
			);
			return Err(Error::PermissionDenied);
		}

		if let Some(default) = &def.default {
			if !value.same_kind(default) {
				return Err(Error::ValidationError(format!(
					"Type mismatch for setting '{}': expected {}, got {}",
					key,
					default.kind(),
					value.kind()
				)));
			}
		}

		if let Some(validator) = &def.validator {
			validator(&value)?;
		}

		self.write(key, &value).await?;
		info!(subject = %principal.id_tag, key = key, "Setting updated");

		Ok(Setting { key: key.to_string(), value, updated_at: Timestamp::now() })
	}

	async fn write(&self, key: &str, value: &SettingValue) -> ClResult<()> {
		let json_value = serde_json::to_value(value)
			.map_err(|e| Error::ValidationError(format!("Failed to serialize setting: {}", e)))?;
		self.adapter.update_setting(key, Some(json_value)).await
	}

	/// Write install-time defaults for settings that must exist in the store.
	///
	/// Only the lock flag is persisted eagerly, so a fresh install starts
	/// with preservation mode explicitly off.
	pub async fn install_defaults(&self) -> ClResult<()> {
		if self.adapter.read_setting(LOCK_FLAG_KEY).await?.is_none() {
			info!("Initializing {} = false", LOCK_FLAG_KEY);
			self.write(LOCK_FLAG_KEY, &SettingValue::Bool(false)).await?;
		}
		Ok(())
	}
}

#[async_trait]
impl LockStateProvider for SettingsService {
	async fn lock_enabled(&self) -> ClResult<bool> {
		match self.get(LOCK_FLAG_KEY).await? {
			Some(SettingValue::Bool(enabled)) => Ok(enabled),
			_ => Err(Error::ValidationError(format!("Setting '{}' is not a boolean", LOCK_FLAG_KEY))),
		}
	}

	async fn set_lock_enabled(&self, enabled: bool) -> ClResult<()> {
		self.write(LOCK_FLAG_KEY, &SettingValue::Bool(enabled)).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::core_settings;
	use crate::settings::memory::MemorySettingsAdapter;
	use crate::settings::types::SettingsRegistry;

	fn service() -> (SettingsService, Arc<MemorySettingsAdapter>) {
		let mut registry = SettingsRegistry::new();
		core_settings::register_settings(&mut registry).unwrap();
		let adapter = Arc::new(MemorySettingsAdapter::new());
		(SettingsService::new(Arc::new(registry.freeze()), adapter.clone()), adapter)
	}

	fn admin() -> Principal {
		Principal::new("admin", ["manage_settings"].into_iter().collect())
	}

	#[tokio::test]
	async fn test_lock_defaults_to_disabled() {
		let (service, _) = service();
		assert!(!service.lock_enabled().await.unwrap());
	}

	#[tokio::test]
	async fn test_install_defaults_persists_flag_once() {
		let (service, adapter) = service();
		service.install_defaults().await.unwrap();
		assert_eq!(
			adapter.read_setting(LOCK_FLAG_KEY).await.unwrap(),
			Some(serde_json::json!(false))
		);

		service.set_lock_enabled(true).await.unwrap();
		service.install_defaults().await.unwrap();
		assert!(service.lock_enabled().await.unwrap());
	}

	#[tokio::test]
	async fn test_lock_toggle_roundtrip() {
		let (service, _) = service();
		service.set_lock_enabled(true).await.unwrap();
		assert!(service.lock_enabled().await.unwrap());
		service.set_lock_enabled(false).await.unwrap();
		assert!(!service.lock_enabled().await.unwrap());
	}

	#[tokio::test]
	async fn test_set_checks_permission_and_type() {
		let (service, _) = service();
		let user = Principal::new("user", Default::default());

		assert!(matches!(
			service.set("site.title", SettingValue::String("Archive".into()), &user).await,
			Err(Error::PermissionDenied)
		));
		assert!(matches!(
			service.set("site.title", SettingValue::Int(3), &admin()).await,
			Err(Error::ValidationError(_))
		));

		let setting =
			service.set("site.title", SettingValue::String("Archive".into()), &admin()).await.unwrap();
		assert_eq!(setting.value, SettingValue::String("Archive".into()));
		assert_eq!(
			service.get("site.title").await.unwrap(),
			Some(SettingValue::String("Archive".into()))
		);
	}

	#[tokio::test]
	async fn test_unknown_setting() {
		let (service, _) = service();
		assert!(matches!(service.get("nope").await, Err(Error::NotFound)));
	}

	#[tokio::test]
	async fn test_wildcard_setting_without_default_reads_unset() {
		let (service, _) = service();
		let user = Principal::new("user", Default::default());

		assert_eq!(service.get("ui.theme").await.unwrap(), None);

		service.set("ui.theme", SettingValue::String("dark".into()), &user).await.unwrap();
		assert_eq!(service.get("ui.theme").await.unwrap(), Some(SettingValue::String("dark".into())));
		assert_eq!(service.get("ui.density").await.unwrap(), None);
	}

	#[tokio::test]
	async fn test_corrupt_lock_flag_is_an_error() {
		let (service, adapter) = service();
		adapter.update_setting(LOCK_FLAG_KEY, Some(serde_json::json!("yes"))).await.unwrap();
		assert!(service.lock_enabled().await.is_err());
	}
}

// vim: ts=4
