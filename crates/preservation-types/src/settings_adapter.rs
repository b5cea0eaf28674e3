//! Adapter trait for the external settings store.
//!
//! The store persists raw JSON values under dot-separated keys. Typing,
//! defaults and permissions are handled by the settings service on top.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::prelude::*;

#[async_trait]
pub trait SettingsAdapter: Debug + Send + Sync {
	/// Read the stored value of a setting, `None` if it was never written
	async fn read_setting(&self, key: &str) -> ClResult<Option<serde_json::Value>>;

	/// Store a setting value, `None` removes it
	async fn update_setting(&self, key: &str, value: Option<serde_json::Value>) -> ClResult<()>;
}

// vim: ts=4
