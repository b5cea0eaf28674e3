//! In-process settings store.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::prelude::*;
use preservation_types::settings_adapter::SettingsAdapter;

/// Settings adapter keeping values in memory, lost on restart
#[derive(Debug, Default)]
pub struct MemorySettingsAdapter {
	values: RwLock<HashMap<String, serde_json::Value>>,
}

impl MemorySettingsAdapter {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl SettingsAdapter for MemorySettingsAdapter {
	async fn read_setting(&self, key: &str) -> ClResult<Option<serde_json::Value>> {
		Ok(self.values.read().get(key).cloned())
	}

	async fn update_setting(&self, key: &str, value: Option<serde_json::Value>) -> ClResult<()> {
		let mut values = self.values.write();
		match value {
			Some(value) => {
				values.insert(key.to_string(), value);
			}
			None => {
				values.remove(key);
			}
		}
		Ok(())
	}
}

// vim: ts=4
