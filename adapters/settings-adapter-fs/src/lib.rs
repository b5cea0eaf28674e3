//! Filesystem settings store.
//!
//! All settings live in one JSON object file. The file is loaded once on open;
//! every update rewrites it through a temporary file and a rename, so a crash
//! never leaves a half-written store behind.

use std::{
	collections::BTreeMap,
	fmt::Debug,
	path::{Path, PathBuf},
};

use async_trait::async_trait;
use tokio::{
	fs::{File, create_dir_all, read, remove_file, rename},
	io::AsyncWriteExt,
	sync::RwLock,
};

use preservation_types::{prelude::*, settings_adapter::SettingsAdapter, utils::random_id};

pub const SETTINGS_FILE: &str = "settings.json";

type SettingsMap = BTreeMap<String, serde_json::Value>;

fn tmp_file_path(base_dir: &Path) -> ClResult<PathBuf> {
	Ok(base_dir.join(format!("tmp-{}", random_id()?)))
}

#[derive(Debug)]
pub struct SettingsAdapterFs {
	base_dir: Box<Path>,
	values: RwLock<SettingsMap>,
}

impl SettingsAdapterFs {
	/// Open the store in `base_dir`, creating the directory if needed
	pub async fn new(base_dir: Box<Path>) -> ClResult<Self> {
		create_dir_all(&base_dir).await?;

		let values = match read(base_dir.join(SETTINGS_FILE)).await {
			Ok(data) => serde_json::from_slice::<SettingsMap>(&data).map_err(|e| {
				error!("Settings file {:?} is corrupt: {}", base_dir.join(SETTINGS_FILE), e);
				Error::Json(e)
			})?,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => SettingsMap::new(),
			Err(e) => return Err(e.into()),
		};
		info!("Settings store opened with {} values: {:?}", values.len(), &base_dir);

		Ok(Self { base_dir, values: RwLock::new(values) })
	}

	async fn persist(&self, values: &SettingsMap) -> ClResult<()> {
		let data = serde_json::to_vec_pretty(values)?;
		let tmp_path = tmp_file_path(&self.base_dir)?;

		let res = async {
			let mut file = File::create(&tmp_path).await?;
			file.write_all(&data).await?;
			file.sync_all().await?;
			rename(&tmp_path, self.base_dir.join(SETTINGS_FILE)).await?;
			Ok::<(), Error>(())
		}
		.await;
		if let Err(e) = res {
			warn!("Settings write failed, removing tmpfile: {:?}", &tmp_path);
			let _ = remove_file(&tmp_path).await;
			return Err(e);
		}

		Ok(())
	}
}

#[async_trait]
impl SettingsAdapter for SettingsAdapterFs {
	async fn read_setting(&self, key: &str) -> ClResult<Option<serde_json::Value>> {
		Ok(self.values.read().await.get(key).cloned())
	}

	async fn update_setting(&self, key: &str, value: Option<serde_json::Value>) -> ClResult<()> {
		// Held across the file write: updates are applied one at a time
		let mut values = self.values.write().await;
		let previous = match value {
			Some(value) => values.insert(key.to_string(), value),
			None => values.remove(key),
		};

		if let Err(e) = self.persist(&values).await {
			match previous {
				Some(previous) => values.insert(key.to_string(), previous),
				None => values.remove(key),
			};
			return Err(e);
		}
		debug!("Setting stored: {}", key);

		Ok(())
	}
}

// vim: ts=4
