//! Filesystem settings store tests

use preservation_settings_adapter_fs::{SETTINGS_FILE, SettingsAdapterFs};
use preservation_types::settings_adapter::SettingsAdapter;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

async fn create_test_adapter() -> (SettingsAdapterFs, TempDir) {
	let temp_dir = TempDir::new().expect("Failed to create temp directory");
	let adapter =
		SettingsAdapterFs::new(temp_dir.path().into()).await.expect("Failed to create adapter");
	(adapter, temp_dir)
}

#[tokio::test]
async fn test_missing_setting_is_none() {
	let (adapter, _temp) = create_test_adapter().await;
	assert_eq!(adapter.read_setting("preservation.enabled").await.unwrap(), None);
}

#[tokio::test]
async fn test_update_and_read() {
	let (adapter, _temp) = create_test_adapter().await;
	adapter.update_setting("preservation.enabled", Some(json!(true))).await.unwrap();
	adapter.update_setting("site.title", Some(json!("Archive"))).await.unwrap();

	assert_eq!(adapter.read_setting("preservation.enabled").await.unwrap(), Some(json!(true)));
	assert_eq!(adapter.read_setting("site.title").await.unwrap(), Some(json!("Archive")));
}

#[tokio::test]
async fn test_values_survive_reopen() {
	let (adapter, temp) = create_test_adapter().await;
	adapter.update_setting("preservation.enabled", Some(json!(true))).await.unwrap();
	drop(adapter);

	let reopened = SettingsAdapterFs::new(temp.path().into()).await.unwrap();
	assert_eq!(reopened.read_setting("preservation.enabled").await.unwrap(), Some(json!(true)));
}

#[tokio::test]
async fn test_remove_setting() {
	let (adapter, temp) = create_test_adapter().await;
	adapter.update_setting("site.title", Some(json!("Archive"))).await.unwrap();
	adapter.update_setting("site.title", None).await.unwrap();
	assert_eq!(adapter.read_setting("site.title").await.unwrap(), None);

	let reopened = SettingsAdapterFs::new(temp.path().into()).await.unwrap();
	assert_eq!(reopened.read_setting("site.title").await.unwrap(), None);
}

#[tokio::test]
async fn test_no_tmp_files_left_behind() {
	let (adapter, temp) = create_test_adapter().await;
	for i in 0..3 {
		adapter.update_setting("ui.counter", Some(json!(i))).await.unwrap();
	}

	let names: Vec<String> = std::fs::read_dir(temp.path())
		.unwrap()
		.map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
		.collect();
	assert_eq!(names, vec![SETTINGS_FILE.to_string()]);
}

#[tokio::test]
async fn test_corrupt_file_rejected() {
	let temp = TempDir::new().unwrap();
	std::fs::write(temp.path().join(SETTINGS_FILE), b"{ not json").unwrap();
	assert!(SettingsAdapterFs::new(temp.path().into()).await.is_err());
}

#[tokio::test]
async fn test_concurrent_updates() {
	let (adapter, temp) = create_test_adapter().await;
	let adapter = Arc::new(adapter);

	let mut handles = vec![];
	for i in 0..5 {
		let adapter = Arc::clone(&adapter);
		handles.push(tokio::spawn(async move {
			adapter.update_setting(&format!("ui.key{}", i), Some(json!(i))).await
		}));
	}
	for handle in handles {
		handle.await.expect("Task panicked").unwrap();
	}

	let reopened = SettingsAdapterFs::new(temp.path().into()).await.unwrap();
	for i in 0..5 {
		assert_eq!(reopened.read_setting(&format!("ui.key{}", i)).await.unwrap(), Some(json!(i)));
	}
}

// vim: ts=4
