//! Behavior when the lock flag cannot be read

mod common;

use async_trait::async_trait;
use axum::http::StatusCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use common::{As, TestServer, assert_status, body_json};
use preservation::error::{ClResult, Error};
use preservation::notice::MODE_HEADER;
use preservation::settings::memory::MemorySettingsAdapter;
use preservation::settings_adapter::SettingsAdapter;

/// Settings store whose reads start failing on demand
#[derive(Debug, Default)]
struct UnreadableStore {
	inner: MemorySettingsAdapter,
	failing: AtomicBool,
}

#[async_trait]
impl SettingsAdapter for UnreadableStore {
	async fn read_setting(&self, key: &str) -> ClResult<Option<serde_json::Value>> {
		if self.failing.load(Ordering::SeqCst) {
			return Err(Error::Internal("settings store unavailable".into()));
		}
		self.inner.read_setting(key).await
	}

	async fn update_setting(&self, key: &str, value: Option<serde_json::Value>) -> ClResult<()> {
		self.inner.update_setting(key, value).await
	}
}

#[tokio::test]
async fn test_unreadable_lock_store_fails_closed() {
	let store = Arc::new(UnreadableStore::default());
	let server = TestServer::with_adapter(store.clone(), false).await;

	let res = server.send(As::editor().delete("/api/posts/1")).await;
	assert_status(&res, StatusCode::OK);

	store.failing.store(true, Ordering::SeqCst);

	let res = server.send(As::editor().delete("/api/posts/1")).await;
	assert_status(&res, StatusCode::FORBIDDEN);
	assert_eq!(res.headers().get(MODE_HEADER).unwrap(), "active");
	let body = body_json(res).await;
	assert_eq!(body["error"]["code"], "write_forbidden");
	assert_eq!(body["error"]["details"]["reason"], "lock_active");

	// Reads still pass
	let res = server.send(As::editor().get("/api/me")).await;
	assert_status(&res, StatusCode::OK);
}

// vim: ts=4
