//! Settings API behavior under the lock

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{As, TestServer, assert_status, body_json};
use preservation::lock::LockStateProvider;
use preservation::middleware::OVERRIDE_HEADER;

#[tokio::test]
async fn test_list_and_get_settings() {
	let server = TestServer::new(false).await;

	let res = server.send(As::editor().get("/api/settings")).await;
	assert_status(&res, StatusCode::OK);
	let body = body_json(res).await;
	let keys: Vec<&str> =
		body["data"].as_array().unwrap().iter().map(|s| s["key"].as_str().unwrap()).collect();
	assert!(keys.contains(&"preservation.enabled"));
	assert!(keys.contains(&"site.title"));
	assert!(!keys.iter().any(|k| k.ends_with(".*")));

	let res = server.send(As::editor().get("/api/settings/preservation.enabled")).await;
	assert_status(&res, StatusCode::OK);
	assert_eq!(body_json(res).await["data"]["value"], false);

	let res = server.send(As::editor().get("/api/settings/nope")).await;
	assert_status(&res, StatusCode::NOT_FOUND);

	let res = server.send(As::anonymous().get("/api/settings")).await;
	assert_status(&res, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wildcard_setting_unset_until_written() {
	let server = TestServer::new(false).await;

	let res = server.send(As::editor().get("/api/settings/ui.theme")).await;
	assert_status(&res, StatusCode::OK);
	let body = body_json(res).await;
	assert_eq!(body["data"]["value"], serde_json::Value::Null);
	assert_eq!(body["data"]["permission"], "user");

	let res = server
		.send(As::editor().json(Method::PUT, "/api/settings/ui.theme", json!({ "value": "dark" })))
		.await;
	assert_status(&res, StatusCode::OK);

	let res = server.send(As::editor().get("/api/settings/ui.theme")).await;
	assert_eq!(body_json(res).await["data"]["value"], "dark");
}

#[tokio::test]
async fn test_update_setting_unlocked() {
	let server = TestServer::new(false).await;

	let res = server
		.send(As::admin().json(Method::PUT, "/api/settings/site.title", json!({ "value": "Archive" })))
		.await;
	assert_status(&res, StatusCode::OK);
	assert_eq!(body_json(res).await["data"]["value"], "Archive");

	let res = server
		.send(As::editor().json(Method::PUT, "/api/settings/site.title", json!({ "value": "Mine" })))
		.await;
	assert_status(&res, StatusCode::FORBIDDEN);
	assert_eq!(body_json(res).await["error"]["code"], "permission_denied");
}

#[tokio::test]
async fn test_update_setting_locked() {
	let server = TestServer::new(true).await;

	let res = server
		.send(As::admin().json(Method::PUT, "/api/settings/site.title", json!({ "value": "Archive" })))
		.await;
	assert_status(&res, StatusCode::FORBIDDEN);
	assert_eq!(body_json(res).await["error"]["code"], "write_forbidden");

	// With an override the write goes through
	let res = server.send(As::admin().get("/api/preservation/override-token")).await;
	let token = body_json(res).await["data"]["token"].as_str().unwrap().to_string();
	let res = server
		.send(As::admin().header(OVERRIDE_HEADER, &token).json(
			Method::PUT,
			"/api/settings/site.title",
			json!({ "value": "Archive" }),
		))
		.await;
	assert_status(&res, StatusCode::OK);
}

#[tokio::test]
async fn test_lock_flag_not_writable_through_api() {
	for locked in [false, true] {
		let server = TestServer::new(locked).await;
		let res = server.send(As::admin().get("/api/preservation/override-token")).await;
		let token = body_json(res).await["data"]["token"].as_str().unwrap().to_string();

		let res = server
			.send(As::admin().header(OVERRIDE_HEADER, &token).json(
				Method::PUT,
				"/api/settings/preservation.enabled",
				json!({ "value": !locked }),
			))
			.await;
		assert_status(&res, StatusCode::FORBIDDEN);
		assert_eq!(server.app.lock.lock_enabled().await.unwrap(), locked);
	}
}

// vim: ts=4
