//! Shared fixtures for router-level tests
#![allow(dead_code)]

use axum::{
	Json, Router,
	body::Body,
	extract::Request,
	http::{HeaderMap, Method, StatusCode},
	middleware::{self, Next},
	response::Response,
	routing::{delete, get, post},
};
use std::sync::Arc;
use tower::ServiceExt;

use preservation::app::AppBuilder;
use preservation::error::ClResult;
use preservation::intercept::Site;
use preservation::lock::LockStateProvider;
use preservation::middleware::intercept;
use preservation::routes::{self, HostRoutes};
use preservation::settings::memory::MemorySettingsAdapter;
use preservation::settings_adapter::SettingsAdapter;
use preservation::types::{Capabilities, Principal, SessionId};
use preservation::prelude::App;

pub const USER_HEADER: &str = "x-test-user";
pub const CAPS_HEADER: &str = "x-test-caps";
pub const SESSION_HEADER: &str = "x-test-session";

pub const ADMIN_CAPS: &str = "read,manage_settings,edit_content,install_extensions";
pub const EDITOR_CAPS: &str = "read,edit_content,delete_content,upload_media";

/// Stand-in for a host auth layer: identity comes from plain headers
async fn header_auth(mut req: Request, next: Next) -> Response {
	let headers = req.headers();
	let principal = headers.get(USER_HEADER).and_then(|h| h.to_str().ok()).map(|user| {
		let caps: Capabilities = headers
			.get(CAPS_HEADER)
			.and_then(|h| h.to_str().ok())
			.unwrap_or_default()
			.split(',')
			.filter(|c| !c.is_empty())
			.collect();
		Principal::new(user, caps)
	});
	let session = headers.get(SESSION_HEADER).and_then(|h| h.to_str().ok()).map(SessionId::new);

	if let Some(principal) = principal {
		req.extensions_mut().insert(principal);
	}
	if let Some(session) = session {
		req.extensions_mut().insert(session);
	}
	next.run(req).await
}

async fn save_post(principal: Principal) -> ClResult<&'static str> {
	if !principal.can("edit_content") {
		return Err(preservation::error::Error::PermissionDenied);
	}
	Ok("saved")
}

async fn whoami(principal: Principal) -> Json<Principal> {
	Json(principal)
}

fn host_routes(app: &App) -> HostRoutes {
	let admin = Router::new()
		.route(
			"/admin/posts/{id}",
			post(save_post)
				.route_layer(middleware::from_fn_with_state(app.clone(), intercept(Site::ContentSave))),
		)
		.route(
			"/admin/widgets",
			post(async || "widgets saved").route_layer(middleware::from_fn_with_state(
				app.clone(),
				intercept(Site::WidgetUpdate),
			)),
		)
		.route(
			"/admin/menus",
			post(async || "menus saved").route_layer(middleware::from_fn_with_state(
				app.clone(),
				intercept(Site::MenuUpdate),
			)),
		)
		.route(
			"/admin/extensions",
			post(async || "installed").route_layer(middleware::from_fn_with_state(
				app.clone(),
				intercept(Site::ExtensionChange),
			)),
		);

	let api = Router::new()
		.route("/api/me", get(whoami))
		.route("/api/posts", post(async || "created"))
		.route(
			"/api/posts/{id}",
			delete(async || "deleted").route_layer(middleware::from_fn_with_state(
				app.clone(),
				intercept(Site::ContentDelete),
			)),
		);

	HostRoutes { admin, api }
}

pub struct TestServer {
	pub app: App,
	pub router: Router,
}

impl TestServer {
	pub async fn new(locked: bool) -> Self {
		Self::with_adapter(Arc::new(MemorySettingsAdapter::new()), locked).await
	}

	pub async fn with_adapter(adapter: Arc<dyn SettingsAdapter>, locked: bool) -> Self {
		let mut builder = AppBuilder::new();
		builder.secret("integration-test-secret-0123456789").settings_adapter(adapter);
		let app = builder.build().await.unwrap();
		app.lock.set_lock_enabled(locked).await.unwrap();

		let router = routes::init(&app, host_routes(&app)).layer(middleware::from_fn(header_auth));
		Self { app, router }
	}

	pub async fn send(&self, req: Request) -> Response {
		self.router.clone().oneshot(req).await.unwrap()
	}
}

/// Request builder with an identity
pub struct As {
	headers: HeaderMap,
}

impl As {
	pub fn anonymous() -> Self {
		Self { headers: HeaderMap::new() }
	}

	pub fn user(user: &str, caps: &str, session: Option<&str>) -> Self {
		let mut headers = HeaderMap::new();
		headers.insert(USER_HEADER, user.parse().unwrap());
		headers.insert(CAPS_HEADER, caps.parse().unwrap());
		if let Some(session) = session {
			headers.insert(SESSION_HEADER, session.parse().unwrap());
		}
		Self { headers }
	}

	pub fn admin() -> Self {
		Self::user("admin", ADMIN_CAPS, Some("admin-session"))
	}

	pub fn editor() -> Self {
		Self::user("editor", EDITOR_CAPS, Some("editor-session"))
	}

	pub fn header(mut self, name: &'static str, value: &str) -> Self {
		self.headers.insert(name, value.parse().unwrap());
		self
	}

	pub fn request(&self, method: Method, uri: &str, body: Body) -> Request {
		let mut req = Request::builder().method(method).uri(uri).body(body).unwrap();
		req.headers_mut().extend(self.headers.clone());
		req
	}

	pub fn get(&self, uri: &str) -> Request {
		self.request(Method::GET, uri, Body::empty())
	}

	pub fn post(&self, uri: &str) -> Request {
		self.request(Method::POST, uri, Body::empty())
	}

	pub fn delete(&self, uri: &str) -> Request {
		self.request(Method::DELETE, uri, Body::empty())
	}

	pub fn form(&self, uri: &str, fields: &[(&str, &str)]) -> Request {
		let mut req =
			self.request(Method::POST, uri, Body::from(serde_urlencoded::to_string(fields).unwrap()));
		req.headers_mut().insert(
			axum::http::header::CONTENT_TYPE,
			"application/x-www-form-urlencoded".parse().unwrap(),
		);
		req
	}

	pub fn json(&self, method: Method, uri: &str, value: serde_json::Value) -> Request {
		let mut req = self.request(method, uri, Body::from(value.to_string()));
		req.headers_mut()
			.insert(axum::http::header::CONTENT_TYPE, "application/json".parse().unwrap());
		req
	}
}

pub async fn body_string(res: Response) -> String {
	let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
	String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(res: Response) -> serde_json::Value {
	serde_json::from_str(&body_string(res).await).unwrap()
}

/// Form token embedded in the settings screen
pub fn form_token(html: &str) -> String {
	let marker = r#"name="_form_token" value=""#;
	let start = html.find(marker).unwrap() + marker.len();
	let end = start + html[start..].find('"').unwrap();
	html[start..end].to_string()
}

pub fn assert_status(res: &Response, status: StatusCode) {
	assert_eq!(res.status(), status, "unexpected status");
}

// vim: ts=4
