//! Router assembly

use axum::{
	Router,
	extract::Request,
	http::{HeaderName, HeaderValue},
	middleware::{self, Next},
	response::Response,
	routing::get,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::prelude::*;
use crate::{api, screen};
use preservation_core::middleware::{
	guard_admin_posts, guard_api_writes, preservation_context, strip_capabilities,
};
use preservation_types::extract::RequestId;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Host routers mounted behind the preservation layers
#[derive(Default)]
pub struct HostRoutes {
	/// Admin screens under `/admin`
	pub admin: Router<App>,
	/// Programmatic API under `/api`
	pub api: Router<App>,
}

async fn request_id(mut req: Request, next: Next) -> Response {
	let req_id = uuid::Uuid::new_v4().to_string();
	req.extensions_mut().insert(RequestId(req_id.clone()));

	let mut res = next.run(req).await;
	if let Ok(value) = HeaderValue::from_str(&req_id) {
		res.headers_mut().insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
	}
	res
}

fn init_admin(app: &App, host: Router<App>) -> Router<App> {
	Router::new()
		.route(
			"/admin/preservation",
			get(screen::get_settings_screen).post(screen::post_settings_screen),
		)
		.merge(host)
		.layer(middleware::from_fn_with_state(app.clone(), guard_admin_posts))
}

fn init_api(app: &App, host: Router<App>) -> Router<App> {
	Router::new()
		.route("/api/preservation/status", get(api::get_status))
		.route("/api/preservation/override-token", get(api::get_override_token))
		.route("/api/settings", get(api::list_settings))
		.route("/api/settings/{key}", get(api::get_setting).put(api::update_setting))
		.merge(host)
		.layer(middleware::from_fn_with_state(app.clone(), guard_api_writes))
}

/// Build the complete router.
///
/// The host's auth layer must wrap the returned router so the principal and
/// session extensions exist before the preservation context is built.
pub fn init(app: &App, host: HostRoutes) -> Router {
	Router::new()
		.merge(init_admin(app, host.admin))
		.merge(init_api(app, host.api))
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(middleware::from_fn(request_id))
				.layer(middleware::from_fn_with_state(app.clone(), preservation_context))
				.layer(middleware::from_fn_with_state(app.clone(), strip_capabilities)),
		)
		.with_state(app.clone())
}

// vim: ts=4
