//! Preservation middlewares
//!
//! Layer order on a host router, outermost first:
//! host auth, [`preservation_context`], [`strip_capabilities`], then the
//! blocking layers ([`guard_api_writes`], [`guard_admin_posts`],
//! [`intercept`]) and finally the handler.

use axum::{
	extract::{Query, Request, State},
	http::{HeaderName, HeaderValue},
	middleware::Next,
	response::Response,
};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use preservation_types::extract::RequestId;

use crate::capability;
use crate::guard::Guard;
use crate::intercept::{Site, SiteContext};
use crate::lock;
use crate::notice::{LockChanged, MODE_HEADER, MODE_HEADER_ACTIVE};
use crate::prelude::*;

pub type PermissionCheckOutput = Pin<Box<dyn Future<Output = Result<Response, Error>> + Send>>;

/// Request header carrying an override token
pub const OVERRIDE_HEADER: &str = "x-preservation-override";
/// Query parameter carrying an override token, for plain links and forms
pub const OVERRIDE_QUERY_PARAM: &str = "_preservation_override";

fn override_token(req: &Request) -> Option<Box<str>> {
	if let Some(token) = req.headers().get(OVERRIDE_HEADER).and_then(|h| h.to_str().ok()) {
		return Some(token.trim().into());
	}
	let Query(mut query) = Query::<HashMap<String, String>>::try_from_uri(req.uri()).ok()?;
	query.remove(OVERRIDE_QUERY_PARAM).map(Into::into)
}

fn guard_of(req: &Request) -> ClResult<Guard> {
	req.extensions().get::<Guard>().cloned().ok_or_else(|| {
		error!(path = req.uri().path(), "Preservation context layer not installed");
		Error::Internal("preservation context missing".into())
	})
}

/// Snapshot the lock and build the request [`Guard`].
///
/// Must run after the host auth layer has inserted the principal and session.
pub async fn preservation_context(State(app): State<App>, mut req: Request, next: Next) -> Response {
	let lock = lock::snapshot(app.lock.as_ref()).await;
	let principal =
		req.extensions().get::<Principal>().cloned().unwrap_or_else(Principal::anonymous);
	let session = req.extensions().get::<SessionId>().cloned();
	let req_id = req.extensions().get::<RequestId>().map(|r| r.0.clone());
	let token = override_token(&req);

	let guard = Guard::new(principal, session, lock, token).with_request_id(req_id);
	req.extensions_mut().insert(guard);

	let mut res = next.run(req).await;
	let lock = res.extensions().get::<LockChanged>().map_or(lock, |changed| changed.0);
	if lock.enabled {
		res.headers_mut().insert(
			HeaderName::from_static(MODE_HEADER),
			HeaderValue::from_static(MODE_HEADER_ACTIVE),
		);
	}
	res
}

/// Replace the principal seen by handlers with its stripped form while locked
pub async fn strip_capabilities(
	State(app): State<App>,
	mut req: Request,
	next: Next,
) -> Result<Response, Error> {
	let guard = guard_of(&req)?;
	if guard.lock().enabled {
		let principal = capability::strip(&app.interception, &guard, &app.tokens);
		req.extensions_mut().insert(principal);
	}
	Ok(next.run(req).await)
}

/// Refuse every non-safe method on the API router
pub async fn guard_api_writes(
	State(app): State<App>,
	req: Request,
	next: Next,
) -> Result<Response, Error> {
	if !req.method().is_safe() {
		let guard = guard_of(&req)?;
		guard.check(&app, &Site::RestDispatch, &SiteContext::from_request(&req))?;
	}
	Ok(next.run(req).await)
}

/// Refuse form posts to admin screens, except the lock settings screen
pub async fn guard_admin_posts(
	State(app): State<App>,
	req: Request,
	next: Next,
) -> Result<Response, Error> {
	if !req.method().is_safe() {
		let guard = guard_of(&req)?;
		guard.check(&app, &Site::AdminPost, &SiteContext::from_request(&req))?;
	}
	Ok(next.run(req).await)
}

/// Middleware factory for a single interception site
///
/// Returns a middleware function that runs `site` against the request
/// context before the handler.
///
/// # Arguments
/// * `site` - The interception site guarding the route (e.g. `Site::ContentSave`)
///
/// # Returns
/// A cloneable middleware function with return type `PermissionCheckOutput`
pub fn intercept(site: Site) -> impl Fn(State<App>, Request, Next) -> PermissionCheckOutput + Clone {
	move |state, req, next| Box::pin(check_site(state, req, next, site.clone()))
}

async fn check_site(
	State(app): State<App>,
	req: Request,
	next: Next,
	site: Site,
) -> Result<Response, Error> {
	let guard = guard_of(&req)?;
	guard.check(&app, &site, &SiteContext::from_request(&req))?;
	Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::http::header;

	#[test]
	fn test_override_token_from_header() {
		let req = Request::builder()
			.uri("/api/posts?_preservation_override=fromquery")
			.header(OVERRIDE_HEADER, " fromheader ")
			.header(header::ACCEPT, "application/json")
			.body(axum::body::Body::empty())
			.unwrap();
		assert_eq!(override_token(&req).as_deref(), Some("fromheader"));
	}

	#[test]
	fn test_override_token_from_query() {
		let req = Request::builder()
			.uri("/admin/plugins?page=2&_preservation_override=abc-_12")
			.body(axum::body::Body::empty())
			.unwrap();
		assert_eq!(override_token(&req).as_deref(), Some("abc-_12"));

		let req = Request::builder().uri("/admin/plugins").body(axum::body::Body::empty()).unwrap();
		assert_eq!(override_token(&req), None);
	}
}

// vim: ts=4
