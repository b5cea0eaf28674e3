//! Per-request preservation context

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::sync::{Arc, OnceLock};

use crate::app::AppState;
use crate::intercept::{Site, SiteContext};
use crate::prelude::*;
use crate::token::OverrideTokens;

#[derive(Debug)]
struct GuardInner {
	principal: Principal,
	session: Option<SessionId>,
	lock: LockState,
	override_token: Option<Box<str>>,
	override_valid: OnceLock<bool>,
	request_id: Option<String>,
}

/// Lock snapshot, principal and override token of one request.
///
/// Built once by the context middleware and shared by every interception
/// site the request passes, so all of them see the same lock state and the
/// override token is validated at most once.
#[derive(Debug, Clone)]
pub struct Guard(Arc<GuardInner>);

impl Guard {
	pub fn new(
		principal: Principal,
		session: Option<SessionId>,
		lock: LockState,
		override_token: Option<Box<str>>,
	) -> Self {
		Self(Arc::new(GuardInner {
			principal,
			session,
			lock,
			override_token,
			override_valid: OnceLock::new(),
			request_id: None,
		}))
	}

	/// Attach the request id used in log lines. Only valid before the guard is shared.
	pub fn with_request_id(self, request_id: Option<String>) -> Self {
		match Arc::try_unwrap(self.0) {
			Ok(mut inner) => {
				inner.request_id = request_id;
				Self(Arc::new(inner))
			}
			Err(shared) => Self(shared),
		}
	}

	pub fn principal(&self) -> &Principal {
		&self.0.principal
	}

	pub fn session(&self) -> Option<&SessionId> {
		self.0.session.as_ref()
	}

	pub fn lock(&self) -> LockState {
		self.0.lock
	}

	pub fn request_id(&self) -> Option<&str> {
		self.0.request_id.as_deref()
	}

	pub fn override_token_presented(&self) -> bool {
		self.0.override_token.as_deref().is_some_and(|t| !t.is_empty())
	}

	/// Whether the presented override token is valid for this principal and session
	pub fn override_valid(&self, tokens: &OverrideTokens) -> bool {
		*self.0.override_valid.get_or_init(|| {
			tokens.validate(
				self.0.override_token.as_deref(),
				&self.0.principal,
				self.0.session.as_ref(),
				Purpose::PreservationOverride,
			)
		})
	}

	/// Run an interception site, returning the denial as an error
	pub fn check(&self, app: &AppState, site: &Site, ctx: &SiteContext) -> ClResult<()> {
		app.interception.enforce(site, ctx, self, &app.tokens)
	}

	/// Whether a site would allow its action, without logging a denial
	pub fn allows(&self, app: &AppState, site: &Site, ctx: &SiteContext) -> bool {
		app.interception.evaluate(site, ctx, self, &app.tokens).verdict.is_allow()
	}
}

impl<S> FromRequestParts<S> for Guard
where
	S: Send + Sync,
{
	type Rejection = Error;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		parts.extensions.get::<Guard>().cloned().ok_or_else(|| {
			error!("Preservation context missing from request");
			Error::Internal("preservation context missing".into())
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn tokens() -> OverrideTokens {
		OverrideTokens::new(b"0123456789abcdef0123456789abcdef", 600).unwrap()
	}

	fn admin() -> Principal {
		Principal::new("admin", ["manage_settings"].into_iter().collect())
	}

	#[test]
	fn test_override_validity_cached() {
		let t = tokens();
		let session = SessionId::new("s");
		let issued = t.issue(&admin(), &session, Purpose::PreservationOverride).unwrap();
		let guard = Guard::new(admin(), Some(session), LockState::new(true), Some(issued.token));

		assert!(guard.override_valid(&t));
		// A different key would reject, but the first answer sticks for the request
		let other = OverrideTokens::new(b"fedcba9876543210fedcba9876543210", 600).unwrap();
		assert!(guard.override_valid(&other));
	}

	#[test]
	fn test_token_presence() {
		let guard = Guard::new(admin(), None, LockState::new(true), Some("".into()));
		assert!(!guard.override_token_presented());
		let guard = Guard::new(admin(), None, LockState::new(true), Some("x".into()));
		assert!(guard.override_token_presented());
		assert!(!guard.override_valid(&tokens()));
	}

	#[test]
	fn test_request_id() {
		let guard = Guard::new(admin(), None, LockState::new(false), None)
			.with_request_id(Some("req-1".into()));
		assert_eq!(guard.request_id(), Some("req-1"));
	}
}

// vim: ts=4
