//! Custom Axum extractors for identity data set by the host auth layer.
//!
//! The host authentication middleware inserts [`Principal`] and [`SessionId`]
//! into request extensions. These extractors read them back.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::Error;
use crate::types::{Principal, SessionId};

// Principal //
//***********//
/// Missing principal resolves to the anonymous principal, never an error
impl<S> FromRequestParts<S> for Principal
where
	S: Send + Sync,
{
	type Rejection = Error;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		Ok(parts.extensions.get::<Principal>().cloned().unwrap_or_else(Principal::anonymous))
	}
}

// AdminPrincipal //
//****************//
/// Principal holding the admin capability, rejects everyone else
#[derive(Clone, Debug)]
pub struct AdminPrincipal(pub Principal);

impl<S> FromRequestParts<S> for AdminPrincipal
where
	S: Send + Sync,
{
	type Rejection = Error;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		match parts.extensions.get::<Principal>() {
			Some(principal) if principal.has_admin_capability() => {
				Ok(AdminPrincipal(principal.clone()))
			}
			Some(_) => Err(Error::PermissionDenied),
			None => Err(Error::Unauthorized),
		}
	}
}

// OptionalSession //
//*****************//
#[derive(Clone, Debug)]
pub struct OptionalSession(pub Option<SessionId>);

impl<S> FromRequestParts<S> for OptionalSession
where
	S: Send + Sync,
{
	type Rejection = Error;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		Ok(OptionalSession(parts.extensions.get::<SessionId>().cloned()))
	}
}

// RequestId //
//***********//
/// Request ID for tracing and debugging
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

/// Optional Request ID extractor - always succeeds, returns None if not available
#[derive(Clone, Debug)]
pub struct OptionalRequestId(pub Option<String>);

impl<S> FromRequestParts<S> for OptionalRequestId
where
	S: Send + Sync,
{
	type Rejection = Error;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		let req_id = parts.extensions.get::<RequestId>().map(|r| r.0.clone());
		Ok(OptionalRequestId(req_id))
	}
}

// vim: ts=4
