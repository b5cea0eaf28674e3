//! Static bearer token authentication

use axum::{
	extract::{Request, State},
	http::header,
	middleware::Next,
	response::Response,
};
use std::{collections::HashMap, sync::Arc};

use preservation::prelude::*;
use preservation::types::Capabilities;
use preservation::utils::random_id;

/// Identity bound to one bearer token
#[derive(Debug, Clone)]
pub struct TokenIdentity {
	pub principal: Principal,
	pub session: SessionId,
}

#[derive(Debug, Default)]
pub struct StaticTokens {
	tokens: HashMap<Box<str>, TokenIdentity>,
}

impl StaticTokens {
	/// Parse `token=user:cap1,cap2;token2=user2:cap3`.
	///
	/// Each token gets its own session id, fresh on every start.
	pub fn parse(entries: &str) -> ClResult<Self> {
		let mut tokens = HashMap::new();
		for entry in entries.split(';').map(str::trim).filter(|e| !e.is_empty()) {
			let (token, identity) = entry
				.split_once('=')
				.ok_or_else(|| Error::ConfigError(format!("Invalid auth token entry: {}", entry)))?;
			let (user, caps) = identity.split_once(':').unwrap_or((identity, ""));
			if token.is_empty() || user.is_empty() {
				return Err(Error::ConfigError(format!("Invalid auth token entry: {}", entry)));
			}

			let capabilities: Capabilities =
				caps.split(',').map(str::trim).filter(|c| !c.is_empty()).collect();
			let identity = TokenIdentity {
				principal: Principal::new(user, capabilities),
				session: SessionId::new(random_id()?),
			};
			tokens.insert(token.into(), identity);
		}
		Ok(Self { tokens })
	}

	pub fn get(&self, token: &str) -> Option<&TokenIdentity> {
		self.tokens.get(token)
	}

	pub fn len(&self) -> usize {
		self.tokens.len()
	}

	pub fn is_empty(&self) -> bool {
		self.tokens.is_empty()
	}
}

/// Insert the principal and session of a known bearer token.
///
/// Requests without credentials continue as anonymous.
pub async fn authenticate(
	State(tokens): State<Arc<StaticTokens>>,
	mut req: Request,
	next: Next,
) -> ClResult<Response> {
	let Some(auth_header) = req.headers().get(header::AUTHORIZATION) else {
		return Ok(next.run(req).await);
	};
	let token = auth_header
		.to_str()
		.ok()
		.and_then(|h| h.strip_prefix("Bearer "))
		.map(str::trim)
		.ok_or(Error::Unauthorized)?;
	let Some(identity) = tokens.get(token).cloned() else {
		warn!("Unknown bearer token");
		return Err(Error::Unauthorized);
	};

	req.extensions_mut().insert(identity.principal);
	req.extensions_mut().insert(identity.session);
	Ok(next.run(req).await)
}


// vim: ts=4
