//! Purpose-bound tokens for the override and the lock settings form.
//!
//! A token is a random nonce and an HMAC-SHA256 tag over the time tick, the
//! purpose, the principal, the session and the nonce, keyed by a server
//! secret. Nothing is stored server-side: validation recomputes the tag for
//! the current and the previous tick. The tick is half of the configured lifetime, so a token stays valid
//! for at least half and at most the full lifetime.
//!
//! Tokens never change the lock state. They only gate the decisions of the
//! request that presents them.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use sha2::Sha256;
use std::num::NonZeroUsize;

use crate::prelude::*;
use preservation_types::utils::random_id;

type HmacSha256 = Hmac<Sha256>;

/// Truncated tag length in bytes
const TAG_LEN: usize = 16;
const MIN_SECRET_LEN: usize = 16;
const MAX_NONCE_LEN: usize = 64;

/// Default token lifetime in seconds
pub const DEFAULT_TOKEN_LIFETIME: i64 = 600;

/// A freshly minted token as handed out to the client
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
	pub purpose: Purpose,
	pub token: Box<str>,
	pub expires_at: Timestamp,
}

/// Issues and validates purpose-bound tokens
pub struct OverrideTokens {
	key: Box<[u8]>,
	lifetime: i64,
}

impl std::fmt::Debug for OverrideTokens {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("OverrideTokens")
			.field("key", &"<redacted>")
			.field("lifetime", &self.lifetime)
			.finish()
	}
}

fn update_field(mac: &mut HmacSha256, field: &[u8]) {
	mac.update(&u64::try_from(field.len()).unwrap_or(u64::MAX).to_be_bytes());
	mac.update(field);
}

impl OverrideTokens {
	pub fn new(secret: &[u8], lifetime: i64) -> ClResult<Self> {
		if secret.len() < MIN_SECRET_LEN {
			return Err(Error::ConfigError(format!(
				"Token secret must be at least {} bytes",
				MIN_SECRET_LEN
			)));
		}
		if lifetime < 2 {
			return Err(Error::ConfigError("Token lifetime must be at least 2 seconds".into()));
		}
		Ok(Self { key: secret.into(), lifetime })
	}

	pub fn lifetime(&self) -> i64 {
		self.lifetime
	}

	fn half_life(&self) -> i64 {
		self.lifetime / 2
	}

	fn tick(&self, now: Timestamp) -> i64 {
		now.0.div_euclid(self.half_life())
	}

	fn mac(
		&self,
		tick: i64,
		purpose: Purpose,
		principal: &Principal,
		session: &SessionId,
		nonce: &str,
	) -> ClResult<HmacSha256> {
		let mut mac = HmacSha256::new_from_slice(&self.key)
			.map_err(|_| Error::ConfigError("Invalid token secret".into()))?;
		update_field(&mut mac, &tick.to_be_bytes());
		update_field(&mut mac, purpose.as_str().as_bytes());
		update_field(&mut mac, principal.id_tag.as_bytes());
		update_field(&mut mac, session.0.as_bytes());
		update_field(&mut mac, nonce.as_bytes());
		Ok(mac)
	}

	/// Mint a token for the given purpose, bound to the principal and session
	pub fn issue(
		&self,
		principal: &Principal,
		session: &SessionId,
		purpose: Purpose,
	) -> ClResult<IssuedToken> {
		self.issue_at(principal, session, purpose, Timestamp::now())
	}

	pub fn issue_at(
		&self,
		principal: &Principal,
		session: &SessionId,
		purpose: Purpose,
		now: Timestamp,
	) -> ClResult<IssuedToken> {
		if !principal.has_admin_capability() {
			return Err(Error::PermissionDenied);
		}

		let tick = self.tick(now);
		let nonce = random_id()?;
		let tag = self.mac(tick, purpose, principal, session, &nonce)?.finalize().into_bytes();
		let token = format!("{}.{}", nonce, URL_SAFE_NO_PAD.encode(&tag[..TAG_LEN]));

		Ok(IssuedToken {
			purpose,
			token: token.into(),
			expires_at: Timestamp(tick.saturating_add(2).saturating_mul(self.half_life())),
		})
	}

	/// Check a presented token. The capability check comes before any token work.
	pub fn validate(
		&self,
		token: Option<&str>,
		principal: &Principal,
		session: Option<&SessionId>,
		purpose: Purpose,
	) -> bool {
		self.validate_at(token, principal, session, purpose, Timestamp::now())
	}

	pub fn validate_at(
		&self,
		token: Option<&str>,
		principal: &Principal,
		session: Option<&SessionId>,
		purpose: Purpose,
		now: Timestamp,
	) -> bool {
		if !principal.has_admin_capability() {
			return false;
		}
		let Some(session) = session else {
			return false;
		};
		let Some((nonce, tag)) = token.and_then(|t| t.split_once('.')) else {
			return false;
		};
		if nonce.is_empty() || nonce.len() > MAX_NONCE_LEN {
			return false;
		}
		let Ok(tag) = URL_SAFE_NO_PAD.decode(tag) else {
			return false;
		};
		if tag.len() != TAG_LEN {
			return false;
		}

		let tick = self.tick(now);
		[tick, tick - 1].into_iter().any(|t| {
			self.mac(t, purpose, principal, session, nonce)
				.is_ok_and(|mac| mac.verify_truncated_left(&tag).is_ok())
		})
	}
}

/// Remembers consumed single-use tokens so a captured form cannot be replayed
pub struct ReplayGuard {
	used: Mutex<LruCache<Box<str>, ()>>,
}

impl ReplayGuard {
	pub fn new(capacity: usize) -> Self {
		let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
		Self { used: Mutex::new(LruCache::new(capacity)) }
	}

	/// Mark a token as used. Returns `false` if it was already consumed.
	pub fn consume(&self, token: &str) -> bool {
		let mut used = self.used.lock();
		if used.contains(token) {
			return false;
		}
		used.put(token.into(), ());
		true
	}
}

impl std::fmt::Debug for ReplayGuard {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ReplayGuard").field("used", &self.used.lock().len()).finish()
	}
}


// vim: ts=4
