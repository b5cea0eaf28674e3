//! Lock state provider.
//!
//! The lock flag lives in the external settings store. The core only reads it,
//! once per request; writes come exclusively from the lock settings screen.

use async_trait::async_trait;

use crate::prelude::*;

#[async_trait]
pub trait LockStateProvider: Send + Sync {
	/// Current value of the lock flag
	async fn lock_enabled(&self) -> ClResult<bool>;

	/// Persist a new value of the lock flag
	async fn set_lock_enabled(&self, enabled: bool) -> ClResult<()>;
}

/// Snapshot the lock for one request.
///
/// A store that cannot be read is reported as locked: the failure mode of an
/// unreadable flag is refusing writes, not accepting them.
pub async fn snapshot(provider: &dyn LockStateProvider) -> LockState {
	match provider.lock_enabled().await {
		Ok(enabled) => LockState::new(enabled),
		Err(err) => {
			error!("Cannot read preservation lock state, assuming locked: {}", err);
			LockState::new(true)
		}
	}
}

// vim: ts=4
