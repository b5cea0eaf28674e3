pub use crate::action::{Action, DenyReason, Purpose, Surface, Verdict};
pub use crate::error::{ClResult, Error};
pub use crate::types::{LockState, Principal, SessionId, Timestamp};

pub use tracing::{debug, error, info, warn};

// vim: ts=4
