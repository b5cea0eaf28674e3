pub use crate::app::App;
pub use preservation_types::action::{Action, DenyReason, Purpose, Surface, Verdict};
pub use preservation_types::error::{ClResult, Error};
pub use preservation_types::types::{LockState, Principal, SessionId, Timestamp};

pub use tracing::{debug, error, info, warn};

// vim: ts=4
