// Holler — Store Module
//
// In-memory request state. Everything an agent posts lives here until a
// human answers it and the retention window evicts it. Nothing persists
// across broker restarts.

mod error;
mod models;
mod requests;

pub use error::StoreError;
pub use models::{
    is_valid_id, Decision, NewRequest, PermissionVerdict, Request, RequestStatus, RequestType,
    ID_LEN,
};
pub use requests::RequestStore;

// Field caps, applied by truncation at write time.
pub const MAX_QUESTION_LEN: usize = 2000;
pub const MAX_CONTEXT_LEN: usize = 5000;
pub const MAX_AGENT_LEN: usize = 100;
pub const MAX_TASK_LEN: usize = 200;
pub const MAX_COMMAND_LEN: usize = 2000;
pub const MAX_ANSWER_LEN: usize = 10000;

/// Admission cap: creation is refused while this many requests are pending.
pub const MAX_PENDING_REQUESTS: usize = 100;

/// Answered requests stay queryable this long, then the next create evicts them.
pub const ANSWERED_TTL_SECS: i64 = 300;
