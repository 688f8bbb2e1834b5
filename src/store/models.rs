// Holler — Request data models
//
// A Request is the single entity in the system: a question (or permission
// prompt) posted by an agent, waiting for a human answer. All text fields
// are truncated to their caps at write time rather than rejected, so a
// chatty agent can never grow the store without bound.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Length of a request id: 12 lowercase hex characters.
pub const ID_LEN: usize = 12;

/// What kind of request an agent posted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestType {
    /// Free-text question, answered with free text.
    #[default]
    Question,
    /// Permission prompt for a specific command, answered with a verdict.
    Permission,
}

/// Lifecycle state of a request. One-way: pending, then answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Answered,
}

/// A request posted by an agent, as stored and as served over the wire.
/// Timestamps travel as unix seconds so browser-side age math stays trivial.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub id: String,
    pub question: String,
    pub context: Option<String>,
    pub agent: Option<String>,
    pub task: Option<String>,
    pub request_type: RequestType,
    /// The command a permission request is asking to run. Always `Some`
    /// for `Permission`, always `None` for `Question`.
    pub command: Option<String>,
    pub status: RequestStatus,
    pub answer: Option<String>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds_option")]
    pub answered_at: Option<DateTime<Utc>>,
}

impl Request {
    /// Parse the answer of a permission request into a verdict.
    /// Returns `None` for question requests, unanswered requests, or
    /// answers that are not valid verdict JSON.
    pub fn verdict(&self) -> Option<PermissionVerdict> {
        if self.request_type != RequestType::Permission {
            return None;
        }
        serde_json::from_str(self.answer.as_deref()?).ok()
    }
}

/// Input struct for creating a new request.
#[derive(Debug, Clone, Default)]
pub struct NewRequest {
    pub question: String,
    pub context: Option<String>,
    pub agent: Option<String>,
    pub task: Option<String>,
    pub request_type: RequestType,
    pub command: Option<String>,
}

/// The human's decision on a permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Denied,
}

/// The structured answer payload of a permission request. Stored in the
/// request's `answer` field as a small JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionVerdict {
    pub decision: Decision,
    #[serde(default)]
    pub comment: String,
}

/// True iff `id` has the exact server-generated shape: 12 lowercase hex
/// characters. Anything else (wrong length, uppercase, path separators)
/// is rejected before it reaches a lookup.
pub fn is_valid_id(id: &str) -> bool {
    id.len() == ID_LEN && id.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Truncate a string to at most `max` characters, in place at a char
/// boundary. Multi-byte text is clipped by character count, not bytes.
pub(crate) fn clip(mut value: String, max: usize) -> String {
    if let Some((idx, _)) = value.char_indices().nth(max) {
        value.truncate(idx);
    }
    value
}

pub(crate) fn clip_opt(value: Option<String>, max: usize) -> Option<String> {
    value.map(|v| clip(v, max))
}

// ─── Tests ───────────────────────────────────────────────────────────────────
