// Holler — Request store
//
// Authoritative, concurrency-safe state for all requests. One mutex guards
// the whole map; every operation holds it for its full duration and does no
// I/O inside the critical section. The map is bounded by the pending cap
// plus whatever answered requests the retention window has not yet evicted.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{Duration, Utc};
use uuid::Uuid;

use super::models::{
    clip, clip_opt, is_valid_id, NewRequest, Request, RequestStatus, RequestType, ID_LEN,
};
use super::{
    StoreError, ANSWERED_TTL_SECS, MAX_AGENT_LEN, MAX_ANSWER_LEN, MAX_COMMAND_LEN,
    MAX_CONTEXT_LEN, MAX_PENDING_REQUESTS, MAX_QUESTION_LEN, MAX_TASK_LEN,
};

/// In-memory store for agent requests. Cheap to construct; tests build an
/// isolated instance per case, the broker shares one behind an `Arc`.
pub struct RequestStore {
    requests: Mutex<HashMap<String, Request>>,
}

impl RequestStore {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(HashMap::new()),
        }
    }

    /// Create a new pending request.
    ///
    /// Runs the eviction sweep, then checks admission: when the pending
    /// count is already at `MAX_PENDING_REQUESTS` the request is refused
    /// with `StoreError::PendingCapacity` so the caller sees backpressure
    /// instead of unbounded growth. Text fields are truncated to their
    /// caps, never rejected for length.
    pub fn create(&self, new: NewRequest) -> Result<Request, StoreError> {
        if new.request_type == RequestType::Permission && new.command.is_none() {
            return Err(StoreError::MissingCommand);
        }

        let mut requests = self.lock();
        evict_stale(&mut requests);

        let pending = requests
            .values()
            .filter(|r| r.status == RequestStatus::Pending)
            .count();
        if pending >= MAX_PENDING_REQUESTS {
            return Err(StoreError::PendingCapacity);
        }

        let id = fresh_id(&requests);
        let request = Request {
            id: id.clone(),
            question: clip(new.question, MAX_QUESTION_LEN),
            context: clip_opt(new.context, MAX_CONTEXT_LEN),
            agent: clip_opt(new.agent, MAX_AGENT_LEN),
            task: clip_opt(new.task, MAX_TASK_LEN),
            request_type: new.request_type,
            // A command only means something on a permission request.
            command: match new.request_type {
                RequestType::Permission => clip_opt(new.command, MAX_COMMAND_LEN),
                RequestType::Question => None,
            },
            status: RequestStatus::Pending,
            answer: None,
            created_at: Utc::now(),
            answered_at: None,
        };
        requests.insert(id, request.clone());
        Ok(request)
    }

    /// Look up a request by id. Ids that do not match the server-generated
    /// shape are rejected before the lookup, so hostile strings (paths,
    /// shell metacharacters) never reach any other part of the system.
    pub fn get(&self, id: &str) -> Option<Request> {
        if !is_valid_id(id) {
            return None;
        }
        self.lock().get(id).cloned()
    }

    /// Snapshot of every request currently pending.
    pub fn pending(&self) -> Vec<Request> {
        self.lock()
            .values()
            .filter(|r| r.status == RequestStatus::Pending)
            .cloned()
            .collect()
    }

    /// Record the human's answer. Returns false for malformed ids, unknown
    /// ids, and requests that are already answered: the first answer wins
    /// and is never overwritten.
    pub fn answer(&self, id: &str, text: &str) -> bool {
        if !is_valid_id(id) {
            return false;
        }
        let mut requests = self.lock();
        let Some(request) = requests.get_mut(id) else {
            return false;
        };
        if request.status != RequestStatus::Pending {
            return false;
        }
        request.status = RequestStatus::Answered;
        request.answer = Some(clip(text.to_string(), MAX_ANSWER_LEN));
        request.answered_at = Some(Utc::now());
        true
    }

    /// True iff at least one request is pending. The watchdog polls this.
    pub fn has_pending(&self) -> bool {
        self.lock()
            .values()
            .any(|r| r.status == RequestStatus::Pending)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Request>> {
        // A poisoned lock only means another thread panicked mid-operation;
        // the map itself is still usable.
        self.requests.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for RequestStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop answered requests older than the retention window. Pending requests
/// are never evicted: an abandoned caller keeps its slot until a human
/// answers, which is a known, bounded leak (at most the pending cap).
fn evict_stale(requests: &mut HashMap<String, Request>) {
    let cutoff = Utc::now() - Duration::seconds(ANSWERED_TTL_SECS);
    requests.retain(|_, r| match (r.status, r.answered_at) {
        (RequestStatus::Answered, Some(at)) => at > cutoff,
        _ => true,
    });
}

/// Generate an id no existing request holds: the first 12 hex chars of a
/// UUIDv4, regenerated on the (vanishingly rare) collision.
fn fresh_id(requests: &HashMap<String, Request>) -> String {
    loop {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(ID_LEN);
        if !requests.contains_key(&id) {
            return id;
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
