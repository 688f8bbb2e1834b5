// Holler — Store error types

use thiserror::Error;

/// Reasons `RequestStore::create` can refuse a request. Both are expected
/// caller-visible outcomes, not internal failures: the protocol layer maps
/// them to 400 and 429 responses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A permission request arrived without the command it is asking about.
    #[error("missing command for permission request")]
    MissingCommand,

    /// The pending-request cap has been reached. Backpressure, not failure:
    /// the slot frees up as soon as a human answers any pending request.
    #[error("too many pending requests")]
    PendingCapacity,
}
