// Holler — Top-level error types
//
// Aggregates the failure modes the caller can hit. `Timeout` and `Denied`
// are outcomes, not faults: `main` maps them to their contract exit codes
// (1 and 2) so scripted agents can branch on the result.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HollerError {
    /// The polling deadline passed without a human answer.
    #[error("timed out waiting for an answer")]
    Timeout,

    /// The human denied a permission request.
    #[error("permission denied")]
    Denied { comment: String },

    /// Transport failure talking to the broker.
    #[error("failed to reach broker: {0}")]
    Http(#[from] reqwest::Error),

    /// The broker answered, but with an error or a malformed body.
    #[error("broker error: {0}")]
    Broker(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HollerError>;
