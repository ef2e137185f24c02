pub mod config;
pub mod notify;
pub mod payment;
pub mod repository;

use serde::{Deserialize, Serialize};

/// Boxed error type shared by every collaborator seam. Infrastructure
/// faults travel as these; business rejections never do.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Expected business outcomes. Always returned as data inside result
/// structs so callers can branch without exception handling.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectReason {
    Cancelled,
    PastClass,
    NotEnoughSeats,
    AlreadyReserved,
    NoValidSession,
    InsufficientSessions,
    AlreadyCancelled,
    PolicyDenied,
    NotFound,
}
