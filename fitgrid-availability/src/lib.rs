pub mod cache;
pub mod classify;
pub mod service;

pub use cache::{AvailabilityCache, CachedPayload};
pub use classify::{classify, ScheduleStatus};
pub use service::{AvailabilityService, ScheduleWithStatus};
