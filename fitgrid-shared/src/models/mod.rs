pub mod cancellation;
pub mod membership;
pub mod reservation;
pub mod schedule;
