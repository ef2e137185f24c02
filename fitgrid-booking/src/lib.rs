pub mod admission;
pub mod hold;
pub mod sweeper;

pub use admission::{AdmissionChecker, AdmissionDecision};
pub use hold::{HoldManager, HoldOutcome};
pub use sweeper::HoldSweeper;
