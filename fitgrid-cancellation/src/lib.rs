pub mod executor;
pub mod orchestrator;
pub mod policy;

pub use executor::{CancellationExecutor, CancellationOutcome, MockRefundGateway};
pub use orchestrator::{ClassCancellationOrchestrator, ClassCancellationSummary};
pub use policy::{class_type_modifier, evaluate, MembershipPolicy, PolicyQuote, TimeBand};
