pub mod models;

pub use models::cancellation::{Cancellation, RefundStatus};
pub use models::membership::{MembershipCredit, MembershipTier, UserMembership};
pub use models::reservation::{Reservation, ReservationStatus};
pub use models::schedule::{ClassSchedule, ClassType};
