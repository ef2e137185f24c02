use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use fitgrid_shared::{ClassSchedule, ClassType, MembershipTier, Reservation, UserMembership};

/// Per-tier cancellation terms: the rate applied inside the LATE band and
/// the grace minutes added to the member's clock.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MembershipPolicy {
    pub late_refund_rate: f64,
    pub grace_minutes: i64,
}

impl MembershipPolicy {
    /// Terms table, exhaustive over the known tiers.
    pub fn for_tier(tier: MembershipTier) -> Self {
        match tier {
            MembershipTier::Regular => Self {
                late_refund_rate: 0.5,
                grace_minutes: 0,
            },
            MembershipTier::Silver => Self {
                late_refund_rate: 0.6,
                grace_minutes: 30,
            },
            MembershipTier::Gold => Self {
                late_refund_rate: 0.7,
                grace_minutes: 60,
            },
            MembershipTier::Vip => Self {
                late_refund_rate: 0.8,
                grace_minutes: 120,
            },
        }
    }
}

/// Refund modifier by class type; premium formats refund less.
pub fn class_type_modifier(class_type: ClassType) -> f64 {
    match class_type {
        ClassType::Regular => 1.0,
        ClassType::Special => 0.8,
        ClassType::Workshop => 0.7,
        ClassType::Event => 0.5,
    }
}

/// How far ahead of the class start the cancellation lands, judged on the
/// grace-adjusted clock.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeBand {
    Early,
    Standard,
    Late,
}

const EARLY_THRESHOLD_HOURS: i64 = 48;
const STANDARD_THRESHOLD_HOURS: i64 = 24;
const EARLY_REFUND_RATE: f64 = 1.0;
const STANDARD_REFUND_RATE: f64 = 0.8;

/// A refund quote. Computed fresh on every call and never cached: the
/// result depends on the clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyQuote {
    pub can_cancel: bool,
    pub time_band: Option<TimeBand>,
    pub membership_tier: MembershipTier,
    pub class_type: ClassType,
    pub grace_minutes: i64,
    pub class_type_modifier: f64,
    /// Effective rate: band base rate times the class-type modifier.
    pub refund_rate: f64,
    pub refund_amount: i64,
    pub time_to_class_hours: f64,
    pub message: String,
}

/// Compute the refund terms for cancelling `reservation` now.
///
/// Pure apart from the clock read; safe to call repeatedly for quoting.
/// A missing membership applies REGULAR terms, logged as a deliberate
/// fallback.
pub fn evaluate(
    reservation: &Reservation,
    schedule: &ClassSchedule,
    membership: Option<&UserMembership>,
) -> PolicyQuote {
    let now = Utc::now();
    let tier = match membership {
        Some(m) => m.tier,
        None => {
            warn!(
                user_id = %reservation.user_id,
                "no membership on record, applying REGULAR cancellation terms"
            );
            MembershipTier::Regular
        }
    };
    let class_type = schedule.class_type;
    let policy = MembershipPolicy::for_tier(tier);
    let modifier = class_type_modifier(class_type);
    let time_to_class = schedule.start_at - now;
    let time_to_class_hours = time_to_class.num_milliseconds() as f64 / 3_600_000.0;

    if now >= schedule.start_at {
        return PolicyQuote {
            can_cancel: false,
            time_band: None,
            membership_tier: tier,
            class_type,
            grace_minutes: policy.grace_minutes,
            class_type_modifier: modifier,
            refund_rate: 0.0,
            refund_amount: 0,
            time_to_class_hours,
            message: "This class has already started and can no longer be cancelled.".to_string(),
        };
    }

    // Grace minutes shift the band boundaries in the member's favor.
    let adjusted = time_to_class + Duration::minutes(policy.grace_minutes);
    let (time_band, base_rate) = if adjusted >= Duration::hours(EARLY_THRESHOLD_HOURS) {
        (TimeBand::Early, EARLY_REFUND_RATE)
    } else if adjusted >= Duration::hours(STANDARD_THRESHOLD_HOURS) {
        (TimeBand::Standard, STANDARD_REFUND_RATE)
    } else {
        (TimeBand::Late, policy.late_refund_rate)
    };

    let refund_rate = base_rate * modifier;
    let refund_amount = (reservation.total_price as f64 * refund_rate).round() as i64;

    PolicyQuote {
        can_cancel: true,
        time_band: Some(time_band),
        membership_tier: tier,
        class_type,
        grace_minutes: policy.grace_minutes,
        class_type_modifier: modifier,
        refund_rate,
        refund_amount,
        time_to_class_hours,
        message: format!(
            "Cancelling now refunds {:.0}% ({}).",
            refund_rate * 100.0,
            refund_amount
        ),
    }
}
