use serde::{Deserialize, Serialize};

use fitgrid_shared::ClassSchedule;

/// Availability status shown on listings and calendars.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleStatus {
    Available,
    Limited,
    Full,
    Cancelled,
}

/// Classify a schedule purely from its cancellation flag and seat counts.
/// CANCELLED dominates FULL dominates LIMITED dominates AVAILABLE.
pub fn classify(schedule: &ClassSchedule) -> ScheduleStatus {
    if schedule.is_cancelled {
        return ScheduleStatus::Cancelled;
    }
    if schedule.remaining_seats <= 0 {
        return ScheduleStatus::Full;
    }
    if schedule.remaining_seats <= limited_threshold(schedule.capacity) {
        return ScheduleStatus::Limited;
    }
    ScheduleStatus::Available
}

/// Seats at or below this count read as LIMITED: ceil(capacity * 0.2).
pub fn limited_threshold(capacity: i32) -> i32 {
    (capacity + 4) / 5
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use fitgrid_shared::ClassType;
    use uuid::Uuid;

    fn schedule(capacity: i32, remaining: i32, cancelled: bool) -> ClassSchedule {
        let mut s = ClassSchedule::new(
            Uuid::new_v4(),
            ClassType::Regular,
            Utc::now() + Duration::days(1),
            60,
            capacity,
        );
        s.remaining_seats = remaining;
        s.is_cancelled = cancelled;
        s
    }

    #[test]
    fn test_cancelled_dominates_everything() {
        // Even a full schedule reads CANCELLED once the flag is set.
        assert_eq!(classify(&schedule(10, 0, true)), ScheduleStatus::Cancelled);
        assert_eq!(classify(&schedule(10, 10, true)), ScheduleStatus::Cancelled);
    }

    #[test]
    fn test_full_when_no_seats_remain() {
        assert_eq!(classify(&schedule(10, 0, false)), ScheduleStatus::Full);
        assert_eq!(classify(&schedule(10, -1, false)), ScheduleStatus::Full);
    }

    #[test]
    fn test_limited_at_twenty_percent_threshold() {
        // capacity 10 -> threshold ceil(2.0) = 2
        assert_eq!(classify(&schedule(10, 2, false)), ScheduleStatus::Limited);
        assert_eq!(classify(&schedule(10, 3, false)), ScheduleStatus::Available);

        // capacity 7 -> threshold ceil(1.4) = 2
        assert_eq!(classify(&schedule(7, 2, false)), ScheduleStatus::Limited);
        assert_eq!(classify(&schedule(7, 3, false)), ScheduleStatus::Available);

        // A single-seat class is LIMITED until it is FULL.
        assert_eq!(classify(&schedule(1, 1, false)), ScheduleStatus::Limited);
    }

    #[test]
    fn test_available_with_plenty_of_seats() {
        assert_eq!(classify(&schedule(20, 20, false)), ScheduleStatus::Available);
    }
}
