use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kinds of classes on the timetable. The kind feeds refund modifiers, so
/// the set is closed on purpose.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClassType {
    Regular,
    Special,
    Workshop,
    Event,
}

impl ClassType {
    /// Parse a stored class-type code. Unknown codes return `None`; the
    /// caller decides (and logs) any fallback.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "REGULAR" => Some(Self::Regular),
            "SPECIAL" => Some(Self::Special),
            "WORKSHOP" => Some(Self::Workshop),
            "EVENT" => Some(Self::Event),
            _ => None,
        }
    }
}

/// One concrete time slot of a class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassSchedule {
    pub id: Uuid,
    pub class_id: Uuid,
    pub class_type: ClassType,
    pub start_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub capacity: i32,
    pub remaining_seats: i32,
    pub is_cancelled: bool,
    pub cancellation_reason: Option<String>,
}

impl ClassSchedule {
    pub fn new(
        class_id: Uuid,
        class_type: ClassType,
        start_at: DateTime<Utc>,
        duration_minutes: i32,
        capacity: i32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            class_id,
            class_type,
            start_at,
            duration_minutes,
            capacity,
            remaining_seats: capacity,
            is_cancelled: false,
            cancellation_reason: None,
        }
    }

    /// Whether the class start time is already behind us.
    pub fn has_started(&self) -> bool {
        Utc::now() >= self.start_at
    }
}
