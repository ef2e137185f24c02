use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::service::ScheduleWithStatus;

/// Separates single-schedule keys from composite range keys; invalidation
/// drops every key containing it.
const RANGE_DELIMITER: char = '|';

/// What a cache entry holds: one classified schedule or a range listing.
#[derive(Debug, Clone)]
pub enum CachedPayload {
    One(ScheduleWithStatus),
    Many(Vec<ScheduleWithStatus>),
}

/// Process-local, time-bounded memoization over schedule reads.
///
/// One global populated-at timestamp governs the whole map: the first `put`
/// after a clear opens the TTL window for every key until it elapses. An
/// elapsed window flushes lazily on the next lookup, so the following `put`
/// opens a fresh one.
///
/// Best-effort only. Admission and cancellation decisions never consult
/// this cache; they read the store directly.
pub struct AvailabilityCache {
    ttl: Duration,
    inner: Mutex<CacheInner>,
}

#[derive(Default)]
struct CacheInner {
    populated_at: Option<DateTime<Utc>>,
    entries: HashMap<String, CachedPayload>,
}

impl AvailabilityCache {
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            ttl: Duration::seconds(ttl_seconds as i64),
            inner: Mutex::new(CacheInner::default()),
        }
    }

    pub fn schedule_key(schedule_id: Uuid) -> String {
        schedule_id.to_string()
    }

    pub fn range_key(start: DateTime<Utc>, end: DateTime<Utc>, class_id: Option<Uuid>) -> String {
        let class_part = class_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "all".to_string());
        format!("{}|{}|{}", start.timestamp(), end.timestamp(), class_part)
    }

    pub fn get(&self, key: &str) -> Option<CachedPayload> {
        let mut inner = self.inner.lock().unwrap();
        let populated_at = inner.populated_at?;
        if Utc::now() - populated_at >= self.ttl {
            inner.entries.clear();
            inner.populated_at = None;
            return None;
        }
        inner.entries.get(key).cloned()
    }

    pub fn put(&self, key: String, payload: CachedPayload) {
        let mut inner = self.inner.lock().unwrap();
        if inner.populated_at.is_none() {
            inner.populated_at = Some(Utc::now());
        }
        inner.entries.insert(key, payload);
    }

    /// Drop the schedule's own key plus every range key. A changed schedule
    /// may appear in any date-range listing, so range keys go wholesale.
    pub fn invalidate(&self, schedule_id: Uuid) {
        let key = Self::schedule_key(schedule_id);
        let mut inner = self.inner.lock().unwrap();
        inner
            .entries
            .retain(|k, _| k != &key && !k.contains(RANGE_DELIMITER));
        debug!(%schedule_id, "availability cache invalidated");
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.entries.clear();
        inner.populated_at = None;
    }
}
