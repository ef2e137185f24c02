use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fitgrid_core::repository::ScheduleRepository;
use fitgrid_core::StoreError;
use fitgrid_shared::ClassSchedule;

use crate::cache::{AvailabilityCache, CachedPayload};
use crate::classify::{classify, ScheduleStatus};

/// A schedule joined with its computed availability status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleWithStatus {
    pub schedule: ClassSchedule,
    pub status: ScheduleStatus,
}

/// Cache-assisted schedule reads for listing surfaces (calendar, search).
///
/// Admission and cancellation must not come through here: their decisions
/// read the repository directly, where the seat count is authoritative.
pub struct AvailabilityService {
    schedules: Arc<dyn ScheduleRepository>,
    cache: Arc<AvailabilityCache>,
}

impl AvailabilityService {
    pub fn new(schedules: Arc<dyn ScheduleRepository>, cache: Arc<AvailabilityCache>) -> Self {
        Self { schedules, cache }
    }

    pub async fn check_schedule_availability(
        &self,
        schedule_id: Uuid,
    ) -> Result<Option<ScheduleWithStatus>, StoreError> {
        let key = AvailabilityCache::schedule_key(schedule_id);
        if let Some(CachedPayload::One(hit)) = self.cache.get(&key) {
            return Ok(Some(hit));
        }

        let Some(schedule) = self.schedules.get_schedule(schedule_id).await? else {
            return Ok(None);
        };
        let status = classify(&schedule);
        let entry = ScheduleWithStatus { schedule, status };
        self.cache.put(key, CachedPayload::One(entry.clone()));
        Ok(Some(entry))
    }

    pub async fn schedules_availability(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        class_id: Option<Uuid>,
    ) -> Result<Vec<ScheduleWithStatus>, StoreError> {
        let key = AvailabilityCache::range_key(start, end, class_id);
        if let Some(CachedPayload::Many(hit)) = self.cache.get(&key) {
            return Ok(hit);
        }

        let schedules = self.schedules.schedules_in_range(start, end, class_id).await?;
        let entries: Vec<ScheduleWithStatus> = schedules
            .into_iter()
            .map(|schedule| {
                let status = classify(&schedule);
                ScheduleWithStatus { schedule, status }
            })
            .collect();
        self.cache.put(key, CachedPayload::Many(entries.clone()));
        Ok(entries)
    }

    pub fn invalidate_schedule(&self, schedule_id: Uuid) {
        self.cache.invalidate(schedule_id);
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use fitgrid_core::repository::ScheduleRepository;
    use fitgrid_shared::ClassType;
    use fitgrid_store::MemoryStore;

    fn schedule(start_in: Duration, capacity: i32) -> ClassSchedule {
        ClassSchedule::new(
            Uuid::new_v4(),
            ClassType::Regular,
            Utc::now() + start_in,
            60,
            capacity,
        )
    }

    fn service(store: Arc<MemoryStore>) -> AvailabilityService {
        AvailabilityService::new(store, Arc::new(AvailabilityCache::new(30)))
    }

    #[tokio::test]
    async fn test_single_read_is_cached() {
        let store = Arc::new(MemoryStore::new());
        let s = schedule(Duration::days(1), 10);
        let id = s.id;
        store.insert_schedule(s).await;
        let service = service(store.clone());

        let first = service.check_schedule_availability(id).await.unwrap().unwrap();
        assert_eq!(first.status, ScheduleStatus::Available);

        // Mutate the store behind the cache's back; the listing path may
        // serve the stale classification until TTL or invalidation.
        assert!(store.claim_seats(id, 10).await.unwrap());
        let second = service.check_schedule_availability(id).await.unwrap().unwrap();
        assert_eq!(second.status, ScheduleStatus::Available);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let store = Arc::new(MemoryStore::new());
        let s = schedule(Duration::days(1), 10);
        let id = s.id;
        store.insert_schedule(s).await;
        let service = service(store.clone());

        service.check_schedule_availability(id).await.unwrap();
        assert!(store.claim_seats(id, 10).await.unwrap());
        service.invalidate_schedule(id);

        let fresh = service.check_schedule_availability(id).await.unwrap().unwrap();
        assert_eq!(fresh.status, ScheduleStatus::Full);
    }

    #[tokio::test]
    async fn test_range_listing_classifies_each_schedule() {
        let store = Arc::new(MemoryStore::new());
        let class_id = Uuid::new_v4();

        let mut open = schedule(Duration::days(1), 10);
        open.class_id = class_id;
        let mut full = schedule(Duration::days(2), 5);
        full.class_id = class_id;
        full.remaining_seats = 0;
        let unrelated = schedule(Duration::days(3), 10);

        store.insert_schedule(open).await;
        store.insert_schedule(full).await;
        store.insert_schedule(unrelated).await;
        let service = service(store.clone());

        let start = Utc::now();
        let end = start + Duration::days(7);
        let listed = service
            .schedules_availability(start, end, Some(class_id))
            .await
            .unwrap();

        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].status, ScheduleStatus::Available);
        assert_eq!(listed[1].status, ScheduleStatus::Full);
    }

    #[tokio::test]
    async fn test_missing_schedule_is_not_cached() {
        let store = Arc::new(MemoryStore::new());
        let service = service(store.clone());
        let id = Uuid::new_v4();

        assert!(service.check_schedule_availability(id).await.unwrap().is_none());

        // Created after the miss; the next read must see it.
        let mut s = schedule(Duration::days(1), 10);
        s.id = id;
        store.insert_schedule(s).await;
        assert!(service.check_schedule_availability(id).await.unwrap().is_some());
    }
}
