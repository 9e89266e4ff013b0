//! Run memoization keyed by query parameters and collector settings.

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;

use crate::models::CourseRecord;

pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);
pub const DEFAULT_MAX_ENTRIES: u64 = 100;

/// Completed datasets keyed by a canonical run key, normally
/// [`Collector::cache_key`](crate::collect::Collector::cache_key).
///
/// Entries expire a fixed time after insertion; there is no other
/// invalidation. Clones share the same storage.
#[derive(Clone)]
pub struct DatasetCache {
    cache: Cache<String, Arc<Vec<CourseRecord>>>,
}

impl DatasetCache {
    pub fn new(ttl: Duration, max_entries: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();

        Self { cache }
    }

    pub fn get(&self, key: &str) -> Option<Arc<Vec<CourseRecord>>> {
        self.cache.get(key)
    }

    pub fn insert(&self, key: String, records: Vec<CourseRecord>) {
        self.cache.insert(key, Arc::new(records));
    }

    pub fn len(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}

impl Default for DatasetCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_MAX_ENTRIES)
    }
}

impl std::fmt::Debug for DatasetCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetCache")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CourseType;
    use crate::query::{build_query, QueryParameters};
    use chrono::NaiveDate;

    fn params(course_type: CourseType) -> QueryParameters {
        build_query(
            course_type,
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
        )
        .unwrap()
    }

    fn record(institution: &str) -> CourseRecord {
        CourseRecord::new(
            institution.to_string(),
            "Course".to_string(),
            "1".to_string(),
            "2025-03-04".to_string(),
            2,
            10,
        )
        .unwrap()
    }

    #[test]
    fn hit_ignores_page_number() {
        let cache = DatasetCache::default();
        let mut query = params(CourseType::All);
        cache.insert(query.cache_key(), vec![record("Inst A")]);
        query.page_number = 12;
        let hit = cache.get(&query.cache_key()).unwrap();
        assert_eq!(hit.len(), 1);
        assert_eq!(hit[0].institution, "Inst A");
    }

    #[test]
    fn different_parameters_miss() {
        let cache = DatasetCache::default();
        cache.insert(params(CourseType::All).cache_key(), vec![record("Inst A")]);
        assert!(cache.get(&params(CourseType::PackageRemote).cache_key()).is_none());
    }

    #[test]
    fn entries_expire_after_ttl() {
        let cache = DatasetCache::new(Duration::from_millis(50), 10);
        let key = params(CourseType::All).cache_key();
        cache.insert(key.clone(), vec![record("Inst A")]);
        assert!(cache.get(&key).is_some());
        std::thread::sleep(Duration::from_millis(120));
        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn clones_share_entries() {
        let cache = DatasetCache::default();
        let other = cache.clone();
        let key = params(CourseType::All).cache_key();
        cache.insert(key.clone(), vec![]);
        assert!(other.get(&key).is_some());
        assert_eq!(other.len(), 1);
    }
}
