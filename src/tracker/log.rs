use std::sync::Arc;

use tracing::warn;

use crate::{
    store::{KvStore, ENTRIES_KEY},
    tracker::entities::{seed_entries, TimeEntry},
    utils::clock::Clock,
};

/// The in-memory entry list plus its persistence. The list is authoritative
/// for the process lifetime; store failures are logged and swallowed so a
/// broken disk never blocks logging time.
pub struct TimeLog {
    entries: Vec<TimeEntry>,
    store: Arc<dyn KvStore>,
    clock: Box<dyn Clock>,
}

impl TimeLog {
    /// Loads the persisted entry list, falling back to the built-in seed when
    /// the key is absent or its content doesn't parse as an entry array.
    pub fn load(store: Arc<dyn KvStore>, clock: Box<dyn Clock>) -> Self {
        let entries = match store.get(ENTRIES_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<TimeEntry>>(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Stored entries were unreadable, starting from seed: {e}");
                    seed_entries(clock.time())
                }
            },
            Ok(None) => seed_entries(clock.time()),
            Err(e) => {
                warn!("Couldn't read stored entries, starting from seed: {e}");
                seed_entries(clock.time())
            }
        };

        Self {
            entries,
            store,
            clock,
        }
    }

    pub fn entries(&self) -> &[TimeEntry] {
        &self.entries
    }

    /// Appends a new entry with a fresh id and the current timestamp. The
    /// category id and duration are stored as given; validating them is the
    /// caller's job.
    pub fn add_entry(
        &mut self,
        category_id: String,
        duration_minutes: i64,
        description: String,
    ) -> &TimeEntry {
        let now = self.clock.time();
        let id = self.next_id(now.timestamp_millis());

        self.entries.push(TimeEntry {
            id,
            category_id,
            duration_minutes,
            description,
            date: now,
        });
        self.persist();

        self.entries.last().expect("entry was just pushed")
    }

    /// Removes the entry with the given id. Unknown ids are a no-op.
    pub fn delete_entry(&mut self, id: i64) {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        if self.entries.len() != before {
            self.persist();
        }
    }

    /// Ids come from the creation timestamp but must stay unique even when
    /// two entries land in the same millisecond.
    fn next_id(&self, timestamp_millis: i64) -> i64 {
        let max_existing = self.entries.iter().map(|e| e.id).max().unwrap_or(0);
        timestamp_millis.max(max_existing + 1)
    }

    fn persist(&self) {
        let serialized = match serde_json::to_string(&self.entries) {
            Ok(v) => v,
            Err(e) => {
                warn!("Couldn't serialize entries: {e}");
                return;
            }
        };
        if let Err(e) = self.store.set(ENTRIES_KEY, &serialized) {
            warn!("Couldn't persist entries, keeping in-memory state: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use tempfile::tempdir;
    use tokio::time::Instant;

    use crate::{
        store::{FileKvStore, KvStore, MockKvStore, ENTRIES_KEY},
        utils::clock::Clock,
    };

    use super::TimeLog;

    struct FixedClock(DateTime<Utc>);

    #[async_trait]
    impl Clock for FixedClock {
        fn time(&self) -> DateTime<Utc> {
            self.0
        }

        fn instant(&self) -> Instant {
            Instant::now()
        }

        async fn sleep_until(&self, _instant: Instant) {}
    }

    fn fixed_clock() -> Box<dyn Clock> {
        Box::new(FixedClock("2026-08-29T10:00:00Z".parse().unwrap()))
    }

    fn empty_store() -> Arc<dyn KvStore> {
        let mut store = MockKvStore::new();
        store.expect_get().returning(|_| Ok(None));
        store.expect_set().returning(|_, _| Ok(()));
        Arc::new(store)
    }

    #[test]
    fn fresh_log_starts_from_seed() {
        let log = TimeLog::load(empty_store(), fixed_clock());

        assert_eq!(log.entries().len(), 1);
        assert_eq!(log.entries()[0].category_id, "exercise");
        assert_eq!(log.entries()[0].duration_minutes, 45);
    }

    #[test]
    fn adds_survive_unrelated_deletes() {
        let mut log = TimeLog::load(empty_store(), fixed_clock());

        let first = log.add_entry("work".into(), 60, "focus block".into()).id;
        let second = log.add_entry("sleep".into(), 480, String::new()).id;
        let third = log.add_entry("unknown-cat".into(), -5, String::new()).id;

        log.delete_entry(second);
        log.delete_entry(987654);

        let ids: Vec<i64> = log.entries().iter().map(|e| e.id).collect();
        assert!(ids.contains(&first));
        assert!(ids.contains(&third));
        assert!(!ids.contains(&second));
    }

    #[test]
    fn ids_stay_unique_within_one_millisecond() {
        let mut log = TimeLog::load(empty_store(), fixed_clock());

        let a = log.add_entry("work".into(), 1, String::new()).id;
        let b = log.add_entry("work".into(), 2, String::new()).id;
        let c = log.add_entry("work".into(), 3, String::new()).id;

        assert!(a < b && b < c);
    }

    #[test]
    fn accepts_zero_and_negative_durations_as_given() {
        let mut log = TimeLog::load(empty_store(), fixed_clock());

        log.add_entry("work".into(), 0, String::new());
        let entry = log.add_entry("work".into(), -30, String::new());

        assert_eq!(entry.duration_minutes, -30);
    }

    #[test]
    fn malformed_stored_entries_fall_back_to_seed() {
        let mut store = MockKvStore::new();
        store
            .expect_get()
            .returning(|_| Ok(Some("{\"not\":\"an array\"}".into())));
        let log = TimeLog::load(Arc::new(store), fixed_clock());

        assert_eq!(log.entries().len(), 1);
        assert_eq!(log.entries()[0].description, "Morning run");
    }

    #[test]
    fn store_failures_do_not_lose_in_memory_entries() {
        let mut store = MockKvStore::new();
        store.expect_get().returning(|_| Ok(None));
        store
            .expect_set()
            .returning(|_, _| Err(anyhow::anyhow!("disk full")));
        let mut log = TimeLog::load(Arc::new(store), fixed_clock());

        log.add_entry("work".into(), 25, String::new());

        assert_eq!(log.entries().len(), 2);
    }

    #[test]
    fn entries_round_trip_through_a_real_store() -> Result<()> {
        let dir = tempdir()?;
        let store: Arc<dyn KvStore> = Arc::new(FileKvStore::new(dir.path().to_owned())?);

        let mut log = TimeLog::load(store.clone(), fixed_clock());
        log.delete_entry(4);
        let id = log.add_entry("learning".into(), 120, "rust book".into()).id;

        let reloaded = TimeLog::load(store.clone(), fixed_clock());
        assert_eq!(reloaded.entries().len(), 1);
        assert_eq!(reloaded.entries()[0].id, id);
        assert_eq!(reloaded.entries()[0].category_id, "learning");

        assert!(store.get(ENTRIES_KEY)?.is_some());
        Ok(())
    }
}
