//! In-process session records with expiry sweeping.
//!
//! Loads already ignore expired records; the sweep reclaims their memory so
//! abandoned sessions do not accumulate for the life of the process.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use time::OffsetDateTime;
use tower_sessions::{
    session::{Id, Record},
    session_store::{self, ExpiredDeletion},
    SessionStore,
};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct SessionRecords {
    records: Arc<Mutex<HashMap<Id, Record>>>,
}

impl SessionRecords {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> session_store::Result<MutexGuard<'_, HashMap<Id, Record>>> {
        self.records
            .lock()
            .map_err(|e| session_store::Error::Backend(format!("Session records poisoned: {}", e)))
    }

    pub fn len(&self) -> usize {
        self.records().map(|records| records.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sweeps expired records every `period` on a background task.
    pub fn spawn_purge(self, period: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                if let Err(e) = self.delete_expired().await {
                    warn!("Failed to purge expired sessions: {}", e);
                }
            }
        })
    }
}

fn is_active(record: &Record, now: OffsetDateTime) -> bool {
    record.expiry_date > now
}

#[async_trait]
impl SessionStore for SessionRecords {
    async fn save(&self, record: &Record) -> session_store::Result<()> {
        self.records()?.insert(record.id, record.clone());
        Ok(())
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        let now = OffsetDateTime::now_utc();
        Ok(self
            .records()?
            .get(session_id)
            .filter(|record| is_active(record, now))
            .cloned())
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        self.records()?.remove(session_id);
        Ok(())
    }
}

#[async_trait]
impl ExpiredDeletion for SessionRecords {
    async fn delete_expired(&self) -> session_store::Result<()> {
        let now = OffsetDateTime::now_utc();
        let mut records = self.records()?;

        let before = records.len();
        records.retain(|_, record| is_active(record, now));

        let purged = before - records.len();
        if purged > 0 {
            debug!(purged, "Expired sessions purged");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(expires_in: time::Duration) -> Record {
        Record {
            id: Id::default(),
            data: Default::default(),
            expiry_date: OffsetDateTime::now_utc() + expires_in,
        }
    }

    #[tokio::test]
    async fn test_expired_record_is_not_loaded() {
        let store = SessionRecords::new();
        let live = record(time::Duration::hours(1));
        let stale = record(time::Duration::hours(-1));
        store.save(&live).await.unwrap();
        store.save(&stale).await.unwrap();

        let loaded = store.load(&live.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, live.id);
        assert!(store.load(&stale.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_purge_drops_only_expired_records() {
        let store = SessionRecords::new();
        let live = record(time::Duration::hours(1));
        store.save(&live).await.unwrap();
        store.save(&record(time::Duration::hours(-1))).await.unwrap();
        store.save(&record(time::Duration::minutes(-5))).await.unwrap();
        assert_eq!(store.len(), 3);

        store.delete_expired().await.unwrap();

        assert_eq!(store.len(), 1);
        assert!(store.load(&live.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_removes_record() {
        let store = SessionRecords::new();
        let live = record(time::Duration::hours(1));
        store.save(&live).await.unwrap();

        store.delete(&live.id).await.unwrap();

        assert!(store.is_empty());
    }
}
