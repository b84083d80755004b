use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::PgStore;
use crate::error::StoreError;
use crate::models::{
    AttendanceRecord, CreateNotificationReq, MarkAttendanceReq, Notification, ProgressRecord,
    ProgressUpdate,
};
use crate::progress;

/// Backing store for progress, attendance and notifications.
///
/// Both backends honour the same uniqueness keys: one progress row per
/// (user, lesson) and one attendance row per (user, session, date).
#[derive(Clone)]
pub enum Store {
    Memory(MemoryStore),
    Postgres(PgStore),
}

impl Store {
    pub fn memory() -> Self {
        Store::Memory(MemoryStore::default())
    }

    pub async fn upsert_progress(
        &self,
        user_id: Uuid,
        update: &ProgressUpdate,
    ) -> Result<ProgressRecord, StoreError> {
        match self {
            Store::Memory(m) => Ok(m.upsert_progress(user_id, update).await),
            Store::Postgres(pg) => pg.upsert_progress(user_id, update).await,
        }
    }

    pub async fn progress_by_user(&self, user_id: Uuid) -> Result<Vec<ProgressRecord>, StoreError> {
        match self {
            Store::Memory(m) => Ok(m.progress_by_user(user_id).await),
            Store::Postgres(pg) => pg.progress_by_user(user_id).await,
        }
    }

    pub async fn upsert_attendance(
        &self,
        req: &MarkAttendanceReq,
        marked_by: Uuid,
    ) -> Result<AttendanceRecord, StoreError> {
        match self {
            Store::Memory(m) => Ok(m.upsert_attendance(req, marked_by).await),
            Store::Postgres(pg) => pg.upsert_attendance(req, marked_by).await,
        }
    }

    pub async fn attendance_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        match self {
            Store::Memory(m) => Ok(m.attendance_by_user(user_id).await),
            Store::Postgres(pg) => pg.attendance_by_user(user_id).await,
        }
    }

    pub async fn create_notification(
        &self,
        req: &CreateNotificationReq,
        created_by: Uuid,
    ) -> Result<Notification, StoreError> {
        match self {
            Store::Memory(m) => Ok(m.create_notification(req, created_by).await),
            Store::Postgres(pg) => pg.create_notification(req, created_by).await,
        }
    }

    pub async fn notifications(&self) -> Result<Vec<Notification>, StoreError> {
        match self {
            Store::Memory(m) => Ok(m.notifications().await),
            Store::Postgres(pg) => pg.notifications().await,
        }
    }

    pub async fn find_notification(&self, id: Uuid) -> Result<Option<Notification>, StoreError> {
        match self {
            Store::Memory(m) => Ok(m.find_notification(id).await),
            Store::Postgres(pg) => pg.find_notification(id).await,
        }
    }

    pub async fn mark_notification_read(
        &self,
        id: Uuid,
    ) -> Result<Option<Notification>, StoreError> {
        match self {
            Store::Memory(m) => Ok(m.mark_notification_read(id).await),
            Store::Postgres(pg) => pg.mark_notification_read(id).await,
        }
    }

    pub async fn delete_notification(&self, id: Uuid) -> Result<bool, StoreError> {
        match self {
            Store::Memory(m) => Ok(m.delete_notification(id).await),
            Store::Postgres(pg) => pg.delete_notification(id).await,
        }
    }
}

#[derive(Default)]
struct Tables {
    progress: HashMap<(Uuid, Uuid), ProgressRecord>,
    attendance: HashMap<(Uuid, Uuid, NaiveDate), AttendanceRecord>,
    notifications: HashMap<Uuid, Notification>,
}

/// Process-local store. Each upsert runs under a single write lock.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    async fn upsert_progress(&self, user_id: Uuid, update: &ProgressUpdate) -> ProgressRecord {
        let mut t = self.inner.write().await;
        let key = (user_id, update.lesson_id);
        let existing = t.progress.remove(&key);
        let rec = progress::merge(existing, user_id, update, Utc::now());
        t.progress.insert(key, rec.clone());
        rec
    }

    async fn progress_by_user(&self, user_id: Uuid) -> Vec<ProgressRecord> {
        let t = self.inner.read().await;
        let mut out: Vec<_> = t
            .progress
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        out.sort_by_key(|r| r.created_at);
        out
    }

    async fn upsert_attendance(&self, req: &MarkAttendanceReq, marked_by: Uuid) -> AttendanceRecord {
        let now = Utc::now();
        let mut t = self.inner.write().await;
        let rec = t
            .attendance
            .entry((req.user_id, req.session_id, req.date))
            .and_modify(|r| {
                r.status = req.status;
                r.notes = req.notes.clone();
                r.marked_by = marked_by;
                r.updated_at = now;
            })
            .or_insert_with(|| AttendanceRecord {
                id: Uuid::new_v4(),
                user_id: req.user_id,
                session_id: req.session_id,
                date: req.date,
                status: req.status,
                notes: req.notes.clone(),
                marked_by,
                created_at: now,
                updated_at: now,
            });
        rec.clone()
    }

    async fn attendance_by_user(&self, user_id: Uuid) -> Vec<AttendanceRecord> {
        let t = self.inner.read().await;
        let mut out: Vec<_> = t
            .attendance
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        out.sort_by_key(|r| (r.date, r.created_at));
        out
    }

    async fn create_notification(&self, req: &CreateNotificationReq, created_by: Uuid) -> Notification {
        let n = Notification {
            id: Uuid::new_v4(),
            title: req.title.clone(),
            message: req.message.clone(),
            notification_type: req.notification_type,
            target_role: req.target_role,
            target_stage: req.target_stage.clone(),
            target_level: req.target_level.clone(),
            target_user_id: req.target_user_id,
            read: false,
            created_by,
            created_at: Utc::now(),
        };
        self.inner.write().await.notifications.insert(n.id, n.clone());
        n
    }

    async fn notifications(&self) -> Vec<Notification> {
        self.inner.read().await.notifications.values().cloned().collect()
    }

    async fn find_notification(&self, id: Uuid) -> Option<Notification> {
        self.inner.read().await.notifications.get(&id).cloned()
    }

    async fn mark_notification_read(&self, id: Uuid) -> Option<Notification> {
        let mut t = self.inner.write().await;
        let n = t.notifications.get_mut(&id)?;
        n.read = true;
        Some(n.clone())
    }

    async fn delete_notification(&self, id: Uuid) -> bool {
        self.inner.write().await.notifications.remove(&id).is_some()
    }
}
