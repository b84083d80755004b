use anyhow::{Context, Result};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
    AttendanceRecord, CreateNotificationReq, MarkAttendanceReq, Notification, ProgressRecord,
    ProgressUpdate,
};

pub type Db = Pool<Postgres>;

pub async fn connect(url: &str) -> Result<Db> {
    let pool = Pool::<Postgres>::connect(url)
        .await
        .context("connecting to DATABASE_URL")?;
    // crate-relative path for sqlx migrations
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

const PROGRESS_COLS: &str =
    "id, user_id, lesson_id, completed, score, time_spent, completed_at, created_at, updated_at";
const ATTENDANCE_COLS: &str =
    "id, user_id, session_id, date, status, notes, marked_by, created_at, updated_at";
const NOTIFICATION_COLS: &str = "id, title, message, kind, target_role, target_stage, \
     target_level, target_user_id, read, created_by, created_at";

/// Postgres backend. Upserts rely on the unique keys declared in the
/// migrations so concurrent writers never produce duplicate rows.
#[derive(Clone)]
pub struct PgStore {
    db: Db,
}

impl PgStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn upsert_progress(
        &self,
        user_id: Uuid,
        update: &ProgressUpdate,
    ) -> Result<ProgressRecord, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO lesson_progress (id, user_id, lesson_id, completed, score, time_spent, completed_at)
            VALUES ($1, $2, $3, COALESCE($4, false), $5, COALESCE($6, 0),
                    CASE WHEN $4 IS TRUE THEN now() END)
            ON CONFLICT (user_id, lesson_id) DO UPDATE SET
                completed    = COALESCE($4, lesson_progress.completed),
                score        = COALESCE($5, lesson_progress.score),
                time_spent   = COALESCE($6, lesson_progress.time_spent),
                completed_at = CASE
                    WHEN $4 IS TRUE
                         AND NOT lesson_progress.completed
                         AND lesson_progress.completed_at IS NULL
                    THEN now()
                    ELSE lesson_progress.completed_at
                END,
                updated_at   = now()
            RETURNING {PROGRESS_COLS}
            "#
        );
        let rec = sqlx::query_as::<_, ProgressRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(update.lesson_id)
            .bind(update.completed)
            .bind(update.score)
            .bind(update.time_spent)
            .fetch_one(&self.db)
            .await?;
        tracing::debug!(%user_id, lesson_id = %rec.lesson_id, "progress upserted");
        Ok(rec)
    }

    pub async fn progress_by_user(&self, user_id: Uuid) -> Result<Vec<ProgressRecord>, StoreError> {
        let sql = format!(
            "SELECT {PROGRESS_COLS} FROM lesson_progress WHERE user_id = $1 ORDER BY created_at"
        );
        Ok(sqlx::query_as::<_, ProgressRecord>(&sql)
            .bind(user_id)
            .fetch_all(&self.db)
            .await?)
    }

    pub async fn upsert_attendance(
        &self,
        req: &MarkAttendanceReq,
        marked_by: Uuid,
    ) -> Result<AttendanceRecord, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO attendance (id, user_id, session_id, date, status, notes, marked_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id, session_id, date) DO UPDATE SET
                status     = EXCLUDED.status,
                notes      = EXCLUDED.notes,
                marked_by  = EXCLUDED.marked_by,
                updated_at = now()
            RETURNING {ATTENDANCE_COLS}
            "#
        );
        let rec = sqlx::query_as::<_, AttendanceRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(req.user_id)
            .bind(req.session_id)
            .bind(req.date)
            .bind(req.status)
            .bind(req.notes.as_deref())
            .bind(marked_by)
            .fetch_one(&self.db)
            .await?;
        tracing::debug!(user_id = %req.user_id, session_id = %req.session_id, "attendance upserted");
        Ok(rec)
    }

    pub async fn attendance_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLS} FROM attendance WHERE user_id = $1 ORDER BY date, created_at"
        );
        Ok(sqlx::query_as::<_, AttendanceRecord>(&sql)
            .bind(user_id)
            .fetch_all(&self.db)
            .await?)
    }

    pub async fn create_notification(
        &self,
        req: &CreateNotificationReq,
        created_by: Uuid,
    ) -> Result<Notification, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO notifications
                (id, title, message, kind, target_role, target_stage, target_level, target_user_id, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {NOTIFICATION_COLS}
            "#
        );
        Ok(sqlx::query_as::<_, Notification>(&sql)
            .bind(Uuid::new_v4())
            .bind(&req.title)
            .bind(&req.message)
            .bind(req.notification_type)
            .bind(req.target_role)
            .bind(req.target_stage.as_deref())
            .bind(req.target_level.as_deref())
            .bind(req.target_user_id)
            .bind(created_by)
            .fetch_one(&self.db)
            .await?)
    }

    pub async fn notifications(&self) -> Result<Vec<Notification>, StoreError> {
        let sql = format!(
            "SELECT {NOTIFICATION_COLS} FROM notifications ORDER BY created_at DESC, id DESC"
        );
        Ok(sqlx::query_as::<_, Notification>(&sql)
            .fetch_all(&self.db)
            .await?)
    }

    pub async fn find_notification(&self, id: Uuid) -> Result<Option<Notification>, StoreError> {
        let sql = format!("SELECT {NOTIFICATION_COLS} FROM notifications WHERE id = $1");
        Ok(sqlx::query_as::<_, Notification>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?)
    }

    pub async fn mark_notification_read(
        &self,
        id: Uuid,
    ) -> Result<Option<Notification>, StoreError> {
        let sql = format!(
            "UPDATE notifications SET read = true WHERE id = $1 RETURNING {NOTIFICATION_COLS}"
        );
        Ok(sqlx::query_as::<_, Notification>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?)
    }

    pub async fn delete_notification(&self, id: Uuid) -> Result<bool, StoreError> {
        let res = sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
