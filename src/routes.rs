use axum::{
    extract::{FromRef, FromRequest, FromRequestParts, State},
    routing::{delete, get, patch, post},
    Json, Router,
};
use http::StatusCode;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    attendance::{self, AttendanceStats, DateRange},
    auth::{AuthUser, JwtKey, Staff},
    error::AppError,
    models::*,
    notifications,
    progress::{self, ProgressStats},
    store::Store,
};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub store: Store,
    pub jwt: JwtKey,
}

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
struct AppJson<T>(T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
struct AppQuery<T>(T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
struct AppPath<T>(T);

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/me", get(me))
        // progress
        .route("/api/progress", post(upsert_progress))
        .route("/api/progress/my-progress", get(my_progress))
        .route("/api/progress/my-stats", get(my_progress_stats))
        .route("/api/progress/users/:user_id/stats", get(user_progress_stats))
        // attendance
        .route("/api/attendance", post(mark_attendance))
        .route("/api/attendance/my-attendance", get(my_attendance))
        .route("/api/attendance/my-stats", get(my_attendance_stats))
        .route("/api/attendance/users/:user_id/stats", get(user_attendance_stats))
        // notifications
        .route("/api/notifications", post(create_notification))
        .route("/api/notifications/my-notifications", get(my_notifications))
        .route("/api/notifications/unread-count", get(unread_count))
        .route("/api/notifications/:id/read", patch(mark_read))
        .route("/api/notifications/:id", delete(delete_notification))
        .with_state(state)
}

async fn me(AuthUser(user): AuthUser) -> Json<User> {
    Json(user)
}

// --- progress ---

async fn upsert_progress(
    State(store): State<Store>,
    AuthUser(user): AuthUser,
    AppJson(req): AppJson<ProgressUpdate>,
) -> Result<Json<ProgressRecord>, AppError> {
    req.validate()?;
    Ok(Json(store.upsert_progress(user.id, &req).await?))
}

async fn my_progress(
    State(store): State<Store>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<ProgressRecord>>, AppError> {
    Ok(Json(store.progress_by_user(user.id).await?))
}

async fn my_progress_stats(
    State(store): State<Store>,
    AuthUser(user): AuthUser,
) -> Result<Json<ProgressStats>, AppError> {
    let rows = store.progress_by_user(user.id).await?;
    Ok(Json(progress::aggregate(&rows)))
}

async fn user_progress_stats(
    State(store): State<Store>,
    _staff: Staff,
    AppPath(user_id): AppPath<Uuid>,
) -> Result<Json<ProgressStats>, AppError> {
    let rows = store.progress_by_user(user_id).await?;
    Ok(Json(progress::aggregate(&rows)))
}

// --- attendance ---

async fn mark_attendance(
    State(store): State<Store>,
    Staff(marker): Staff,
    AppJson(req): AppJson<MarkAttendanceReq>,
) -> Result<Json<AttendanceRecord>, AppError> {
    Ok(Json(store.upsert_attendance(&req, marker.id).await?))
}

async fn my_attendance(
    State(store): State<Store>,
    AuthUser(user): AuthUser,
    AppQuery(range): AppQuery<DateRange>,
) -> Result<Json<Vec<AttendanceRecord>>, AppError> {
    range.validate()?;
    let rows = store.attendance_by_user(user.id).await?;
    Ok(Json(attendance::filter(&rows, &range).cloned().collect()))
}

async fn my_attendance_stats(
    State(store): State<Store>,
    AuthUser(user): AuthUser,
    AppQuery(range): AppQuery<DateRange>,
) -> Result<Json<AttendanceStats>, AppError> {
    attendance_stats_for(&store, user.id, range).await
}

async fn user_attendance_stats(
    State(store): State<Store>,
    _staff: Staff,
    AppPath(user_id): AppPath<Uuid>,
    AppQuery(range): AppQuery<DateRange>,
) -> Result<Json<AttendanceStats>, AppError> {
    attendance_stats_for(&store, user_id, range).await
}

async fn attendance_stats_for(
    store: &Store,
    user_id: Uuid,
    range: DateRange,
) -> Result<Json<AttendanceStats>, AppError> {
    range.validate()?;
    let rows = store.attendance_by_user(user_id).await?;
    Ok(Json(attendance::aggregate(&rows, &range)))
}

// --- notifications ---

async fn create_notification(
    State(store): State<Store>,
    Staff(author): Staff,
    AppJson(req): AppJson<CreateNotificationReq>,
) -> Result<(StatusCode, Json<Notification>), AppError> {
    req.validate()?;
    let n = store.create_notification(&req, author.id).await?;
    tracing::info!(id = %n.id, created_by = %author.id, "notification created");
    Ok((StatusCode::CREATED, Json(n)))
}

async fn my_notifications(
    State(store): State<Store>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Notification>>, AppError> {
    let all = store.notifications().await?;
    Ok(Json(notifications::visible_for(&user, &all)))
}

#[derive(Serialize)]
struct UnreadCount {
    count: usize,
}

async fn unread_count(
    State(store): State<Store>,
    AuthUser(user): AuthUser,
) -> Result<Json<UnreadCount>, AppError> {
    let all = store.notifications().await?;
    let count = all
        .iter()
        .filter(|n| !n.read && notifications::is_visible(&user, n))
        .count();
    Ok(Json(UnreadCount { count }))
}

async fn mark_read(
    State(store): State<Store>,
    AuthUser(user): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Notification>, AppError> {
    let not_found = || AppError::NotFound(format!("notification {id} not found"));

    match store.find_notification(id).await? {
        Some(n) if notifications::is_visible(&user, &n) => {}
        _ => return Err(not_found()),
    }
    let n = store.mark_notification_read(id).await?.ok_or_else(not_found)?;
    Ok(Json(n))
}

async fn delete_notification(
    State(store): State<Store>,
    auth: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, AppError> {
    auth.require(&[Role::Admin])?;
    if store.delete_notification(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("notification {id} not found")))
    }
}
