use axum::http::{Method, StatusCode};
use church_school_api::models::Role;
use serde_json::json;
use uuid::Uuid;

mod common;
use common::*;

async fn mark(app: &axum::Router, token: &str, user_id: Uuid, session: Uuid, date: &str, status: &str) -> StatusCode {
    let (code, _) = call(
        app,
        Method::POST,
        "/api/attendance",
        Some(token),
        Some(json!({
            "userId": user_id,
            "sessionId": session,
            "date": date,
            "status": status,
        })),
    )
    .await;
    code
}

#[tokio::test]
async fn only_staff_may_mark_attendance() {
    let app = create_test_app();
    let deacon = user(Role::Deacon, None, None);
    let status = mark(&app, &token_for(&deacon), deacon.id, Uuid::new_v4(), "2024-03-01", "present").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn resubmission_keeps_a_single_record() {
    let app = create_test_app();
    let servant = token_for(&user(Role::Servant, None, None));
    let deacon = user(Role::Deacon, None, None);
    let session = Uuid::new_v4();

    assert_eq!(mark(&app, &servant, deacon.id, session, "2024-03-01", "absent").await, StatusCode::OK);
    assert_eq!(mark(&app, &servant, deacon.id, session, "2024-03-01", "present").await, StatusCode::OK);

    let (_, rows) = call(
        &app,
        Method::GET,
        "/api/attendance/my-attendance",
        Some(&token_for(&deacon)),
        None,
    )
    .await;
    let rows = rows.as_array().cloned().unwrap_or_default();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["status"], "present");
}

#[tokio::test]
async fn stats_with_and_without_range() {
    let app = create_test_app();
    let servant_user = user(Role::Servant, None, None);
    let servant = token_for(&servant_user);
    let deacon = user(Role::Deacon, None, None);

    for day in 1..=9 {
        let date = format!("2024-03-{day:02}");
        mark(&app, &servant, deacon.id, Uuid::new_v4(), &date, "present").await;
    }
    mark(&app, &servant, deacon.id, Uuid::new_v4(), "2024-03-10", "late").await;

    let token = token_for(&deacon);
    let (status, stats) = call(&app, Method::GET, "/api/attendance/my-stats", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalSessions"], 10);
    assert_eq!(stats["presentSessions"], 9);
    assert_eq!(stats["lateSessions"], 1);
    assert_eq!(stats["absentSessions"], 0);
    assert_eq!(stats["attendanceRate"], 90.0);

    let (_, ranged) = call(
        &app,
        Method::GET,
        "/api/attendance/my-stats?startDate=2024-03-09&endDate=2024-03-10",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(ranged["totalSessions"], 2);
    assert_eq!(ranged["attendanceRate"], 50.0);

    let uri = format!("/api/attendance/users/{}/stats?startDate=&endDate=2024-03-01", deacon.id);
    let (status, staff_view) = call(&app, Method::GET, &uri, Some(&servant), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(staff_view["totalSessions"], 1);
}

#[tokio::test]
async fn inverted_range_is_rejected() {
    let app = create_test_app();
    let token = token_for(&user(Role::Deacon, None, None));
    let (status, body) = call(
        &app,
        Method::GET,
        "/api/attendance/my-stats?startDate=2024-04-01&endDate=2024-03-01",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn unknown_status_is_rejected() {
    let app = create_test_app();
    let servant = token_for(&user(Role::Servant, None, None));
    let status = mark(&app, &servant, Uuid::new_v4(), Uuid::new_v4(), "2024-03-01", "sleeping").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deacon_with_malformed_body_is_forbidden_not_invalid() {
    let app = create_test_app();
    let deacon = token_for(&user(Role::Deacon, None, None));
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/attendance",
        Some(&deacon),
        Some(json!({ "status": "sleeping" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
}
