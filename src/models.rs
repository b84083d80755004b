use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(sqlx::Type, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Servant,
    Deacon,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Servant => "servant",
            Role::Deacon => "deacon",
        }
    }
}

#[derive(sqlx::Type, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Excused,
}

#[derive(sqlx::Type, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    #[default]
    Info,
    Warning,
    Success,
    Error,
}

/// The caller as seen by the components: identity plus grade placement.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub role: Role,
    pub stage: Option<String>,
    pub level: Option<String>,
}

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub lesson_id: Uuid,
    pub completed: bool,
    pub score: Option<f64>,
    pub time_spent: i64,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub notes: Option<String>,
    pub marked_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "kind")]
    pub notification_type: NotificationType,
    pub target_role: Option<Role>,
    pub target_stage: Option<String>,
    pub target_level: Option<String>,
    pub target_user_id: Option<Uuid>,
    pub read: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

// --- request payloads ---

/// Upper bound for a single `timeSpent` value: one year in seconds.
pub const MAX_TIME_SPENT: i64 = 365 * 24 * 60 * 60;

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub lesson_id: Uuid,
    pub completed: Option<bool>,
    pub score: Option<f64>,
    pub time_spent: Option<i64>,
}

impl ProgressUpdate {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(score) = self.score {
            if !score.is_finite() || !(0.0..=100.0).contains(&score) {
                return Err(AppError::Validation(format!(
                    "score must be between 0 and 100, got {score}"
                )));
            }
        }
        if let Some(time_spent) = self.time_spent {
            if !(0..=MAX_TIME_SPENT).contains(&time_spent) {
                return Err(AppError::Validation(format!(
                    "timeSpent must be between 0 and {MAX_TIME_SPENT}, got {time_spent}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MarkAttendanceReq {
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub notes: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotificationReq {
    pub title: String,
    pub message: String,
    #[serde(rename = "type", default)]
    pub notification_type: NotificationType,
    pub target_role: Option<Role>,
    pub target_stage: Option<String>,
    pub target_level: Option<String>,
    pub target_user_id: Option<Uuid>,
}

impl CreateNotificationReq {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::Validation("title is required".into()));
        }
        if self.message.trim().is_empty() {
            return Err(AppError::Validation("message is required".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_outside_percent_range_is_rejected() {
        let mut req = ProgressUpdate {
            lesson_id: Uuid::new_v4(),
            score: Some(100.5),
            ..Default::default()
        };
        assert!(matches!(req.validate(), Err(AppError::Validation(_))));

        req.score = Some(f64::NAN);
        assert!(req.validate().is_err());

        req.score = Some(0.0);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn negative_time_spent_is_rejected() {
        let req = ProgressUpdate {
            lesson_id: Uuid::new_v4(),
            time_spent: Some(-1),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn enums_use_lowercase_wire_names() {
        assert_eq!(serde_json::from_str::<Role>(r#""deacon""#).unwrap(), Role::Deacon);
        assert_eq!(
            serde_json::from_str::<AttendanceStatus>(r#""late""#).unwrap(),
            AttendanceStatus::Late
        );
        assert!(serde_json::from_str::<Role>(r#""teacher""#).is_err());
        assert_eq!(
            serde_json::to_string(&NotificationType::Warning).unwrap(),
            r#""warning""#
        );
    }

    #[test]
    fn time_spent_above_one_year_is_rejected() {
        let mut req = ProgressUpdate {
            lesson_id: Uuid::new_v4(),
            time_spent: Some(i64::MAX),
            ..Default::default()
        };
        assert!(matches!(req.validate(), Err(AppError::Validation(_))));

        req.time_spent = Some(MAX_TIME_SPENT);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn notification_type_defaults_to_info() {
        let req: CreateNotificationReq =
            serde_json::from_str(r#"{"title":"t","message":"m"}"#).unwrap();
        assert_eq!(req.notification_type, NotificationType::Info);
        assert!(req.target_role.is_none());
    }
}
