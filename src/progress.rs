use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{ProgressRecord, ProgressUpdate};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressStats {
    pub total_lessons: usize,
    pub completed_lessons: usize,
    pub completion_rate: f64,
    pub average_score: f64,
    pub total_time_spent: i64,
}

/// Summarise one user's lesson progress. An empty slice yields all zeros.
pub fn aggregate(records: &[ProgressRecord]) -> ProgressStats {
    let total_lessons = records.len();
    let completed_lessons = records.iter().filter(|r| r.completed).count();

    let (score_sum, scored) = records
        .iter()
        .filter_map(|r| r.score)
        .fold((0.0, 0usize), |(sum, n), s| (sum + s, n + 1));

    ProgressStats {
        total_lessons,
        completed_lessons,
        completion_rate: percent(completed_lessons, total_lessons),
        average_score: if scored == 0 { 0.0 } else { score_sum / scored as f64 },
        total_time_spent: records
            .iter()
            .fold(0i64, |acc, r| acc.saturating_add(r.time_spent)),
    }
}

pub(crate) fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 * 100.0 / whole as f64
}

/// Create-or-update for a (user, lesson) pair.
///
/// Fields missing from `update` keep their stored value. `completed_at` is
/// stamped on the first transition to completed and left alone afterwards.
pub fn merge(
    existing: Option<ProgressRecord>,
    user_id: Uuid,
    update: &ProgressUpdate,
    now: DateTime<Utc>,
) -> ProgressRecord {
    let mut rec = existing.unwrap_or_else(|| ProgressRecord {
        id: Uuid::new_v4(),
        user_id,
        lesson_id: update.lesson_id,
        completed: false,
        score: None,
        time_spent: 0,
        completed_at: None,
        created_at: now,
        updated_at: now,
    });

    if let Some(completed) = update.completed {
        if completed && !rec.completed && rec.completed_at.is_none() {
            rec.completed_at = Some(now);
        }
        rec.completed = completed;
    }
    if update.score.is_some() {
        rec.score = update.score;
    }
    if let Some(time_spent) = update.time_spent {
        rec.time_spent = time_spent;
    }
    rec.updated_at = now;
    rec
}
