use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, NoneAsEmptyString};

use crate::error::AppError;
use crate::models::{AttendanceRecord, AttendanceStatus};
use crate::progress::percent;

/// Inclusive date filter. A missing bound leaves that side open.
#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start_date: Option<NaiveDate>, end_date: Option<NaiveDate>) -> Self {
        Self { start_date, end_date }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) if start > end => Err(AppError::Validation(format!(
                "startDate {start} is after endDate {end}"
            ))),
            _ => Ok(()),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date.map_or(true, |s| date >= s) && self.end_date.map_or(true, |e| date <= e)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceStats {
    pub total_sessions: usize,
    pub present_sessions: usize,
    pub late_sessions: usize,
    pub absent_sessions: usize,
    pub excused_sessions: usize,
    pub attendance_rate: f64,
}

pub fn filter<'a>(
    records: &'a [AttendanceRecord],
    range: &'a DateRange,
) -> impl Iterator<Item = &'a AttendanceRecord> + 'a {
    records.iter().filter(move |r| range.contains(r.date))
}

/// Count sessions by status within `range`. Only `present` feeds the rate.
pub fn aggregate(records: &[AttendanceRecord], range: &DateRange) -> AttendanceStats {
    let mut stats = AttendanceStats {
        total_sessions: 0,
        present_sessions: 0,
        late_sessions: 0,
        absent_sessions: 0,
        excused_sessions: 0,
        attendance_rate: 0.0,
    };

    for rec in filter(records, range) {
        stats.total_sessions += 1;
        match rec.status {
            AttendanceStatus::Present => stats.present_sessions += 1,
            AttendanceStatus::Late => stats.late_sessions += 1,
            AttendanceStatus::Absent => stats.absent_sessions += 1,
            AttendanceStatus::Excused => stats.excused_sessions += 1,
        }
    }

    stats.attendance_rate = percent(stats.present_sessions, stats.total_sessions);
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn rec(d: u32, status: AttendanceStatus) -> AttendanceRecord {
        let now = Utc::now();
        AttendanceRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            session_id: Uuid::new_v4(),
            date: day(d),
            status,
            notes: None,
            marked_by: Uuid::nil(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn no_sessions_means_zero_rate() {
        let stats = aggregate(&[], &DateRange::default());
        assert_eq!(stats.total_sessions, 0);
        assert_eq!(stats.attendance_rate, 0.0);
    }

    #[test]
    fn nine_present_one_late() {
        let mut recs: Vec<_> = (1..=9).map(|d| rec(d, AttendanceStatus::Present)).collect();
        recs.push(rec(10, AttendanceStatus::Late));

        let stats = aggregate(&recs, &DateRange::default());
        assert_eq!(stats.total_sessions, 10);
        assert_eq!(stats.present_sessions, 9);
        assert_eq!(stats.late_sessions, 1);
        assert_eq!(stats.absent_sessions, 0);
        assert_eq!(stats.attendance_rate, 90.0);
    }

    #[test]
    fn excused_is_counted_apart_from_present() {
        let recs = vec![
            rec(1, AttendanceStatus::Present),
            rec(2, AttendanceStatus::Excused),
            rec(3, AttendanceStatus::Absent),
            rec(4, AttendanceStatus::Late),
        ];
        let stats = aggregate(&recs, &DateRange::default());
        assert_eq!(stats.excused_sessions, 1);
        assert_eq!(stats.attendance_rate, 25.0);
        assert!(
            stats.present_sessions + stats.late_sessions + stats.absent_sessions
                <= stats.total_sessions
        );
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let recs: Vec<_> = (1..=10).map(|d| rec(d, AttendanceStatus::Present)).collect();
        let range = DateRange::new(Some(day(3)), Some(day(5)));
        let stats = aggregate(&recs, &range);
        assert_eq!(stats.total_sessions, 3);

        let open_end = DateRange::new(Some(day(9)), None);
        assert_eq!(aggregate(&recs, &open_end).total_sessions, 2);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let range = DateRange::new(Some(day(5)), Some(day(3)));
        assert!(matches!(range.validate(), Err(AppError::Validation(_))));
        assert!(DateRange::new(Some(day(3)), Some(day(3))).validate().is_ok());
    }
}
