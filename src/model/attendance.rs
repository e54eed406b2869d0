use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};
use utoipa::ToSchema;

/// Length of a standard working day. Anything beyond is overtime.
pub const STANDARD_WORK_HOURS: f64 = 8.0;

/// One ledger row: at most one per employee per calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Attendance {
    #[schema(example = "ACJODO20240001")]
    pub emp_id: String,

    #[schema(example = "2026-01-05", value_type = String, format = "date")]
    pub date: NaiveDate,

    #[schema(example = "2026-01-05T09:00:00", value_type = Option<String>, format = "date-time")]
    pub start_time: Option<NaiveDateTime>,

    #[schema(example = "2026-01-05T18:30:00", value_type = Option<String>, format = "date-time")]
    pub end_time: Option<NaiveDateTime>,

    #[schema(example = 9.5)]
    pub work_hours: Option<f64>,

    #[schema(example = 1.5)]
    pub extra_hours: Option<f64>,

    pub on_leave: bool,
}

impl Attendance {
    /// A check-in without a matching check-out.
    pub fn is_open(&self) -> bool {
        !self.on_leave && self.start_time.is_some() && self.end_time.is_none()
    }
}

/// Coarse employee state derived from today's ledger row.
///
/// The integer codes are what clients read from `current_status`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EmployeeStatus {
    Idle = 0,
    CheckedIn = 1,
    OnLeave = 2,
}

impl EmployeeStatus {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Idle),
            1 => Some(Self::CheckedIn),
            2 => Some(Self::OnLeave),
            _ => None,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Idle => "Not checked in or day complete",
            Self::CheckedIn => "Checked in",
            Self::OnLeave => "On leave",
        }
    }
}

/// Projects the employee status from today's row, if any.
///
/// Priority: no row, leave flag, open check-in, closed day.
pub fn project_status(today: Option<&Attendance>) -> EmployeeStatus {
    match today {
        None => EmployeeStatus::Idle,
        Some(row) if row.on_leave => EmployeeStatus::OnLeave,
        Some(row) if row.end_time.is_none() => EmployeeStatus::CheckedIn,
        Some(_) => EmployeeStatus::Idle,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkedHours {
    pub work_hours: f64,
    pub extra_hours: f64,
}

impl WorkedHours {
    /// Fractional hours between check-in and check-out.
    /// An end before the start counts as zero.
    pub fn between(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        let millis = (end - start).num_milliseconds().max(0);
        Self::from_hours(millis as f64 / 3_600_000.0)
    }

    pub fn from_hours(work_hours: f64) -> Self {
        Self {
            work_hours,
            extra_hours: (work_hours - STANDARD_WORK_HOURS).max(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 5)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(h, m, 0).unwrap())
    }

    fn row(start: Option<NaiveDateTime>, end: Option<NaiveDateTime>, on_leave: bool) -> Attendance {
        Attendance {
            emp_id: "ACJODO20240001".into(),
            date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            start_time: start,
            end_time: end,
            work_hours: None,
            extra_hours: None,
            on_leave,
        }
    }

    #[test]
    fn no_row_is_idle() {
        assert_eq!(project_status(None), EmployeeStatus::Idle);
    }

    #[test]
    fn open_row_is_checked_in() {
        let r = row(Some(at(9, 0)), None, false);
        assert_eq!(project_status(Some(&r)), EmployeeStatus::CheckedIn);
        assert!(r.is_open());
    }

    #[test]
    fn closed_row_is_idle() {
        let r = row(Some(at(9, 0)), Some(at(17, 0)), false);
        assert_eq!(project_status(Some(&r)), EmployeeStatus::Idle);
        assert!(!r.is_open());
    }

    #[test]
    fn leave_flag_wins_over_times() {
        let r = row(None, None, true);
        assert_eq!(project_status(Some(&r)), EmployeeStatus::OnLeave);
        assert!(!r.is_open());
    }

    #[test]
    fn nine_to_half_past_six_is_one_and_a_half_hours_overtime() {
        let h = WorkedHours::between(at(9, 0), at(18, 30));
        assert_eq!(h.work_hours, 9.5);
        assert_eq!(h.extra_hours, 1.5);
    }

    #[test]
    fn exactly_eight_hours_has_no_overtime() {
        let h = WorkedHours::between(at(9, 0), at(17, 0));
        assert_eq!(h.work_hours, 8.0);
        assert_eq!(h.extra_hours, 0.0);
    }

    #[test]
    fn just_over_eight_hours_is_overtime() {
        let h = WorkedHours::from_hours(8.0001);
        assert!(h.extra_hours > 0.0);
    }

    #[test]
    fn short_day_and_reversed_clock() {
        assert_eq!(WorkedHours::between(at(9, 0), at(12, 0)).extra_hours, 0.0);
        assert_eq!(WorkedHours::between(at(12, 0), at(9, 0)).work_hours, 0.0);
    }

    #[test]
    fn status_codes_are_stable() {
        for status in [EmployeeStatus::Idle, EmployeeStatus::CheckedIn, EmployeeStatus::OnLeave] {
            assert_eq!(EmployeeStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(EmployeeStatus::CheckedIn.code(), 1);
        assert_eq!(EmployeeStatus::from_code(7), None);
        assert_eq!(EmployeeStatus::OnLeave.to_string(), "on_leave");
    }
}
