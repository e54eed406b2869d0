use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum_macros::{AsRefStr, Display, EnumString, IntoStaticStr};
use utoipa::ToSchema;

use crate::error::AppError;

/// Lifecycle of a leave request.
///
/// Requests start `Pending`. Admin actions move them to `Approved` or
/// `Rejected` and may flip between those two, but never back to `Pending`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
    IntoStaticStr,
    EnumString,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveDecision {
    Approve,
    Reject,
}

impl LeaveStatus {
    /// Stored spelling, usable as a query bind past the value's scope.
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    pub fn decide(self, decision: LeaveDecision) -> LeaveStatus {
        match decision {
            LeaveDecision::Approve => LeaveStatus::Approved,
            LeaveDecision::Reject => LeaveStatus::Rejected,
        }
    }
}

/// Row as stored; `status` is kept as text in the table.
#[derive(Debug, sqlx::FromRow)]
pub struct LeaveRow {
    pub leave_id: u64,
    pub emp_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub leave_type: String,
    pub status: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaveRecord {
    #[schema(example = 1)]
    pub leave_id: u64,
    #[schema(example = "ACJODO20240001")]
    pub emp_id: String,
    #[schema(example = "2026-01-10", value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-12", value_type = String, format = "date")]
    pub end_date: NaiveDate,
    #[schema(example = "sick")]
    pub leave_type: String,
    pub status: LeaveStatus,
    #[schema(example = "2026-01-01T00:00:00Z", value_type = Option<String>, format = "date-time")]
    pub created_at: Option<DateTime<Utc>>,
}

impl TryFrom<LeaveRow> for LeaveRecord {
    type Error = AppError;

    fn try_from(row: LeaveRow) -> Result<Self, Self::Error> {
        let status = LeaveStatus::from_str(&row.status).map_err(|_| {
            AppError::Internal(format!(
                "leave {} has unknown status {:?}",
                row.leave_id, row.status
            ))
        })?;

        Ok(Self {
            leave_id: row.leave_id,
            emp_id: row.emp_id,
            start_date: row.start_date,
            end_date: row.end_date,
            leave_type: row.leave_type,
            status,
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: &str) -> LeaveRow {
        LeaveRow {
            leave_id: 7,
            emp_id: "E1".into(),
            start_date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 2, 3).unwrap(),
            leave_type: "sick".into(),
            status: status.into(),
            created_at: None,
        }
    }

    #[test]
    fn pending_can_be_approved_or_rejected() {
        assert_eq!(LeaveStatus::Pending.decide(LeaveDecision::Approve), LeaveStatus::Approved);
        assert_eq!(LeaveStatus::Pending.decide(LeaveDecision::Reject), LeaveStatus::Rejected);
    }

    #[test]
    fn decisions_toggle_but_never_return_to_pending() {
        let toggled = LeaveStatus::Approved.decide(LeaveDecision::Reject);
        assert_eq!(toggled, LeaveStatus::Rejected);
        assert_eq!(toggled.decide(LeaveDecision::Approve), LeaveStatus::Approved);
        for decision in [LeaveDecision::Approve, LeaveDecision::Reject] {
            for from in [LeaveStatus::Pending, LeaveStatus::Approved, LeaveStatus::Rejected] {
                assert_ne!(from.decide(decision), LeaveStatus::Pending);
            }
        }
    }

    #[test]
    fn rejected_is_distinct_from_pending() {
        assert_ne!(LeaveStatus::Rejected, LeaveStatus::Pending);
        assert_eq!(LeaveStatus::Rejected.as_ref(), "rejected");
    }

    #[test]
    fn status_filter_parses_case_insensitively() {
        assert_eq!(LeaveStatus::from_str("Pending").unwrap(), LeaveStatus::Pending);
        assert_eq!(LeaveStatus::from_str("APPROVED").unwrap(), LeaveStatus::Approved);
        assert!(LeaveStatus::from_str("maybe").is_err());
        assert_eq!(LeaveStatus::Approved.as_str(), "approved");
    }

    #[test]
    fn stored_row_converts_to_record() {
        let record = LeaveRecord::try_from(row("approved")).unwrap();
        assert_eq!(record.status, LeaveStatus::Approved);
        assert_eq!(record.leave_id, 7);
    }

    #[test]
    fn unknown_stored_status_is_an_internal_error() {
        assert!(matches!(LeaveRecord::try_from(row("0")), Err(AppError::Internal(_))));
    }
}
