use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Per-employee rollup of the attendance ledger.
/// Overwritten on every check-out, never incremented in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Summary {
    #[schema(example = "ACJODO20240001")]
    pub emp_id: String,
    #[schema(example = 21)]
    pub present_days: i32,
    #[schema(example = 2)]
    pub leave_count: i32,
    #[schema(example = 28)]
    pub leave_left: i32,
    #[schema(example = 23)]
    pub tot_work_days: i32,
}

/// Raw counts read from the ledger for one employee.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct LedgerCounts {
    pub present_days: i64,
    pub leave_count: i64,
}

fn clamp(n: i64) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

impl Summary {
    pub fn recompute(emp_id: &str, counts: LedgerCounts, leave_allowance: i32) -> Self {
        let present_days = clamp(counts.present_days);
        let leave_count = clamp(counts.leave_count);

        Self {
            emp_id: emp_id.to_owned(),
            present_days,
            leave_count,
            leave_left: leave_allowance.saturating_sub(leave_count),
            tot_work_days: present_days.saturating_add(leave_count),
        }
    }

    /// Summary seeded at hire time, before any ledger rows exist.
    pub fn initial(emp_id: &str, leave_allowance: i32) -> Self {
        Self::recompute(emp_id, LedgerCounts::default(), leave_allowance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_left_and_total_from_counts() {
        let s = Summary::recompute(
            "E1",
            LedgerCounts { present_days: 21, leave_count: 2 },
            30,
        );
        assert_eq!(s.present_days, 21);
        assert_eq!(s.leave_count, 2);
        assert_eq!(s.leave_left, 28);
        assert_eq!(s.tot_work_days, 23);
    }

    #[test]
    fn recompute_is_idempotent() {
        let counts = LedgerCounts { present_days: 4, leave_count: 1 };
        assert_eq!(Summary::recompute("E1", counts, 20), Summary::recompute("E1", counts, 20));
    }

    #[test]
    fn one_more_present_day_after_checkout() {
        let before = Summary::recompute("E1", LedgerCounts { present_days: 3, leave_count: 0 }, 30);
        let after = Summary::recompute("E1", LedgerCounts { present_days: 4, leave_count: 0 }, 30);
        assert_eq!(after.present_days, before.present_days + 1);
        assert_eq!(after.leave_left, before.leave_left);
    }

    #[test]
    fn leave_left_goes_negative_when_allowance_is_exceeded() {
        let s = Summary::recompute("E1", LedgerCounts { present_days: 0, leave_count: 32 }, 30);
        assert_eq!(s.leave_left, -2);
    }

    #[test]
    fn initial_summary_is_empty_with_full_allowance() {
        let s = Summary::initial("E1", 20);
        assert_eq!((s.present_days, s.leave_count, s.leave_left, s.tot_work_days), (0, 0, 20, 0));
    }
}
