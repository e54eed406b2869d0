use chrono::NaiveDate;
use sqlx::MySqlPool;
use std::str::FromStr;

use crate::error::{AppError, AppResult};
use crate::model::leave_request::{LeaveDecision, LeaveRecord, LeaveRow, LeaveStatus};

const LEAVE_COLUMNS: &str =
    "l.leave_id, l.emp_id, l.start_date, l.end_date, l.leave_type, l.status, l.created_at";

/// Whose leave requests a listing covers.
#[derive(Debug, Clone, Copy)]
pub enum LeaveScope<'a> {
    Employee(&'a str),
    Company(&'a str),
}

fn into_records(rows: Vec<LeaveRow>) -> AppResult<Vec<LeaveRecord>> {
    rows.into_iter().map(LeaveRecord::try_from).collect()
}

pub async fn insert(
    pool: &MySqlPool,
    emp_id: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
    leave_type: &str,
) -> AppResult<LeaveRecord> {
    let result = sqlx::query(
        r#"
        INSERT INTO leave_table (emp_id, start_date, end_date, leave_type, status)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(emp_id)
    .bind(start_date)
    .bind(end_date)
    .bind(leave_type)
    .bind(LeaveStatus::Pending.as_str())
    .execute(pool)
    .await?;

    find(pool, result.last_insert_id())
        .await?
        .map(|(record, _)| record)
        .ok_or(AppError::NotFound("Leave request"))
}

#[derive(sqlx::FromRow)]
struct OwnedLeaveRow {
    #[sqlx(flatten)]
    leave: LeaveRow,
    company_id: String,
}

/// The leave request together with the company that owns its employee.
pub async fn find(pool: &MySqlPool, leave_id: u64) -> AppResult<Option<(LeaveRecord, String)>> {
    let sql = format!(
        "SELECT {LEAVE_COLUMNS}, e.company_id FROM leave_table l \
         JOIN employee e ON e.id = l.emp_id WHERE l.leave_id = ?"
    );

    let row = sqlx::query_as::<_, OwnedLeaveRow>(&sql)
        .bind(leave_id)
        .fetch_optional(pool)
        .await?;

    row.map(|owned| LeaveRecord::try_from(owned.leave).map(|record| (record, owned.company_id)))
        .transpose()
}

/// Listing query for `scope`, with a `status = ?` placeholder after the
/// owner placeholder when a filter is given.
fn list_sql(scope: LeaveScope<'_>, filtered: bool) -> (String, &str) {
    let mut sql = format!(
        "SELECT {LEAVE_COLUMNS} FROM leave_table l JOIN employee e ON e.id = l.emp_id WHERE "
    );
    let owner = match scope {
        LeaveScope::Employee(id) => {
            sql.push_str("l.emp_id = ?");
            id
        }
        LeaveScope::Company(id) => {
            sql.push_str("e.company_id = ?");
            id
        }
    };
    if filtered {
        sql.push_str(" AND l.status = ?");
    }
    sql.push_str(" ORDER BY l.leave_id DESC");
    (sql, owner)
}

pub async fn list(
    pool: &MySqlPool,
    scope: LeaveScope<'_>,
    status: Option<LeaveStatus>,
) -> AppResult<Vec<LeaveRecord>> {
    let (sql, owner) = list_sql(scope, status.is_some());

    let mut query = sqlx::query_as::<_, LeaveRow>(&sql).bind(owner);
    if let Some(status) = status {
        query = query.bind(status.as_str());
    }

    into_records(query.fetch_all(pool).await?)
}

/// Error for a leave id the company's locked read did not return.
fn missing_leave(exists_elsewhere: bool) -> AppError {
    if exists_elsewhere {
        AppError::forbidden("Access denied: Leave belongs to different company")
    } else {
        AppError::NotFound("Leave request")
    }
}

/// Applies an admin decision. The row is locked for the duration so two
/// admins deciding at once are applied one after the other.
pub async fn decide(
    pool: &MySqlPool,
    company_id: &str,
    leave_id: u64,
    decision: LeaveDecision,
) -> AppResult<LeaveRecord> {
    let mut tx = pool.begin().await?;

    let sql = format!(
        "SELECT {LEAVE_COLUMNS} FROM leave_table l \
         JOIN employee e ON e.id = l.emp_id \
         WHERE l.leave_id = ? AND e.company_id = ? FOR UPDATE"
    );
    let owned = sqlx::query_as::<_, LeaveRow>(&sql)
        .bind(leave_id)
        .bind(company_id)
        .fetch_optional(&mut *tx)
        .await?;

    let row = match owned {
        Some(row) => row,
        None => {
            // distinguish "does not exist" from "belongs to someone else"
            let exists = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM leave_table WHERE leave_id = ?",
            )
            .bind(leave_id)
            .fetch_one(&mut *tx)
            .await?;

            return Err(missing_leave(exists > 0));
        }
    };

    let mut record = LeaveRecord::try_from(row)?;
    let next = record.status.decide(decision);

    sqlx::query("UPDATE leave_table SET status = ? WHERE leave_id = ?")
        .bind(next.as_str())
        .bind(leave_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    record.status = next;
    Ok(record)
}

/// Parses an optional `?status=` filter.
pub fn parse_status_filter(raw: Option<&str>) -> AppResult<Option<LeaveStatus>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => LeaveStatus::from_str(s).map(Some).map_err(|_| {
            AppError::validation("Invalid status filter. Allowed: pending, approved, rejected")
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{ResponseError, http::StatusCode};

    #[test]
    fn employee_listing_filters_by_owner_and_status() {
        let (sql, owner) = list_sql(LeaveScope::Employee("ACJODO20240001"), true);
        assert_eq!(owner, "ACJODO20240001");
        assert!(sql.contains("WHERE l.emp_id = ? AND l.status = ?"));
        assert!(sql.ends_with("ORDER BY l.leave_id DESC"));
    }

    #[test]
    fn company_listing_without_filter_has_one_placeholder() {
        let (sql, owner) = list_sql(LeaveScope::Company("company-1"), false);
        assert_eq!(owner, "company-1");
        assert!(sql.contains("WHERE e.company_id = ?"));
        assert_eq!(sql.matches('?').count(), 1);
    }

    #[test]
    fn status_binds_outlive_the_filter() {
        // the listing binds the filter after the Option is consumed
        fn keep(s: &'static str) -> &'static str {
            s
        }
        let filter = parse_status_filter(Some("approved")).unwrap();
        let bound = filter.map(|status| keep(status.as_str()));
        assert_eq!(bound, Some("approved"));
    }

    #[test]
    fn deciding_an_unknown_leave_is_not_found() {
        let err = missing_leave(false);
        assert!(matches!(err, AppError::NotFound("Leave request")));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn deciding_another_companys_leave_is_forbidden() {
        assert_eq!(missing_leave(true).status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn missing_or_blank_filter_means_everything() {
        assert_eq!(parse_status_filter(None).unwrap(), None);
        assert_eq!(parse_status_filter(Some("  ")).unwrap(), None);
    }

    #[test]
    fn filter_accepts_each_status() {
        assert_eq!(parse_status_filter(Some("pending")).unwrap(), Some(LeaveStatus::Pending));
        assert_eq!(parse_status_filter(Some("Approved")).unwrap(), Some(LeaveStatus::Approved));
        assert_eq!(parse_status_filter(Some("rejected")).unwrap(), Some(LeaveStatus::Rejected));
    }

    #[test]
    fn unknown_filter_is_a_validation_error() {
        assert!(matches!(parse_status_filter(Some("all")), Err(AppError::Validation(_))));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a MySQL server in DATABASE_URL"]
    async fn deciding_an_unknown_leave_changes_nothing(pool: MySqlPool) {
        let result = decide(&pool, "company-1", 4242, LeaveDecision::Approve).await;
        assert!(matches!(result, Err(AppError::NotFound("Leave request"))));

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM leave_table")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rows, 0);
    }
}
