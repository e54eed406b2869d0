//! The attendance ledger: one row per employee per calendar day.
//!
//! Every mutation runs in a single transaction covering the ledger write,
//! the summary recomputation and the status cache, so a half-finished
//! check-out is never visible.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::Serialize;
use sqlx::{MySqlConnection, MySqlPool};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::model::attendance::{Attendance, EmployeeStatus, WorkedHours, project_status};
use crate::model::summary::{LedgerCounts, Summary};

const ATTENDANCE_COLUMNS: &str =
    "emp_id, date, start_time, end_time, work_hours, extra_hours, on_leave";

#[derive(Debug)]
pub struct CheckIn {
    pub row: Attendance,
    /// false when the day already had a row
    pub created: bool,
    pub status: EmployeeStatus,
}

#[derive(Debug)]
pub struct CheckOut {
    pub row: Attendance,
    pub hours: WorkedHours,
    pub summary: Summary,
    pub status: EmployeeStatus,
}

/// Ledger row joined with the employee's name and department.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct DayRecord {
    pub emp_id: String,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub start_time: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub end_time: Option<NaiveDateTime>,
    pub work_hours: Option<f64>,
    pub extra_hours: Option<f64>,
    pub on_leave: bool,
    pub employee_name: Option<String>,
    pub department: Option<String>,
}

async fn day_row(
    conn: &mut MySqlConnection,
    emp_id: &str,
    date: NaiveDate,
    lock: bool,
) -> AppResult<Option<Attendance>> {
    let sql = format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE emp_id = ? AND date = ?{}",
        if lock { " FOR UPDATE" } else { "" }
    );

    Ok(sqlx::query_as::<_, Attendance>(&sql)
        .bind(emp_id)
        .bind(date)
        .fetch_optional(&mut *conn)
        .await?)
}

/// Projects today's status from the ledger and overwrites the cached
/// `current_status`. The only writer of that column.
pub async fn refresh_status(
    conn: &mut MySqlConnection,
    emp_id: &str,
    today: NaiveDate,
) -> AppResult<EmployeeStatus> {
    // locking read: sees rows committed after this transaction's snapshot
    let row = day_row(conn, emp_id, today, true).await?;
    let status = project_status(row.as_ref());

    sqlx::query("UPDATE employee SET current_status = ? WHERE id = ?")
        .bind(status.code())
        .bind(emp_id)
        .execute(&mut *conn)
        .await?;

    Ok(status)
}

/// Pure read-side projection; does not touch the cache.
pub async fn current_status(
    pool: &MySqlPool,
    emp_id: &str,
    today: NaiveDate,
) -> AppResult<EmployeeStatus> {
    let mut conn = pool.acquire().await?;
    let row = day_row(&mut conn, emp_id, today, false).await?;
    Ok(project_status(row.as_ref()))
}

/// Full recomputation of the employee's summary from the ledger, upserted
/// over whatever was stored before.
pub async fn recompute_summary(
    conn: &mut MySqlConnection,
    emp_id: &str,
    leave_allowance: i32,
) -> AppResult<Summary> {
    let counts = sqlx::query_as::<_, LedgerCounts>(
        r#"
        SELECT
            CAST(COALESCE(SUM(on_leave = FALSE), 0) AS SIGNED) AS present_days,
            CAST(COALESCE(SUM(on_leave = TRUE), 0) AS SIGNED) AS leave_count
        FROM attendance
        WHERE emp_id = ?
        "#,
    )
    .bind(emp_id)
    .fetch_one(&mut *conn)
    .await?;

    let summary = Summary::recompute(emp_id, counts, leave_allowance);

    sqlx::query(
        r#"
        INSERT INTO summary (emp_id, present_days, leave_count, leave_left, tot_work_days)
        VALUES (?, ?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE
            present_days = VALUES(present_days),
            leave_count = VALUES(leave_count),
            leave_left = VALUES(leave_left),
            tot_work_days = VALUES(tot_work_days)
        "#,
    )
    .bind(&summary.emp_id)
    .bind(summary.present_days)
    .bind(summary.leave_count)
    .bind(summary.leave_left)
    .bind(summary.tot_work_days)
    .execute(&mut *conn)
    .await?;

    Ok(summary)
}

/// What a check-in does with the day's row.
#[derive(Debug, PartialEq)]
enum CheckInPlan {
    /// The day already has a row; it is reported untouched.
    Existing(Attendance),
    /// No row yet: open one starting now.
    Open(Attendance),
}

fn plan_check_in(existing: Option<Attendance>, emp_id: &str, now: NaiveDateTime) -> CheckInPlan {
    match existing {
        Some(row) => CheckInPlan::Existing(row),
        None => CheckInPlan::Open(Attendance {
            emp_id: emp_id.to_owned(),
            date: now.date(),
            start_time: Some(now),
            end_time: None,
            work_hours: None,
            extra_hours: None,
            on_leave: false,
        }),
    }
}

/// Closes the day's open row at `now`. The end is clamped to the start so
/// a clock step backwards never yields negative hours.
fn close_row(row: Option<Attendance>, now: NaiveDateTime) -> AppResult<(Attendance, WorkedHours)> {
    let mut row = match row {
        Some(row) if row.is_open() => row,
        _ => return Err(AppError::NoOpenCheckIn),
    };

    let start = row.start_time.ok_or(AppError::NoOpenCheckIn)?;
    let end = now.max(start);
    let hours = WorkedHours::between(start, end);

    row.end_time = Some(end);
    row.work_hours = Some(hours.work_hours);
    row.extra_hours = Some(hours.extra_hours);

    Ok((row, hours))
}

async fn insert_open_row(conn: &mut MySqlConnection, row: &Attendance) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO attendance (emp_id, date, start_time, end_time, on_leave)
        VALUES (?, ?, ?, NULL, FALSE)
        "#,
    )
    .bind(&row.emp_id)
    .bind(row.date)
    .bind(row.start_time)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// DATETIME columns keep whole seconds.
fn whole_seconds(t: NaiveDateTime) -> NaiveDateTime {
    t.with_nanosecond(0).unwrap_or(t)
}

/// Opens today's row, or reports the existing one untouched.
pub async fn check_in(pool: &MySqlPool, emp_id: &str, now: NaiveDateTime) -> AppResult<CheckIn> {
    let now = whole_seconds(now);
    let today = now.date();
    let mut tx = pool.begin().await?;

    let existing = day_row(&mut tx, emp_id, today, false).await?;
    let (row, created) = match plan_check_in(existing, emp_id, now) {
        CheckInPlan::Existing(row) => (row, false),
        CheckInPlan::Open(row) => match insert_open_row(&mut tx, &row).await {
            Ok(()) => (row, true),
            // lost the race against a concurrent check-in; report its row
            Err(e) if AppError::is_duplicate_key(&e) => {
                let row = day_row(&mut tx, emp_id, today, true).await?.ok_or_else(|| {
                    AppError::Internal(format!("attendance row for {emp_id} vanished"))
                })?;
                (row, false)
            }
            Err(e) => return Err(e.into()),
        },
    };

    let status = refresh_status(&mut tx, emp_id, today).await?;

    tx.commit().await?;

    Ok(CheckIn { row, created, status })
}

/// Closes today's open row, recomputes the summary and the status.
pub async fn check_out(
    pool: &MySqlPool,
    emp_id: &str,
    now: NaiveDateTime,
    leave_allowance: i32,
) -> AppResult<CheckOut> {
    let now = whole_seconds(now);
    let today = now.date();
    let mut tx = pool.begin().await?;

    // FOR UPDATE serialises concurrent check-outs of the same employee;
    // the loser sees end_time set and fails in close_row
    let locked = day_row(&mut tx, emp_id, today, true).await?;
    let (row, hours) = close_row(locked, now)?;

    sqlx::query(
        r#"
        UPDATE attendance
        SET end_time = ?, work_hours = ?, extra_hours = ?
        WHERE emp_id = ? AND date = ?
        "#,
    )
    .bind(row.end_time)
    .bind(hours.work_hours)
    .bind(hours.extra_hours)
    .bind(emp_id)
    .bind(today)
    .execute(&mut *tx)
    .await?;

    let summary = recompute_summary(&mut tx, emp_id, leave_allowance).await?;
    let status = refresh_status(&mut tx, emp_id, today).await?;

    tx.commit().await?;

    Ok(CheckOut { row, hours, summary, status })
}

pub async fn company_day(
    pool: &MySqlPool,
    company_id: &str,
    date: NaiveDate,
) -> AppResult<Vec<DayRecord>> {
    Ok(sqlx::query_as::<_, DayRecord>(
        r#"
        SELECT a.emp_id, a.date, a.start_time, a.end_time, a.work_hours, a.extra_hours,
               a.on_leave, e.name AS employee_name, e.department
        FROM attendance a
        JOIN employee e ON e.id = a.emp_id
        WHERE e.company_id = ? AND a.date = ?
        ORDER BY a.emp_id
        "#,
    )
    .bind(company_id)
    .bind(date)
    .fetch_all(pool)
    .await?)
}

/// Rows with `from <= date < until`, oldest first.
pub async fn employee_range(
    pool: &MySqlPool,
    emp_id: &str,
    from: NaiveDate,
    until: NaiveDate,
) -> AppResult<Vec<Attendance>> {
    let sql = format!(
        "SELECT {ATTENDANCE_COLUMNS} FROM attendance \
         WHERE emp_id = ? AND date >= ? AND date < ? ORDER BY date"
    );
    Ok(sqlx::query_as::<_, Attendance>(&sql)
        .bind(emp_id)
        .bind(from)
        .bind(until)
        .fetch_all(pool)
        .await?)
}

pub async fn employee_all(pool: &MySqlPool, emp_id: &str) -> AppResult<Vec<Attendance>> {
    let sql = format!("SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE emp_id = ? ORDER BY date");
    Ok(sqlx::query_as::<_, Attendance>(&sql)
        .bind(emp_id)
        .fetch_all(pool)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    const EMP: &str = "ACJODO20240001";

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, day)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(h, m, 0).unwrap())
    }

    fn opened(now: NaiveDateTime) -> Attendance {
        match plan_check_in(None, EMP, now) {
            CheckInPlan::Open(row) => row,
            other => panic!("expected a new row, got {other:?}"),
        }
    }

    // mirrors the SUM(on_leave = ...) tally in recompute_summary
    fn tally(rows: &[Attendance]) -> LedgerCounts {
        let leave_count = rows.iter().filter(|r| r.on_leave).count() as i64;
        LedgerCounts {
            present_days: rows.len() as i64 - leave_count,
            leave_count,
        }
    }

    #[test]
    fn first_check_in_opens_the_day() {
        let row = opened(at(5, 9, 0));
        assert_eq!(row.date, NaiveDate::from_ymd_opt(2026, 1, 5).unwrap());
        assert_eq!(row.start_time, Some(at(5, 9, 0)));
        assert!(row.is_open());
        assert_eq!(project_status(Some(&row)), EmployeeStatus::CheckedIn);
    }

    #[test]
    fn second_check_in_keeps_the_first_start_time() {
        let first = opened(at(5, 9, 0));

        let again = plan_check_in(Some(first.clone()), EMP, at(5, 9, 30));
        assert_eq!(again, CheckInPlan::Existing(first));
        if let CheckInPlan::Existing(row) = again {
            assert_eq!(row.start_time, Some(at(5, 9, 0)));
        }
    }

    #[test]
    fn check_in_on_a_leave_day_reports_the_leave_row() {
        let leave = Attendance {
            emp_id: EMP.into(),
            date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            start_time: None,
            end_time: None,
            work_hours: None,
            extra_hours: None,
            on_leave: true,
        };
        match plan_check_in(Some(leave), EMP, at(5, 9, 0)) {
            CheckInPlan::Existing(row) => {
                assert_eq!(row.start_time, None);
                assert_eq!(project_status(Some(&row)), EmployeeStatus::OnLeave);
            }
            other => panic!("expected the leave row, got {other:?}"),
        }
    }

    #[test]
    fn check_out_without_a_row_is_rejected() {
        assert!(matches!(close_row(None, at(5, 18, 0)), Err(AppError::NoOpenCheckIn)));
    }

    #[test]
    fn second_check_out_is_rejected() {
        let (closed, _) = close_row(Some(opened(at(5, 9, 0))), at(5, 17, 0)).unwrap();
        assert!(matches!(close_row(Some(closed), at(5, 18, 0)), Err(AppError::NoOpenCheckIn)));
    }

    #[test]
    fn check_out_before_check_in_counts_zero_hours() {
        let (row, hours) = close_row(Some(opened(at(5, 9, 0))), at(5, 8, 0)).unwrap();
        assert_eq!(row.end_time, Some(at(5, 9, 0)));
        assert_eq!(hours.work_hours, 0.0);
    }

    #[test]
    fn nine_to_half_past_six_adds_a_present_day() {
        let mut ledger: Vec<Attendance> = (1..=3)
            .map(|day| close_row(Some(opened(at(day, 9, 0))), at(day, 17, 0)).unwrap().0)
            .collect();
        let before = Summary::recompute(EMP, tally(&ledger), 30);

        let (row, hours) = close_row(Some(opened(at(5, 9, 0))), at(5, 18, 30)).unwrap();
        assert_eq!((hours.work_hours, hours.extra_hours), (9.5, 1.5));
        assert_eq!(row.work_hours, Some(9.5));
        assert_eq!(row.extra_hours, Some(1.5));
        assert_eq!(project_status(Some(&row)), EmployeeStatus::Idle);

        ledger.push(row);
        let after = Summary::recompute(EMP, tally(&ledger), 30);
        assert_eq!(after.present_days, before.present_days + 1);
        assert_eq!(after.tot_work_days, before.tot_work_days + 1);
        assert_eq!(after.leave_left, 30);
    }

    #[test]
    fn timestamps_are_truncated_to_whole_seconds() {
        let t = at(5, 9, 0) + chrono::Duration::milliseconds(750);
        assert_eq!(whole_seconds(t), at(5, 9, 0));
    }

    async fn seed_employee(pool: &MySqlPool) {
        sqlx::query(
            "INSERT INTO company (id, company_name, email, password) \
             VALUES ('company-1', 'Acme', 'hr@acme.test', 'x')",
        )
        .execute(pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO employee (id, company_id, name, password, email) \
             VALUES (?, 'company-1', 'Jo Doe', 'x', 'jo@acme.test')",
        )
        .bind(EMP)
        .execute(pool)
        .await
        .unwrap();
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a MySQL server in DATABASE_URL"]
    async fn check_in_twice_then_out_against_mysql(pool: MySqlPool) {
        seed_employee(&pool).await;

        let first = check_in(&pool, EMP, at(5, 9, 0)).await.unwrap();
        let second = check_in(&pool, EMP, at(5, 9, 30)).await.unwrap();
        assert!(first.created);
        assert!(!second.created);
        assert_eq!(second.row.start_time, Some(at(5, 9, 0)));
        assert_eq!(second.status, EmployeeStatus::CheckedIn);

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM attendance WHERE emp_id = ?")
            .bind(EMP)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rows, 1);

        let out = check_out(&pool, EMP, at(5, 18, 30), 30).await.unwrap();
        assert_eq!(out.hours.work_hours, 9.5);
        assert_eq!(out.summary.present_days, 1);
        assert_eq!(out.status, EmployeeStatus::Idle);

        let again = check_out(&pool, EMP, at(5, 19, 0), 30).await;
        assert!(matches!(again, Err(AppError::NoOpenCheckIn)));
    }
}
