use actix_web::{HttpResponse, web};
use chrono::{Datelike, Local, Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::db;
use crate::db::attendance::DayRecord;
use crate::error::{AppError, AppResult};
use crate::model::attendance::Attendance;
use crate::model::employee::Employee;
use crate::model::summary::Summary;

#[derive(Serialize, ToSchema)]
pub struct CheckInResponse {
    #[schema(example = "Checked in successfully")]
    pub message: String,
    #[schema(example = "ACJODO20240001")]
    pub emp_id: String,
    #[schema(example = "2026-01-05", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = "2026-01-05T09:00:00", value_type = Option<String>, format = "date-time")]
    pub check_in_time: Option<NaiveDateTime>,
    /// 0 idle, 1 checked in, 2 on leave
    #[schema(example = 1)]
    pub current_status: i32,
}

#[derive(Serialize, ToSchema)]
pub struct CheckOutResponse {
    #[schema(example = "Checked out successfully")]
    pub message: String,
    #[schema(example = "ACJODO20240001")]
    pub emp_id: String,
    #[schema(example = "2026-01-05", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = "2026-01-05T09:00:00", value_type = Option<String>, format = "date-time")]
    pub check_in_time: Option<NaiveDateTime>,
    #[schema(example = "2026-01-05T18:30:00", value_type = Option<String>, format = "date-time")]
    pub check_out_time: Option<NaiveDateTime>,
    #[schema(example = 9.5)]
    pub work_hours: f64,
    #[schema(example = 1.5)]
    pub extra_hours: f64,
    #[schema(example = 0)]
    pub current_status: i32,
}

#[derive(Serialize, ToSchema)]
pub struct StatusResponse {
    #[schema(example = "ACJODO20240001")]
    pub emp_id: String,
    #[schema(example = 1)]
    pub current_status: i32,
    #[schema(example = "Checked in")]
    pub status_description: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DateQuery {
    /// Day to report, `YYYY-MM-DD`
    #[param(value_type = String, format = "date", example = "2026-01-05")]
    pub date: NaiveDate,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MonthQuery {
    /// Month to report, `YYYY-MM`
    #[param(example = "2026-01")]
    pub month: String,
}

#[derive(Serialize, ToSchema)]
pub struct CompanyAttendanceResponse {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub total_employees: i64,
    pub present_count: i64,
    pub on_leave_count: i64,
    pub absent_count: i64,
    pub records: Vec<DayRecord>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeAttendanceResponse {
    #[schema(example = "2026-01")]
    pub month: String,
    pub records: Vec<Attendance>,
    pub summary: Option<Summary>,
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Turns `YYYY-MM` into the half-open range `[first day, first day of next month)`.
pub fn parse_month(raw: &str) -> AppResult<(NaiveDate, NaiveDate)> {
    let invalid = || AppError::validation("Invalid month format. Use YYYY-MM");

    let (year, month) = raw.trim().split_once('-').ok_or_else(invalid)?;
    if year.len() != 4 || month.len() != 2 {
        return Err(invalid());
    }

    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;

    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let next = first.checked_add_months(Months::new(1)).ok_or_else(invalid)?;

    Ok((first, next))
}

/// Present / on-leave / absent tallies for one company day.
pub fn day_counts(records: &[DayRecord], total_employees: i64) -> (i64, i64, i64) {
    let on_leave = records.iter().filter(|r| r.on_leave).count() as i64;
    let present = records.len() as i64 - on_leave;
    let absent = (total_employees - records.len() as i64).max(0);
    (present, on_leave, absent)
}

/// Load the calling employee, failing when the token outlived the record.
async fn caller(pool: &MySqlPool, auth: &AuthUser) -> AppResult<Employee> {
    let emp_id = auth.require_employee()?;
    db::employee::require(pool, emp_id).await
}

/// Check in for today
#[utoipa::path(
    post,
    path = "/attendance/checkin",
    responses(
        (status = 200, description = "Checked in, or already checked in today", body = CheckInResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only employees can check in"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
#[instrument(name = "attendance_check_in", skip(auth, pool), fields(emp_id = %auth.subject))]
pub async fn check_in(auth: AuthUser, pool: web::Data<MySqlPool>) -> AppResult<HttpResponse> {
    let employee = caller(&pool, &auth).await?;

    let outcome = db::attendance::check_in(&pool, &employee.id, now()).await?;

    let message = if outcome.created {
        info!("Checked in");
        "Checked in successfully"
    } else {
        "Already checked in for today"
    };

    Ok(HttpResponse::Ok().json(CheckInResponse {
        message: message.into(),
        emp_id: employee.id,
        date: outcome.row.date,
        check_in_time: outcome.row.start_time,
        current_status: outcome.status.code(),
    }))
}

/// Check out for today
#[utoipa::path(
    post,
    path = "/attendance/checkout",
    responses(
        (status = 200, description = "Checked out", body = CheckOutResponse),
        (status = 400, description = "No open check-in for today"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only employees can check out"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
#[instrument(name = "attendance_check_out", skip(auth, pool, config), fields(emp_id = %auth.subject))]
pub async fn check_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    let employee = caller(&pool, &auth).await?;

    let outcome =
        db::attendance::check_out(&pool, &employee.id, now(), config.leave_allowance).await?;

    info!(
        work_hours = outcome.hours.work_hours,
        present_days = outcome.summary.present_days,
        "Checked out"
    );

    Ok(HttpResponse::Ok().json(CheckOutResponse {
        message: "Checked out successfully".into(),
        emp_id: employee.id,
        date: outcome.row.date,
        check_in_time: outcome.row.start_time,
        check_out_time: outcome.row.end_time,
        work_hours: outcome.hours.work_hours,
        extra_hours: outcome.hours.extra_hours,
        current_status: outcome.status.code(),
    }))
}

/// Current status projected from today's ledger row
#[utoipa::path(
    get,
    path = "/attendance/status",
    responses(
        (status = 200, description = "Status for today", body = StatusResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only employees have a status")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn status(auth: AuthUser, pool: web::Data<MySqlPool>) -> AppResult<HttpResponse> {
    let employee = caller(&pool, &auth).await?;

    let today = now().date();
    let status = db::attendance::current_status(&pool, &employee.id, today).await?;

    Ok(HttpResponse::Ok().json(StatusResponse {
        emp_id: employee.id,
        current_status: status.code(),
        status_description: status.description().into(),
    }))
}

/// Company attendance for one day
#[utoipa::path(
    get,
    path = "/attendance/company",
    params(DateQuery),
    responses(
        (status = 200, description = "Attendance of the company's employees", body = CompanyAttendanceResponse),
        (status = 400, description = "Invalid date"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn company_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<DateQuery>,
) -> AppResult<HttpResponse> {
    let company_id = auth.require_admin()?;
    let date = query.date;

    let records = db::attendance::company_day(&pool, company_id, date).await?;
    let total_employees = db::employee::count_for_company(&pool, company_id).await?;
    let (present_count, on_leave_count, absent_count) = day_counts(&records, total_employees);

    Ok(HttpResponse::Ok().json(CompanyAttendanceResponse {
        date,
        total_employees,
        present_count,
        on_leave_count,
        absent_count,
        records,
    }))
}

/// The calling employee's attendance for one month
#[utoipa::path(
    get,
    path = "/attendance/employee",
    params(MonthQuery),
    responses(
        (status = 200, description = "Month of attendance and the stored summary", body = EmployeeAttendanceResponse),
        (status = 400, description = "Invalid month format"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Employee only")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn employee_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<MonthQuery>,
) -> AppResult<HttpResponse> {
    let employee = caller(&pool, &auth).await?;
    let (from, until) = parse_month(&query.month)?;

    let records = db::attendance::employee_range(&pool, &employee.id, from, until).await?;
    let summary = db::employee::fetch_satellite::<Summary>(
        &pool,
        db::employee::Satellite::Summary,
        &employee.id,
    )
    .await?;

    Ok(HttpResponse::Ok().json(EmployeeAttendanceResponse {
        month: format!("{:04}-{:02}", from.year(), from.month()),
        records,
        summary,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(emp_id: &str, on_leave: bool) -> DayRecord {
        DayRecord {
            emp_id: emp_id.into(),
            date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            start_time: None,
            end_time: None,
            work_hours: None,
            extra_hours: None,
            on_leave,
            employee_name: None,
            department: None,
        }
    }

    #[test]
    fn month_becomes_half_open_range() {
        let (from, until) = parse_month("2026-02").unwrap();
        assert_eq!(from, NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
        assert_eq!(until, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
    }

    #[test]
    fn december_rolls_into_next_year() {
        let (_, until) = parse_month("2025-12").unwrap();
        assert_eq!(until, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
    }

    #[test]
    fn malformed_months_are_rejected() {
        for raw in ["2026", "2026-13", "2026-1", "26-01", "2026/01", "abcd-ef", ""] {
            assert!(
                matches!(parse_month(raw), Err(AppError::Validation(_))),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn employees_without_a_row_count_as_absent() {
        let records = vec![record("A", false), record("B", true), record("C", false)];
        assert_eq!(day_counts(&records, 5), (2, 1, 2));
    }

    #[test]
    fn empty_day_is_all_absent() {
        assert_eq!(day_counts(&[], 3), (0, 0, 3));
    }
}
