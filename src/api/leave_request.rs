use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::db;
use crate::db::leave::{LeaveScope, parse_status_filter};
use crate::error::{AppError, AppResult};
use crate::model::leave_request::{LeaveDecision, LeaveRecord};

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "2026-01-10", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-12", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    /// Free text, e.g. `Paid`, `Sick` or `Casual`
    #[schema(example = "Paid")]
    pub leave_type: String,
}

/// Width of the `leave_type` column.
const MAX_LEAVE_TYPE_LEN: usize = 32;

impl CreateLeave {
    /// Checks the range and returns the trimmed leave type.
    fn validate(&self) -> AppResult<&str> {
        if self.start_date > self.end_date {
            return Err(AppError::validation("start_date must not be after end_date"));
        }

        let leave_type = self.leave_type.trim();
        if leave_type.is_empty() {
            return Err(AppError::validation("leave_type must not be empty"));
        }
        if leave_type.chars().count() > MAX_LEAVE_TYPE_LEN {
            return Err(AppError::validation(format!(
                "leave_type must be at most {MAX_LEAVE_TYPE_LEN} characters"
            )));
        }
        Ok(leave_type)
    }
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaveFilter {
    /// `pending`, `approved` or `rejected`
    #[param(example = "pending")]
    pub status: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub leaves: Vec<LeaveRecord>,
    #[schema(example = 1)]
    pub count: usize,
}

impl From<Vec<LeaveRecord>> for LeaveListResponse {
    fn from(leaves: Vec<LeaveRecord>) -> Self {
        Self { count: leaves.len(), leaves }
    }
}

/// Request leave
#[utoipa::path(
    post,
    path = "/leaves/request",
    request_body = CreateLeave,
    responses(
        (status = 201, description = "Leave requested, status pending", body = LeaveRecord),
        (status = 400, description = "Invalid date range or empty leave type"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Employee only"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
#[instrument(name = "leave_request", skip_all, fields(emp_id = %auth.subject))]
pub async fn request_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLeave>,
) -> AppResult<HttpResponse> {
    let emp_id = auth.require_employee()?;
    let leave_type = payload.validate()?;

    let employee = db::employee::require(pool.get_ref(), emp_id).await?;

    let record = db::leave::insert(
        &pool,
        &employee.id,
        payload.start_date,
        payload.end_date,
        leave_type,
    )
    .await?;

    info!(leave_id = record.leave_id, "Leave requested");
    Ok(HttpResponse::Created().json(record))
}

/// Leave requests of the admin's company
#[utoipa::path(
    get,
    path = "/leaves/admin",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Leave requests of every employee of the company", body = LeaveListResponse),
        (status = 400, description = "Unknown status filter"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn list_admin(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> AppResult<HttpResponse> {
    let company_id = auth
        .require_admin()
        .map_err(|_| AppError::forbidden("Only admin can access all leave requests"))?;
    let status = parse_status_filter(query.status.as_deref())?;

    let leaves = db::leave::list(&pool, LeaveScope::Company(company_id), status).await?;
    Ok(HttpResponse::Ok().json(LeaveListResponse::from(leaves)))
}

/// The calling employee's leave requests
#[utoipa::path(
    get,
    path = "/leaves/emp",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Own leave requests", body = LeaveListResponse),
        (status = 400, description = "Unknown status filter"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Employee only")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn list_emp(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> AppResult<HttpResponse> {
    let emp_id = auth.require_employee()?;
    let status = parse_status_filter(query.status.as_deref())?;

    let leaves = db::leave::list(&pool, LeaveScope::Employee(emp_id), status).await?;
    Ok(HttpResponse::Ok().json(LeaveListResponse::from(leaves)))
}

async fn decide(
    auth: AuthUser,
    pool: &MySqlPool,
    leave_id: u64,
    decision: LeaveDecision,
) -> AppResult<HttpResponse> {
    let verb = match decision {
        LeaveDecision::Approve => "approve",
        LeaveDecision::Reject => "reject",
    };
    let company_id = auth
        .require_admin()
        .map_err(|_| AppError::forbidden(format!("Only admin can {verb} leave requests")))?;

    let record = db::leave::decide(pool, company_id, leave_id, decision).await?;

    info!(leave_id, status = %record.status, "Leave decided");
    Ok(HttpResponse::Ok().json(record))
}

/// Approve a leave request
#[utoipa::path(
    put,
    path = "/leaves/{leave_id}/approve",
    params(("leave_id", Path, description = "Leave request id")),
    responses(
        (status = 200, description = "Leave approved", body = LeaveRecord),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not an admin, or leave of another company"),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
#[instrument(name = "leave_approve", skip(auth, pool))]
pub async fn approve_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    decide(auth, &pool, path.into_inner(), LeaveDecision::Approve).await
}

/// Reject a leave request
#[utoipa::path(
    put,
    path = "/leaves/{leave_id}/reject",
    params(("leave_id", Path, description = "Leave request id")),
    responses(
        (status = 200, description = "Leave rejected", body = LeaveRecord),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not an admin, or leave of another company"),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
#[instrument(name = "leave_reject", skip(auth, pool))]
pub async fn reject_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    decide(auth, &pool, path.into_inner(), LeaveDecision::Reject).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leave(start: (i32, u32, u32), end: (i32, u32, u32)) -> CreateLeave {
        CreateLeave {
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
            leave_type: "Paid".into(),
        }
    }

    #[test]
    fn single_day_leave_is_valid() {
        assert!(leave((2026, 1, 10), (2026, 1, 10)).validate().is_ok());
    }

    #[test]
    fn reversed_range_is_rejected() {
        let err = leave((2026, 1, 12), (2026, 1, 10)).validate().unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn leave_type_is_free_text() {
        for raw in ["Paid", "casual", "sick", "Maternity"] {
            let body: CreateLeave = serde_json::from_value(serde_json::json!({
                "start_date": "2026-01-10",
                "end_date": "2026-01-11",
                "leave_type": raw,
            }))
            .unwrap();
            assert_eq!(body.validate().unwrap(), raw);
        }
    }

    #[test]
    fn leave_type_is_trimmed() {
        let mut body = leave((2026, 1, 10), (2026, 1, 10));
        body.leave_type = "  Casual ".into();
        assert_eq!(body.validate().unwrap(), "Casual");
    }

    #[test]
    fn blank_or_oversized_leave_type_is_rejected() {
        let mut body = leave((2026, 1, 10), (2026, 1, 10));
        body.leave_type = "   ".into();
        assert!(matches!(body.validate(), Err(AppError::Validation(_))));

        body.leave_type = "x".repeat(MAX_LEAVE_TYPE_LEN + 1);
        assert!(matches!(body.validate(), Err(AppError::Validation(_))));
    }
}
