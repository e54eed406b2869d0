use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::auth::password::hash_password;
use crate::config::Config;
use crate::db;
use crate::db::employee::{NewEmployee, Satellite};
use crate::db::leave::LeaveScope;
use crate::error::{AppError, AppResult};
use crate::model::attendance::Attendance;
use crate::model::employee::{Employee, EmployeeProfile};
use crate::model::leave_request::LeaveRecord;
use crate::model::private_info::{PrivateInfo, PrivateInfoInput};
use crate::model::resume::{Resume, ResumeInput};
use crate::model::salary::{Salary, SalaryInput};
use crate::model::summary::Summary;
use crate::models::MessageResponse;
use crate::utils::db_utils::UpdateSet;
use crate::utils::email_filter::Namespace;
use crate::utils::encoding::decode_image;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "John Doe")]
    pub name: String,
    #[schema(example = "+8801712345678")]
    pub phone: Option<String>,
    #[schema(example = "Engineering")]
    pub department: Option<String>,
    #[schema(example = "john.doe@acme.test", format = "email")]
    pub email: String,
    pub manager: Option<String>,
    pub location: Option<String>,
    pub job_position: Option<String>,
    /// Base64 encoded profile picture
    pub prof_pic: Option<String>,

    pub private_info: PrivateInfoInput,
    pub salary: SalaryInput,
    pub resume: Option<ResumeInput>,
}

fn non_blank_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Name must not be empty"));
    }
    Ok(name.to_owned())
}

impl CreateEmployee {
    /// Validates the payload and turns it into the record to insert.
    pub fn into_new(self) -> AppResult<NewEmployee> {
        let name = non_blank_name(&self.name)?;
        validate_email(&self.email)?;
        let prof_pic = decode_image("prof_pic", self.prof_pic.as_deref())?;

        Ok(NewEmployee {
            name,
            email: self.email.trim().to_lowercase(),
            phone: self.phone,
            department: self.department,
            manager: self.manager,
            location: self.location,
            job_position: self.job_position,
            prof_pic,
            private_info: self.private_info,
            salary: self.salary,
            resume: self.resume,
        })
    }
}

/// Basic employee fields an admin may change. `current_status` is owned by
/// the attendance ledger and deliberately absent.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct EmployeeUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    #[schema(format = "email")]
    pub email: Option<String>,
    pub manager: Option<String>,
    pub location: Option<String>,
    pub job_position: Option<String>,
    /// Base64 encoded profile picture
    pub prof_pic: Option<String>,
}

impl EmployeeUpdate {
    pub fn normalized_email(&self) -> Option<String> {
        self.email.as_deref().map(|e| e.trim().to_lowercase())
    }

    pub fn into_update_set(self) -> AppResult<UpdateSet> {
        let name = self.name.as_deref().map(non_blank_name).transpose()?;
        let prof_pic = decode_image("prof_pic", self.prof_pic.as_deref())?;
        let email = self.normalized_email();

        Ok(UpdateSet::new("employee")
            .set("name", name)
            .set("phone", self.phone)
            .set("department", self.department)
            .set("email", email)
            .set("manager", self.manager)
            .set("location", self.location)
            .set("job_position", self.job_position)
            .set("prof_pic", prof_pic))
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SalaryUpdate {
    pub monthly_wage: Option<i64>,
    pub yearly_wage: Option<i64>,
    pub basic_sal: Option<i64>,
    pub hra: Option<i64>,
    pub sa: Option<i64>,
    pub perf_bonus: Option<i64>,
    pub ita: Option<i64>,
    pub fa: Option<i64>,
    pub pf1: Option<i64>,
    pub pf2: Option<i64>,
    pub prof_tax: Option<i64>,
}

impl SalaryUpdate {
    pub fn into_update_set(self) -> UpdateSet {
        UpdateSet::new("salary")
            .set("monthly_wage", self.monthly_wage)
            .set("yearly_wage", self.yearly_wage)
            .set("basic_sal", self.basic_sal)
            .set("hra", self.hra)
            .set("sa", self.sa)
            .set("perf_bonus", self.perf_bonus)
            .set("ita", self.ita)
            .set("fa", self.fa)
            .set("pf1", self.pf1)
            .set("pf2", self.pf2)
            .set("prof_tax", self.prof_tax)
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ResumeUpdate {
    pub about: Option<String>,
    pub skills: Option<String>,
    pub certification: Option<String>,
}

impl ResumeUpdate {
    pub fn into_update_set(self) -> UpdateSet {
        UpdateSet::new("resume")
            .set("about", self.about)
            .set("skills", self.skills)
            .set("certification", self.certification)
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PrivateInfoUpdate {
    #[schema(value_type = Option<String>, format = "date")]
    pub dob: Option<NaiveDate>,
    pub address: Option<String>,
    pub nationality: Option<String>,
    pub gender: Option<String>,
    pub marital_status: Option<bool>,
    #[schema(value_type = Option<String>, format = "date")]
    pub doj: Option<NaiveDate>,
    pub bank_acc_no: Option<String>,
    pub bank_name: Option<String>,
    pub ifsc_code: Option<String>,
    pub pan_no: Option<String>,
    pub uan_no: Option<String>,
}

impl PrivateInfoUpdate {
    pub fn into_update_set(self) -> UpdateSet {
        UpdateSet::new("private_info")
            .set("dob", self.dob)
            .set("address", self.address)
            .set("nationality", self.nationality)
            .set("gender", self.gender)
            .set("marital_status", self.marital_status)
            .set("doj", self.doj)
            .set("bank_acc_no", self.bank_acc_no)
            .set("bank_name", self.bank_name)
            .set("ifsc_code", self.ifsc_code)
            .set("pan_no", self.pan_no)
            .set("uan_no", self.uan_no)
    }
}

#[derive(Deserialize, ToSchema)]
pub struct PasswordUpdate {
    #[schema(example = "newSecurePassword123")]
    pub new_password: String,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub employees: Vec<EmployeeProfile>,
    #[schema(example = 1)]
    pub count: usize,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeCreateResponse {
    #[schema(example = "ACJODO20240001")]
    pub id: String,
    /// Initial password, equal to the id. Shown once.
    #[schema(example = "ACJODO20240001")]
    pub password: String,
    pub name: String,
    pub email: String,
    #[schema(example = "Employee created successfully")]
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeDetailResponse {
    pub employee: EmployeeProfile,
    pub private_info: Option<PrivateInfo>,
    pub salary: Option<Salary>,
    pub resume: Option<Resume>,
    pub attendance_records: Vec<Attendance>,
    pub leave_records: Vec<LeaveRecord>,
    pub summary: Option<Summary>,
}

pub(crate) fn validate_email(email: &str) -> AppResult<()> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(AppError::validation("A valid email address is required")),
    }
}

/// Loads the employee and checks the caller administers its company.
async fn company_employee(pool: &MySqlPool, auth: &AuthUser, emp_id: &str) -> AppResult<Employee> {
    let company_id = auth.require_admin()?;
    let employee = db::employee::require(pool, emp_id).await?;
    auth.require_company_admin(&employee.company_id)
        .inspect_err(|_| debug!(company_id, emp_id, "Cross-company access refused"))?;
    Ok(employee)
}

/// List the admin's employees
#[utoipa::path(
    get,
    path = "/employees",
    responses(
        (status = 200, description = "Employees of the caller's company", body = EmployeeListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn list_employees(auth: AuthUser, pool: web::Data<MySqlPool>) -> AppResult<HttpResponse> {
    let company_id = auth.require_admin()?;

    let employees: Vec<EmployeeProfile> = db::employee::list_for_company(&pool, company_id)
        .await?
        .into_iter()
        .map(EmployeeProfile::from)
        .collect();

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        count: employees.len(),
        employees,
    }))
}

/// Hire an employee
///
/// Creates the employee, private info, salary, optional resume and summary
/// atomically. The generated id doubles as the initial password.
#[utoipa::path(
    post,
    path = "/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created", body = EmployeeCreateResponse),
        (status = 400, description = "Validation failed or email already registered"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
#[instrument(name = "employee_create", skip_all, fields(company_id = %auth.subject))]
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<CreateEmployee>,
) -> AppResult<HttpResponse> {
    let company_id = auth.require_admin()?;
    let new = payload.into_inner().into_new()?;

    let company = db::company::find_by_id(&pool, company_id)
        .await?
        .ok_or(AppError::NotFound("Company"))?;

    if !db::email::is_email_available(&pool, Namespace::Employee, &new.email).await {
        return Err(AppError::EmailTaken);
    }

    let id = db::employee::create(
        &pool,
        company_id,
        &company.company_name,
        &new,
        config.leave_allowance,
    )
    .await?;

    db::email::remember(Namespace::Employee, &new.email).await;

    info!(emp_id = %id, "Employee created");

    Ok(HttpResponse::Created().json(EmployeeCreateResponse {
        password: id.clone(),
        id,
        name: new.name,
        email: new.email,
        message: "Employee created successfully".into(),
    }))
}

/// Employee detail
#[utoipa::path(
    get,
    path = "/employees/{id}",
    params(("id", Path, description = "Employee id")),
    responses(
        (status = 200, description = "Employee with satellites, attendance and leaves", body = EmployeeDetailResponse),
        (status = 403, description = "Employee belongs to a different company"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn get_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let employee = company_employee(&pool, &auth, &path).await?;
    let id = employee.id.as_str();

    let private_info = db::employee::fetch_satellite(&pool, Satellite::PrivateInfo, id).await?;
    let salary = db::employee::fetch_satellite(&pool, Satellite::Salary, id).await?;
    let resume = db::employee::fetch_satellite(&pool, Satellite::Resume, id).await?;
    let summary = db::employee::fetch_satellite(&pool, Satellite::Summary, id).await?;
    let attendance_records = db::attendance::employee_all(&pool, id).await?;
    let leave_records = db::leave::list(&pool, LeaveScope::Employee(id), None).await?;

    Ok(HttpResponse::Ok().json(EmployeeDetailResponse {
        employee: employee.into(),
        private_info,
        salary,
        resume,
        attendance_records,
        leave_records,
        summary,
    }))
}

/// Update basic employee fields
#[utoipa::path(
    put,
    path = "/employees/{id}",
    params(("id", Path, description = "Employee id")),
    request_body = EmployeeUpdate,
    responses(
        (status = 200, description = "Updated employee", body = EmployeeProfile),
        (status = 400, description = "Validation failed or email already registered"),
        (status = 403, description = "Employee belongs to a different company"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
#[instrument(name = "employee_update", skip_all, fields(emp_id = %path))]
pub async fn update_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
    payload: web::Json<EmployeeUpdate>,
) -> AppResult<HttpResponse> {
    let employee = company_employee(&pool, &auth, &path).await?;
    let payload = payload.into_inner();

    let new_email = payload
        .normalized_email()
        .filter(|e| *e != employee.email.to_lowercase());

    if let Some(email) = &new_email {
        validate_email(email)?;
        if !db::email::is_email_available(&pool, Namespace::Employee, email).await {
            return Err(AppError::EmailTaken);
        }
    }

    db::employee::update(&pool, &employee.id, payload.into_update_set()?).await?;

    if let Some(email) = &new_email {
        db::email::forget(Namespace::Employee, &employee.email).await;
        db::email::remember(Namespace::Employee, email).await;
    }

    let updated = db::employee::require(pool.get_ref(), &employee.id).await?;
    Ok(HttpResponse::Ok().json(EmployeeProfile::from(updated)))
}

/// Delete an employee and everything attached to it
#[utoipa::path(
    delete,
    path = "/employees/{id}",
    params(("id", Path, description = "Employee id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Employee belongs to a different company"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
#[instrument(name = "employee_delete", skip_all, fields(emp_id = %path))]
pub async fn delete_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let employee = company_employee(&pool, &auth, &path).await?;

    if !db::employee::delete(&pool, &employee.id).await? {
        return Err(AppError::NotFound("Employee"));
    }

    db::email::forget(Namespace::Employee, &employee.email).await;
    info!("Employee deleted");

    Ok(HttpResponse::NoContent().finish())
}

/// Create or update an employee's resume
#[utoipa::path(
    put,
    path = "/employees/{id}/resume",
    params(("id", Path, description = "Employee id")),
    request_body = ResumeUpdate,
    responses(
        (status = 200, description = "Stored resume", body = Resume),
        (status = 403, description = "Not the employee nor their company's admin"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn update_resume(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
    payload: web::Json<ResumeUpdate>,
) -> AppResult<HttpResponse> {
    let employee = db::employee::require(pool.get_ref(), &path).await?;
    auth.require_owner_or_admin(&employee.id, &employee.company_id)?;

    let resume: Resume = db::employee::upsert_satellite(
        &pool,
        Satellite::Resume,
        &employee.id,
        payload.into_inner().into_update_set(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(resume))
}

/// Create or update an employee's salary
#[utoipa::path(
    put,
    path = "/employees/{id}/salary",
    params(("id", Path, description = "Employee id")),
    request_body = SalaryUpdate,
    responses(
        (status = 200, description = "Stored salary", body = Salary),
        (status = 403, description = "Admin of the employee's company only"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn update_salary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
    payload: web::Json<SalaryUpdate>,
) -> AppResult<HttpResponse> {
    let employee = company_employee(&pool, &auth, &path).await?;

    let salary: Salary = db::employee::upsert_satellite(
        &pool,
        Satellite::Salary,
        &employee.id,
        payload.into_inner().into_update_set(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(salary))
}

/// Create or update an employee's private info
#[utoipa::path(
    put,
    path = "/employees/{id}/private-info",
    params(("id", Path, description = "Employee id")),
    request_body = PrivateInfoUpdate,
    responses(
        (status = 200, description = "Stored private info", body = PrivateInfo),
        (status = 403, description = "Admin of the employee's company only"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn update_private_info(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
    payload: web::Json<PrivateInfoUpdate>,
) -> AppResult<HttpResponse> {
    let employee = company_employee(&pool, &auth, &path).await?;

    let info: PrivateInfo = db::employee::upsert_satellite(
        &pool,
        Satellite::PrivateInfo,
        &employee.id,
        payload.into_inner().into_update_set(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(info))
}

/// Change an employee's password
#[utoipa::path(
    put,
    path = "/employees/{id}/password",
    params(("id", Path, description = "Employee id")),
    request_body = PasswordUpdate,
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 400, description = "Empty password"),
        (status = 403, description = "Not the employee nor their company's admin"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
#[instrument(name = "employee_password", skip_all, fields(emp_id = %path))]
pub async fn update_password(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
    payload: web::Json<PasswordUpdate>,
) -> AppResult<HttpResponse> {
    let employee = db::employee::require(pool.get_ref(), &path).await?;
    auth.require_owner_or_admin(&employee.id, &employee.company_id)?;

    if payload.new_password.is_empty() {
        return Err(AppError::validation("Password must not be empty"));
    }

    let hash = hash_password(&payload.new_password)?;
    db::employee::set_password(&pool, &employee.id, &hash).await?;

    info!("Password updated");
    Ok(HttpResponse::Ok().json(MessageResponse::new("Password updated successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::db_utils::SqlValue;

    #[test]
    fn employee_update_only_touches_provided_fields() {
        let update = EmployeeUpdate {
            department: Some("Ops".into()),
            email: Some("  New@Acme.Test ".into()),
            ..Default::default()
        }
        .into_update_set()
        .unwrap()
        .build("id", "E1")
        .unwrap();

        assert_eq!(update.sql, "UPDATE employee SET department = ?, email = ? WHERE id = ?");
        assert_eq!(update.values[1], SqlValue::String("new@acme.test".into()));
    }

    #[test]
    fn employee_update_never_writes_current_status() {
        let update = EmployeeUpdate {
            name: Some("Jane".into()),
            phone: Some("1".into()),
            department: Some("d".into()),
            email: Some("j@acme.test".into()),
            manager: Some("m".into()),
            location: Some("l".into()),
            job_position: Some("p".into()),
            prof_pic: Some("aGk=".into()),
        }
        .into_update_set()
        .unwrap()
        .build("id", "E1")
        .unwrap();

        assert!(!update.sql.contains("current_status"));
    }

    #[test]
    fn bad_profile_picture_is_a_validation_error() {
        let result = EmployeeUpdate {
            prof_pic: Some("%%%".into()),
            ..Default::default()
        }
        .into_update_set();

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn empty_salary_update_changes_nothing() {
        assert!(SalaryUpdate::default().into_update_set().is_empty());
    }

    #[test]
    fn salary_update_binds_integers() {
        let update = SalaryUpdate {
            hra: Some(1500),
            ..Default::default()
        }
        .into_update_set()
        .build("emp_id", "E1")
        .unwrap();

        assert_eq!(update.sql, "UPDATE salary SET hra = ? WHERE emp_id = ?");
        assert_eq!(update.values[0], SqlValue::I64(1500));
    }

    #[test]
    fn private_info_update_keeps_typed_values() {
        let doj = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let update = PrivateInfoUpdate {
            marital_status: Some(false),
            doj: Some(doj),
            ..Default::default()
        }
        .into_update_set()
        .build("emp_id", "E1")
        .unwrap();

        assert_eq!(update.values, vec![
            SqlValue::Bool(false),
            SqlValue::Date(doj),
            SqlValue::String("E1".into()),
        ]);
    }

    #[test]
    fn resume_update_builds_partial_sql() {
        let update = ResumeUpdate {
            skills: Some("rust".into()),
            ..Default::default()
        }
        .into_update_set()
        .build("emp_id", "E1")
        .unwrap();

        assert_eq!(update.sql, "UPDATE resume SET skills = ? WHERE emp_id = ?");
    }

    fn hire(name: &str, email: &str) -> CreateEmployee {
        serde_json::from_value(serde_json::json!({
            "name": name,
            "email": email,
            "department": "Engineering",
            "private_info": { "doj": "2024-01-01" },
            "salary": {
                "monthly_wage": 50000, "yearly_wage": 600000, "basic_sal": 25000,
                "hra": 10000, "sa": 5000, "perf_bonus": 0, "ita": 0, "fa": 0,
                "pf1": 1800, "pf2": 1800, "prof_tax": 200
            }
        }))
        .unwrap()
    }

    #[test]
    fn hire_payload_is_normalised_for_insert() {
        let new = hire("  John Doe ", " John.Doe@Acme.Test ").into_new().unwrap();

        assert_eq!(new.name, "John Doe");
        assert_eq!(new.email, "john.doe@acme.test");
        assert_eq!(new.joined_on(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(new.department.as_deref(), Some("Engineering"));
        assert!(new.prof_pic.is_none());
        assert!(new.resume.is_none());
    }

    #[test]
    fn hire_rejects_blank_name_bad_email_and_bad_picture() {
        assert!(matches!(hire("   ", "a@b.co").into_new(), Err(AppError::Validation(_))));
        assert!(matches!(hire("Jo", "nope").into_new(), Err(AppError::Validation(_))));

        let mut payload = hire("Jo", "a@b.co");
        payload.prof_pic = Some("%%%".into());
        assert!(matches!(payload.into_new(), Err(AppError::Validation(_))));
    }

    #[test]
    fn blank_name_update_is_rejected() {
        let result = EmployeeUpdate {
            name: Some("   ".into()),
            ..Default::default()
        }
        .into_update_set();

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn name_update_is_trimmed() {
        let update = EmployeeUpdate {
            name: Some("  Jane Roe ".into()),
            ..Default::default()
        }
        .into_update_set()
        .unwrap()
        .build("id", "E1")
        .unwrap();

        assert_eq!(update.values[0], SqlValue::String("Jane Roe".into()));
    }

    #[test]
    fn email_validation() {
        assert!(validate_email("a@b.co").is_ok());
        assert!(validate_email(" a@b.co ").is_ok());
        assert!(validate_email("a@b").is_err());
        assert!(validate_email("@b.co").is_err());
        assert!(validate_email("plain").is_err());
    }
}
