use actix_web::{HttpResponse, web};
use serde::Serialize;
use sqlx::MySqlPool;
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

use crate::{
    api::employee::validate_email,
    auth::{
        auth::AuthUser,
        jwt::generate_access_token,
        password::{hash_password, verify_password},
    },
    config::Config,
    db::{self, company::NewCompany, employee::Satellite},
    error::{AppError, AppResult},
    model::{
        company::CompanyProfile, employee::EmployeeProfile, private_info::PrivateInfo,
        resume::Resume, role::Role, salary::Salary,
    },
    models::{CompanyLogin, CompanySignup, EmployeeLogin, MessageResponse, TokenResponse},
    utils::{email_filter::Namespace, encoding::decode_image},
};

const BAD_CREDENTIALS: &str = "Incorrect email or password";

/// Employee profile as seen by the employee, with the records they own.
#[derive(Serialize, ToSchema)]
pub struct EmployeeMe {
    #[serde(flatten)]
    pub profile: EmployeeProfile,
    pub private_info: Option<PrivateInfo>,
    pub resume: Option<Resume>,
    pub salary: Option<Salary>,
}

fn token_response(subject: &str, role: Role, config: &Config) -> AppResult<TokenResponse> {
    Ok(TokenResponse {
        access_token: generate_access_token(subject, role, &config.jwt_secret, config.access_token_ttl)?,
        token_type: "bearer".into(),
        role,
    })
}

/// Register a company
#[utoipa::path(
    post,
    path = "/auth/company/signup",
    request_body = CompanySignup,
    responses(
        (status = 201, description = "Company registered", body = CompanyProfile),
        (status = 400, description = "Validation failed, bad logo or email already registered"),
        (status = 429, description = "Too many requests")
    ),
    tag = "Auth"
)]
#[instrument(name = "company_signup", skip_all, fields(email = %payload.email))]
pub async fn company_signup(
    payload: web::Json<CompanySignup>,
    pool: web::Data<MySqlPool>,
) -> AppResult<HttpResponse> {
    info!("Signup request received");

    let payload = payload.into_inner();
    let email = payload.email.trim().to_lowercase();

    if payload.company_name.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::validation("Company name and password must not be empty"));
    }
    validate_email(&email)?;

    let logo = decode_image("logo", payload.logo.as_deref())
        .map_err(|_| AppError::validation("Invalid base64 logo format"))?;

    if !db::email::is_email_available(&pool, Namespace::Company, &email).await {
        debug!("Email already registered");
        return Err(AppError::EmailTaken);
    }

    let company = db::company::insert(
        &pool,
        NewCompany {
            company_name: payload.company_name.trim().to_owned(),
            email,
            password_hash: hash_password(&payload.password)?,
            phone: payload.phone,
            logo,
        },
    )
    .await?;

    db::email::remember(Namespace::Company, &company.email).await;

    info!(company_id = %company.id, "Company registered");
    Ok(HttpResponse::Created().json(CompanyProfile::from(company)))
}

/// Company admin login
#[utoipa::path(
    post,
    path = "/auth/company/login",
    request_body = CompanyLogin,
    responses(
        (status = 200, description = "Access token for the company admin", body = TokenResponse),
        (status = 401, description = "Incorrect email or password"),
        (status = 429, description = "Too many requests")
    ),
    tag = "Auth"
)]
#[instrument(name = "company_login", skip_all, fields(email = %payload.email))]
pub async fn company_login(
    payload: web::Json<CompanyLogin>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    info!("Login request received");

    let email = payload.email.trim().to_lowercase();
    let company = db::company::find_by_email(&pool, &email).await?;

    let Some(company) = company.filter(|c| verify_password(&payload.password, &c.password)) else {
        info!("Invalid credentials");
        return Err(AppError::unauthorized(BAD_CREDENTIALS));
    };

    info!(company_id = %company.id, "Login successful");
    Ok(HttpResponse::Ok().json(token_response(&company.id, Role::Admin, &config)?))
}

/// Company admin logout
///
/// Tokens are stateless; the client discards its copy.
#[utoipa::path(
    post,
    path = "/auth/company/logout",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn company_logout(auth: AuthUser) -> AppResult<HttpResponse> {
    auth.require_admin()?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Successfully logged out")))
}

/// The calling company
#[utoipa::path(
    get,
    path = "/auth/company/me",
    responses(
        (status = 200, description = "Company profile", body = CompanyProfile),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn company_me(auth: AuthUser, pool: web::Data<MySqlPool>) -> AppResult<HttpResponse> {
    let company_id = auth.require_admin()?;

    let company = db::company::find_by_id(&pool, company_id)
        .await?
        .ok_or(AppError::NotFound("Company"))?;

    Ok(HttpResponse::Ok().json(CompanyProfile::from(company)))
}

/// Employee login by employee id
#[utoipa::path(
    post,
    path = "/auth/employee/login",
    request_body = EmployeeLogin,
    responses(
        (status = 200, description = "Access token for the employee", body = TokenResponse),
        (status = 401, description = "Incorrect id or password"),
        (status = 429, description = "Too many requests")
    ),
    tag = "Auth"
)]
#[instrument(name = "employee_login", skip_all, fields(emp_id = %payload.id))]
pub async fn employee_login(
    payload: web::Json<EmployeeLogin>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    info!("Login request received");

    let employee = db::employee::find_by_id(pool.get_ref(), payload.id.trim()).await?;

    let Some(employee) = employee.filter(|e| verify_password(&payload.password, &e.password))
    else {
        info!("Invalid credentials");
        return Err(AppError::unauthorized(BAD_CREDENTIALS));
    };

    info!("Login successful");
    Ok(HttpResponse::Ok().json(token_response(&employee.id, Role::Employee, &config)?))
}

/// Employee logout
#[utoipa::path(
    post,
    path = "/auth/employee/logout",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Employee only")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn employee_logout(auth: AuthUser) -> AppResult<HttpResponse> {
    auth.require_employee()?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Successfully logged out")))
}

/// The calling employee with private info, resume and salary
#[utoipa::path(
    get,
    path = "/auth/employee/me",
    responses(
        (status = 200, description = "Employee profile", body = EmployeeMe),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Employee only"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn employee_me(auth: AuthUser, pool: web::Data<MySqlPool>) -> AppResult<HttpResponse> {
    let emp_id = auth.require_employee()?;
    let employee = db::employee::require(pool.get_ref(), emp_id).await?;

    let private_info = db::employee::fetch_satellite(&pool, Satellite::PrivateInfo, emp_id).await?;
    let resume = db::employee::fetch_satellite(&pool, Satellite::Resume, emp_id).await?;
    let salary = db::employee::fetch_satellite(&pool, Satellite::Salary, emp_id).await?;

    Ok(HttpResponse::Ok().json(EmployeeMe {
        profile: employee.into(),
        private_info,
        resume,
        salary,
    }))
}
