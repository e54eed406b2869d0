use crate::config::Config;
use crate::error::AppError;
use crate::model::role::Role;
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

use super::jwt::verify_token;

/// Identity resolved from the bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// Company id for admins, employee id for employees
    pub subject: String,
    pub role: Role,
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // set by auth_middleware on protected scopes
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let Some(token) = bearer_token(req) else {
            return ready(Err(AppError::unauthorized("Missing token")));
        };

        let Some(config) = req.app_data::<Data<Config>>() else {
            return ready(Err(AppError::Internal("Config missing".into())));
        };

        ready(
            verify_token(token, &config.jwt_secret)
                .map(|claims| AuthUser {
                    subject: claims.sub,
                    role: claims.role,
                })
                .map_err(|_| AppError::unauthorized("Could not validate credentials")),
        )
    }
}

impl AuthUser {
    /// Returns the company id of an admin caller.
    pub fn require_admin(&self) -> Result<&str, AppError> {
        if self.role == Role::Admin {
            Ok(&self.subject)
        } else {
            Err(AppError::forbidden("Admin only"))
        }
    }

    /// Returns the employee id of an employee caller.
    pub fn require_employee(&self) -> Result<&str, AppError> {
        if self.role == Role::Employee {
            Ok(&self.subject)
        } else {
            Err(AppError::forbidden("Employee only"))
        }
    }

    /// Admin of `company_id`, or the employee `employee_id` themself.
    pub fn require_owner_or_admin(&self, employee_id: &str, company_id: &str) -> Result<(), AppError> {
        match self.role {
            Role::Admin if self.subject == company_id => Ok(()),
            Role::Admin => Err(AppError::forbidden(
                "Access denied: Employee belongs to different company",
            )),
            Role::Employee if self.subject == employee_id => Ok(()),
            Role::Employee => Err(AppError::forbidden(
                "Access denied: You can only update your own records",
            )),
        }
    }

    /// Admin of `company_id` only.
    pub fn require_company_admin(&self, company_id: &str) -> Result<(), AppError> {
        if self.require_admin()? == company_id {
            Ok(())
        } else {
            Err(AppError::forbidden(
                "Access denied: Employee belongs to different company",
            ))
        }
    }
}
