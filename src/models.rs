use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::role::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Company id for admins, employee id for employees
    pub sub: String,
    pub role: Role,
    pub exp: usize,
    pub jti: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CompanySignup {
    #[schema(example = "Acme Corp")]
    pub company_name: String,
    #[schema(example = "hr@acme.test", format = "email")]
    pub email: String,
    #[schema(example = "s3cret-pass")]
    pub password: String,
    #[schema(example = "+8801712345678")]
    pub phone: Option<String>,
    /// Base64 encoded logo image
    pub logo: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct CompanyLogin {
    #[schema(example = "hr@acme.test", format = "email")]
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct EmployeeLogin {
    #[schema(example = "ACJODO20240001")]
    pub id: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    #[schema(example = "bearer")]
    pub token_type: String,
    #[schema(example = "admin", value_type = String)]
    pub role: Role,
}

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Successfully logged out")]
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}
