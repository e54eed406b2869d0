use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::Serialize;
use utoipa::ToSchema;

use super::role::Role;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Company {
    pub id: String,
    pub company_name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub logo: Option<Vec<u8>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CompanyProfile {
    #[schema(example = "3f1c2a9e-6f43-4d0b-9a55-2f6f7c1b8e21")]
    pub id: String,
    #[schema(example = "Acme Corp")]
    pub company_name: String,
    #[schema(example = "hr@acme.test", format = "email")]
    pub email: String,
    #[schema(example = "+8801712345678", nullable = true)]
    pub phone: Option<String>,
    /// Base64 encoded logo image
    #[schema(nullable = true)]
    pub logo: Option<String>,
    #[schema(example = "admin", value_type = String)]
    pub role: Role,
}

impl From<Company> for CompanyProfile {
    fn from(c: Company) -> Self {
        Self {
            id: c.id,
            company_name: c.company_name,
            email: c.email,
            phone: c.phone,
            logo: c.logo.map(|bytes| STANDARD.encode(bytes)),
            role: Role::Admin,
        }
    }
}
