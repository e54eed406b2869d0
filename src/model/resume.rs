use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Resume {
    pub emp_id: String,
    pub about: Option<String>,
    pub skills: Option<String>,
    pub certification: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResumeInput {
    pub about: Option<String>,
    pub skills: Option<String>,
    pub certification: Option<String>,
}
