use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::Serialize;
use utoipa::ToSchema;

use super::attendance::EmployeeStatus;
use super::role::Role;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Employee {
    pub id: String,
    pub company_id: String,
    pub name: String,
    pub password: String,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub email: String,
    pub manager: Option<String>,
    pub location: Option<String>,
    pub job_position: Option<String>,
    pub prof_pic: Option<Vec<u8>>,
    pub current_status: i32,
}

/// Employee as returned to clients; never carries the password hash.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[schema(
    example = json!({
        "id": "ACJODO20240001",
        "company_id": "3f1c2a9e-6f43-4d0b-9a55-2f6f7c1b8e21",
        "name": "John Doe",
        "phone": "+8801712345678",
        "department": "Engineering",
        "email": "john.doe@acme.test",
        "manager": "Jane Roe",
        "location": "Dhaka",
        "job_position": "Backend Engineer",
        "prof_pic": null,
        "current_status": 0,
        "status": "idle",
        "role": "employee"
    })
)]
pub struct EmployeeProfile {
    pub id: String,
    pub company_id: String,
    pub name: String,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub email: String,
    pub manager: Option<String>,
    pub location: Option<String>,
    pub job_position: Option<String>,
    /// Base64 encoded profile picture
    pub prof_pic: Option<String>,
    pub current_status: i32,
    /// `current_status` spelled out
    pub status: Option<String>,
    #[schema(value_type = String)]
    pub role: Role,
}

impl From<Employee> for EmployeeProfile {
    fn from(e: Employee) -> Self {
        Self {
            id: e.id,
            company_id: e.company_id,
            name: e.name,
            phone: e.phone,
            department: e.department,
            email: e.email,
            manager: e.manager,
            location: e.location,
            job_position: e.job_position,
            prof_pic: e.prof_pic.map(|bytes| STANDARD.encode(bytes)),
            current_status: e.current_status,
            status: EmployeeStatus::from_code(e.current_status).map(|s| s.to_string()),
            role: Role::Employee,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(current_status: i32) -> Employee {
        Employee {
            id: "ACJODO20240001".into(),
            company_id: "C1".into(),
            name: "John Doe".into(),
            password: "$argon2id$secret".into(),
            phone: None,
            department: None,
            email: "john@acme.test".into(),
            manager: None,
            location: None,
            job_position: None,
            prof_pic: Some(b"hi".to_vec()),
            current_status,
        }
    }

    #[test]
    fn profile_hides_the_password_hash() {
        let json = serde_json::to_string(&EmployeeProfile::from(employee(0))).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"prof_pic\":\"aGk=\""));
    }

    #[test]
    fn profile_spells_out_the_status_code() {
        assert_eq!(EmployeeProfile::from(employee(1)).status.as_deref(), Some("checked_in"));
        assert_eq!(EmployeeProfile::from(employee(9)).status, None);
    }
}
