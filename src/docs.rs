use crate::api::attendance::{
    CheckInResponse, CheckOutResponse, CompanyAttendanceResponse, EmployeeAttendanceResponse,
    StatusResponse,
};
use crate::api::employee::{
    CreateEmployee, EmployeeCreateResponse, EmployeeDetailResponse, EmployeeListResponse,
    EmployeeUpdate, PasswordUpdate, PrivateInfoUpdate, ResumeUpdate, SalaryUpdate,
};
use crate::api::leave_request::{CreateLeave, LeaveListResponse};
use crate::auth::handlers::EmployeeMe;
use crate::db::attendance::DayRecord;
use crate::model::attendance::Attendance;
use crate::model::company::CompanyProfile;
use crate::model::employee::EmployeeProfile;
use crate::model::leave_request::{LeaveRecord, LeaveStatus};
use crate::model::private_info::{PrivateInfo, PrivateInfoInput};
use crate::model::resume::{Resume, ResumeInput};
use crate::model::salary::{Salary, SalaryInput};
use crate::model::summary::Summary;
use crate::models::{CompanyLogin, CompanySignup, EmployeeLogin, MessageResponse, TokenResponse};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Staffdesk API",
        version = "1.0.0",
        description = r#"
## Staffdesk

Multi-tenant employee management: companies register, hire employees, and
track attendance and leave.

### Key Features
- **Companies** sign up and act as admins of their own employees
- **Employees** are created with private info, salary, resume and a summary
- **Attendance** daily check-in / check-out with worked and extra hours
- **Leave** requests with admin approval or rejection

### Security
Endpoints outside `/auth/*/login` and `/auth/company/signup` need a
**JWT Bearer** token. Companies carry the `admin` role, employees the
`employee` role.

### Errors
Failures are JSON `{ "error": KIND, "message": text }`.
"#,
    ),
    paths(
        crate::auth::handlers::company_signup,
        crate::auth::handlers::company_login,
        crate::auth::handlers::company_logout,
        crate::auth::handlers::company_me,
        crate::auth::handlers::employee_login,
        crate::auth::handlers::employee_logout,
        crate::auth::handlers::employee_me,

        crate::api::employee::list_employees,
        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,
        crate::api::employee::update_resume,
        crate::api::employee::update_salary,
        crate::api::employee::update_private_info,
        crate::api::employee::update_password,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::status,
        crate::api::attendance::company_attendance,
        crate::api::attendance::employee_attendance,

        crate::api::leave_request::request_leave,
        crate::api::leave_request::list_admin,
        crate::api::leave_request::list_emp,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave
    ),
    components(
        schemas(
            CompanySignup,
            CompanyLogin,
            EmployeeLogin,
            TokenResponse,
            MessageResponse,
            CompanyProfile,
            EmployeeProfile,
            EmployeeMe,
            CreateEmployee,
            PrivateInfoInput,
            SalaryInput,
            ResumeInput,
            EmployeeUpdate,
            SalaryUpdate,
            ResumeUpdate,
            PrivateInfoUpdate,
            PasswordUpdate,
            EmployeeListResponse,
            EmployeeCreateResponse,
            EmployeeDetailResponse,
            PrivateInfo,
            Salary,
            Resume,
            Summary,
            Attendance,
            DayRecord,
            CheckInResponse,
            CheckOutResponse,
            StatusResponse,
            CompanyAttendanceResponse,
            EmployeeAttendanceResponse,
            CreateLeave,
            LeaveStatus,
            LeaveRecord,
            LeaveListResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Company and employee sessions"),
        (name = "Employee", description = "Employee administration"),
        (name = "Attendance", description = "Daily attendance ledger"),
        (name = "Leave", description = "Leave requests and decisions"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
