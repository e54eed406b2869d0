pub mod attendance;
pub mod company;
pub mod employee;
pub mod leave_request;
pub mod private_info;
pub mod resume;
pub mod role;
pub mod salary;
pub mod summary;
