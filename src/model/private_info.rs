use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct PrivateInfo {
    pub emp_id: String,
    #[schema(value_type = Option<String>, format = "date")]
    pub dob: Option<NaiveDate>,
    pub address: Option<String>,
    pub nationality: Option<String>,
    pub gender: Option<String>,
    pub marital_status: Option<bool>,
    /// Date of joining
    #[schema(value_type = Option<String>, format = "date")]
    pub doj: Option<NaiveDate>,
    pub bank_acc_no: Option<String>,
    pub bank_name: Option<String>,
    pub ifsc_code: Option<String>,
    pub pan_no: Option<String>,
    pub uan_no: Option<String>,
}

/// Private info supplied at hire time.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PrivateInfoInput {
    #[schema(example = "1995-04-12", value_type = Option<String>, format = "date")]
    pub dob: Option<NaiveDate>,
    pub address: Option<String>,
    pub nationality: Option<String>,
    pub gender: Option<String>,
    pub marital_status: Option<bool>,
    /// Date of joining; its year is part of the employee id
    #[schema(example = "2024-01-01", value_type = String, format = "date")]
    pub doj: NaiveDate,
    pub bank_acc_no: Option<String>,
    pub bank_name: Option<String>,
    pub ifsc_code: Option<String>,
    pub pan_no: Option<String>,
    pub uan_no: Option<String>,
}
