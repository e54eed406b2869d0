use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Monthly salary breakdown, whole currency units.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Salary {
    pub emp_id: String,
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

#[derive(Debug, Deserialize, ToSchema)]
pub struct SalaryInput {
    #[schema(example = 50000)]
    pub monthly_wage: i64,
    #[schema(example = 600000)]
    pub yearly_wage: i64,
    pub basic_sal: i64,
    pub hra: i64,
    pub sa: i64,
    pub perf_bonus: i64,
    pub ita: i64,
    pub fa: i64,
    pub pf1: i64,
    pub pf2: i64,
    pub prof_tax: i64,
}
