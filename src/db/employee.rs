use chrono::{Datelike, NaiveDate};
use sqlx::mysql::MySqlRow;
use sqlx::{Executor, FromRow, MySql, MySqlConnection, MySqlPool};

use crate::auth::password::hash_password;
use crate::error::{AppError, AppResult};
use crate::model::attendance::EmployeeStatus;
use crate::model::employee::Employee;
use crate::model::private_info::PrivateInfoInput;
use crate::model::resume::ResumeInput;
use crate::model::salary::SalaryInput;
use crate::model::summary::Summary;
use crate::utils::db_utils::{UpdateSet, execute_update};
use crate::utils::employee_code::{employee_id, id_prefix, like_prefix_pattern, next_serial};

const EMPLOYEE_COLUMNS: &str = "id, company_id, name, password, phone, department, email, \
     manager, location, job_position, prof_pic, current_status";

/// A validated hire: name trimmed, email normalised, picture decoded.
#[derive(Debug)]
pub struct NewEmployee {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub manager: Option<String>,
    pub location: Option<String>,
    pub job_position: Option<String>,
    pub prof_pic: Option<Vec<u8>>,
    pub private_info: PrivateInfoInput,
    pub salary: SalaryInput,
    pub resume: Option<ResumeInput>,
}

impl NewEmployee {
    pub fn joined_on(&self) -> NaiveDate {
        self.private_info.doj
    }
}

/// 1:1 records hanging off an employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Satellite {
    PrivateInfo,
    Salary,
    Resume,
    Summary,
}

impl Satellite {
    pub fn table(self) -> &'static str {
        match self {
            Satellite::PrivateInfo => "private_info",
            Satellite::Salary => "salary",
            Satellite::Resume => "resume",
            Satellite::Summary => "summary",
        }
    }
}

fn map_unique(e: sqlx::Error) -> AppError {
    if AppError::is_duplicate_key(&e) {
        AppError::EmailTaken
    } else {
        AppError::Db(e)
    }
}

pub async fn find_by_id<'e, E>(executor: E, id: &str) -> AppResult<Option<Employee>>
where
    E: Executor<'e, Database = MySql>,
{
    let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employee WHERE id = ?");
    Ok(sqlx::query_as::<_, Employee>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?)
}

/// Loads the employee or fails with 404.
pub async fn require<'e, E>(executor: E, id: &str) -> AppResult<Employee>
where
    E: Executor<'e, Database = MySql>,
{
    find_by_id(executor, id)
        .await?
        .ok_or(AppError::NotFound("Employee"))
}

pub async fn list_for_company(pool: &MySqlPool, company_id: &str) -> AppResult<Vec<Employee>> {
    let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employee WHERE company_id = ? ORDER BY id");
    Ok(sqlx::query_as::<_, Employee>(&sql)
        .bind(company_id)
        .fetch_all(pool)
        .await?)
}

pub async fn count_for_company(pool: &MySqlPool, company_id: &str) -> AppResult<i64> {
    Ok(
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employee WHERE company_id = ?")
            .bind(company_id)
            .fetch_one(pool)
            .await?,
    )
}

async fn allocate_id(
    conn: &mut MySqlConnection,
    company_name: &str,
    full_name: &str,
    year: i32,
) -> AppResult<String> {
    let prefix = id_prefix(company_name, full_name, year);

    // locks the prefix range so concurrent hires cannot pick the same serial
    let issued: Vec<String> =
        sqlx::query_scalar("SELECT id FROM employee WHERE id LIKE ? FOR UPDATE")
            .bind(like_prefix_pattern(&prefix))
            .fetch_all(&mut *conn)
            .await?;

    Ok(employee_id(&prefix, next_serial(&prefix, &issued)))
}

/// Creates the employee with private info, salary, optional resume and a
/// seeded summary in one transaction. Returns the generated id, which is
/// also the initial password.
pub async fn create(
    pool: &MySqlPool,
    company_id: &str,
    company_name: &str,
    new: &NewEmployee,
    leave_allowance: i32,
) -> AppResult<String> {
    let mut tx = pool.begin().await?;

    let id = allocate_id(&mut tx, company_name, &new.name, new.joined_on().year()).await?;
    let password_hash = hash_password(&id)?;

    sqlx::query(
        r#"
        INSERT INTO employee
            (id, company_id, name, password, phone, department, email,
             manager, location, job_position, prof_pic, current_status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(company_id)
    .bind(&new.name)
    .bind(&password_hash)
    .bind(&new.phone)
    .bind(&new.department)
    .bind(&new.email)
    .bind(&new.manager)
    .bind(&new.location)
    .bind(&new.job_position)
    .bind(&new.prof_pic)
    .bind(EmployeeStatus::Idle.code())
    .execute(&mut *tx)
    .await
    .map_err(map_unique)?;

    let p = &new.private_info;
    sqlx::query(
        r#"
        INSERT INTO private_info
            (emp_id, dob, address, nationality, gender, marital_status, doj,
             bank_acc_no, bank_name, ifsc_code, pan_no, uan_no)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(p.dob)
    .bind(&p.address)
    .bind(&p.nationality)
    .bind(&p.gender)
    .bind(p.marital_status)
    .bind(p.doj)
    .bind(&p.bank_acc_no)
    .bind(&p.bank_name)
    .bind(&p.ifsc_code)
    .bind(&p.pan_no)
    .bind(&p.uan_no)
    .execute(&mut *tx)
    .await?;

    let s = &new.salary;
    sqlx::query(
        r#"
        INSERT INTO salary
            (emp_id, monthly_wage, yearly_wage, basic_sal, hra, sa, perf_bonus,
             ita, fa, pf1, pf2, prof_tax)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(s.monthly_wage)
    .bind(s.yearly_wage)
    .bind(s.basic_sal)
    .bind(s.hra)
    .bind(s.sa)
    .bind(s.perf_bonus)
    .bind(s.ita)
    .bind(s.fa)
    .bind(s.pf1)
    .bind(s.pf2)
    .bind(s.prof_tax)
    .execute(&mut *tx)
    .await?;

    if let Some(r) = &new.resume {
        sqlx::query("INSERT INTO resume (emp_id, about, skills, certification) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(&r.about)
            .bind(&r.skills)
            .bind(&r.certification)
            .execute(&mut *tx)
            .await?;
    }

    let summary = Summary::initial(&id, leave_allowance);
    sqlx::query(
        r#"
        INSERT INTO summary (emp_id, present_days, leave_count, leave_left, tot_work_days)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&summary.emp_id)
    .bind(summary.present_days)
    .bind(summary.leave_count)
    .bind(summary.leave_left)
    .bind(summary.tot_work_days)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(id)
}

/// Applies a partial update to the employee row. `false` when nothing was
/// provided.
pub async fn update(pool: &MySqlPool, id: &str, set: UpdateSet) -> AppResult<bool> {
    let Some(update) = set.build("id", id) else {
        return Ok(false);
    };

    execute_update(pool, update).await.map_err(map_unique)?;
    Ok(true)
}

pub async fn set_password(pool: &MySqlPool, id: &str, password_hash: &str) -> AppResult<()> {
    sqlx::query("UPDATE employee SET password = ? WHERE id = ?")
        .bind(password_hash)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Removes the employee; the schema cascades to every dependent row.
pub async fn delete(pool: &MySqlPool, id: &str) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM employee WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn fetch_satellite<T>(pool: &MySqlPool, which: Satellite, emp_id: &str) -> AppResult<Option<T>>
where
    T: for<'r> FromRow<'r, MySqlRow> + Send + Unpin,
{
    let sql = format!("SELECT * FROM {} WHERE emp_id = ?", which.table());
    Ok(sqlx::query_as::<_, T>(&sql)
        .bind(emp_id)
        .fetch_optional(pool)
        .await?)
}

/// Creates the satellite row if missing, merges the provided fields and
/// returns the stored result, all in one transaction.
pub async fn upsert_satellite<T>(
    pool: &MySqlPool,
    which: Satellite,
    emp_id: &str,
    set: UpdateSet,
) -> AppResult<T>
where
    T: for<'r> FromRow<'r, MySqlRow> + Send + Unpin,
{
    let mut tx = pool.begin().await?;

    let insert = format!(
        "INSERT INTO {} (emp_id) VALUES (?) ON DUPLICATE KEY UPDATE emp_id = emp_id",
        which.table()
    );
    sqlx::query(&insert).bind(emp_id).execute(&mut *tx).await?;

    if let Some(update) = set.build("emp_id", emp_id) {
        execute_update(&mut *tx, update).await?;
    }

    let select = format!("SELECT * FROM {} WHERE emp_id = ?", which.table());
    let stored = sqlx::query_as::<_, T>(&select)
        .bind(emp_id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(stored)
}
