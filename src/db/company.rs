use sqlx::MySqlPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::model::company::Company;

const COMPANY_COLUMNS: &str = "id, company_name, email, password, phone, logo";

pub struct NewCompany {
    pub company_name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub logo: Option<Vec<u8>>,
}

pub async fn find_by_id(pool: &MySqlPool, id: &str) -> AppResult<Option<Company>> {
    let sql = format!("SELECT {COMPANY_COLUMNS} FROM company WHERE id = ?");
    Ok(sqlx::query_as::<_, Company>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?)
}

pub async fn find_by_email(pool: &MySqlPool, email: &str) -> AppResult<Option<Company>> {
    let sql = format!("SELECT {COMPANY_COLUMNS} FROM company WHERE email = ?");
    Ok(sqlx::query_as::<_, Company>(&sql)
        .bind(email)
        .fetch_optional(pool)
        .await?)
}

pub async fn insert(pool: &MySqlPool, new: NewCompany) -> AppResult<Company> {
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO company (id, company_name, email, password, phone, logo)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&new.company_name)
    .bind(&new.email)
    .bind(&new.password_hash)
    .bind(&new.phone)
    .bind(&new.logo)
    .execute(pool)
    .await
    .map_err(|e| {
        if AppError::is_duplicate_key(&e) {
            AppError::EmailTaken
        } else {
            AppError::Db(e)
        }
    })?;

    Ok(Company {
        id,
        company_name: new.company_name,
        email: new.email,
        password: new.password_hash,
        phone: new.phone,
        logo: new.logo,
    })
}
