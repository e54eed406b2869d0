use sqlx::MySqlPool;

use crate::utils::email_cache;
use crate::utils::email_filter::{self, Namespace};

/// true  => email AVAILABLE
/// false => email TAKEN
///
/// The filter answers "definitely new" cheaply, the cache answers "known
/// taken", and the database decides everything in between. The unique
/// index remains the final guard against races.
pub async fn is_email_available(pool: &MySqlPool, ns: Namespace, email: &str) -> bool {
    let email = email.trim().to_lowercase();

    if !email_filter::might_exist(ns, &email) {
        return true;
    }

    if email_cache::is_taken(ns, &email).await {
        return false;
    }

    let sql = match ns {
        Namespace::Company => "SELECT EXISTS(SELECT 1 FROM company WHERE email = ? LIMIT 1)",
        Namespace::Employee => "SELECT EXISTS(SELECT 1 FROM employee WHERE email = ? LIMIT 1)",
    };

    let exists = sqlx::query_scalar::<_, bool>(sql)
        .bind(&email)
        .fetch_one(pool)
        .await
        .unwrap_or(true); // fail-safe

    if exists {
        email_cache::mark_taken(ns, &email).await;
        return false;
    }

    true
}

/// Record a freshly committed email.
pub async fn remember(ns: Namespace, email: &str) {
    email_filter::insert(ns, email);
    email_cache::mark_taken(ns, email).await;
}

/// Forget an email whose owner was deleted or changed address.
pub async fn forget(ns: Namespace, email: &str) {
    email_filter::remove(ns, email);
    email_cache::release(ns, email).await;
}
