use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

use super::email_filter::{Namespace, key};

/// Positive cache of emails known to be registered.
pub static EMAIL_CACHE: Lazy<Cache<String, bool>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(200_000)
        .time_to_live(Duration::from_secs(86400)) // 24h TTL
        .build()
});

pub async fn mark_taken(ns: Namespace, email: &str) {
    EMAIL_CACHE.insert(key(ns, email), true).await;
}

/// Forget an email, e.g. after the owning row was deleted or changed.
pub async fn release(ns: Namespace, email: &str) {
    EMAIL_CACHE.invalidate(&key(ns, email)).await;
}

pub async fn is_taken(ns: Namespace, email: &str) -> bool {
    EMAIL_CACHE.get(&key(ns, email)).await.unwrap_or(false)
}

async fn batch_mark(ns: Namespace, emails: &[String]) {
    let futures: Vec<_> = emails
        .iter()
        .map(|e| EMAIL_CACHE.insert(key(ns, e), true))
        .collect();

    futures::future::join_all(futures).await;
}

/// Loads company emails into the cache in batches.
/// Companies are few and sign in often, so they are cached eagerly.
pub async fn warmup_email_cache(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String,)>("SELECT email FROM company").fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        let (email,) = row?;
        batch.push(email);
        total_count += 1;

        if batch.len() >= batch_size {
            batch_mark(Namespace::Company, &batch).await;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        batch_mark(Namespace::Company, &batch).await;
    }

    log::info!("Email cache warmup complete: {} company emails", total_count);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn marked_emails_are_taken_per_namespace() {
        mark_taken(Namespace::Employee, "Cache.Test@Example.com").await;

        assert!(is_taken(Namespace::Employee, "cache.test@example.com").await);
        assert!(!is_taken(Namespace::Company, "cache.test@example.com").await);

        release(Namespace::Employee, "cache.test@example.com").await;
        assert!(!is_taken(Namespace::Employee, "cache.test@example.com").await);
    }
}
