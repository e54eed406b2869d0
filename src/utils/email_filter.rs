use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures::StreamExt;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::sync::RwLock;

/// Expected capacity and false-positive rate.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

static EMAIL_FILTER: Lazy<RwLock<CuckooFilter<String>>> =
    Lazy::new(|| RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)));

/// Companies and employees have separate email uniqueness constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Company,
    Employee,
}

impl Namespace {
    fn table(self) -> &'static str {
        match self {
            Namespace::Company => "company",
            Namespace::Employee => "employee",
        }
    }
}

#[inline]
pub fn key(ns: Namespace, email: &str) -> String {
    format!("{}:{}", ns.table(), email.trim().to_lowercase())
}

/// Whether an email might be registered (false positives possible).
/// A poisoned lock answers `true` so callers fall through to the database.
pub fn might_exist(ns: Namespace, email: &str) -> bool {
    let key = key(ns, email);
    EMAIL_FILTER
        .read()
        .map(|filter| filter.contains(&key))
        .unwrap_or(true)
}

pub fn insert(ns: Namespace, email: &str) {
    let key = key(ns, email);
    if let Ok(mut filter) = EMAIL_FILTER.write() {
        filter.add(&key);
    }
}

pub fn remove(ns: Namespace, email: &str) {
    let key = key(ns, email);
    if let Ok(mut filter) = EMAIL_FILTER.write() {
        filter.remove(&key);
    }
}

/// Warm up the filter for one namespace using streaming + batching
pub async fn warmup_email_filter(pool: &MySqlPool, ns: Namespace, batch_size: usize) -> Result<()> {
    let sql = format!("SELECT email FROM {}", ns.table());
    let mut stream = sqlx::query_as::<_, (String,)>(&sql).fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total = 0usize;

    while let Some(row) = stream.next().await {
        let (email,) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;

        batch.push(key(ns, &email));
        total += 1;

        if batch.len() == batch_size {
            insert_batch(&batch);
            batch.clear();
        }
    }

    if !batch.is_empty() {
        insert_batch(&batch);
    }

    log::info!("Email filter warmup complete: {} {} emails", total, ns.table());
    Ok(())
}

fn insert_batch(keys: &[String]) {
    if let Ok(mut filter) = EMAIL_FILTER.write() {
        for key in keys {
            filter.add(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_normalized_and_namespaced() {
        assert_eq!(key(Namespace::Company, "  HR@Acme.Test "), "company:hr@acme.test");
        assert_ne!(key(Namespace::Company, "a@b.c"), key(Namespace::Employee, "a@b.c"));
    }

    #[test]
    fn inserted_email_might_exist_until_removed() {
        insert(Namespace::Company, "filter.test@acme.test");
        assert!(might_exist(Namespace::Company, "Filter.Test@acme.test"));

        remove(Namespace::Company, "filter.test@acme.test");
        assert!(!might_exist(Namespace::Company, "filter.test@acme.test"));
    }
}
