use async_trait::async_trait;

use super::types::{JobKey, StoredJobRecord};

#[derive(Debug)]
pub enum StoreError {
    Db(sqlx::Error),
    Invalid(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Db(err) => write!(f, "database error: {err}"),
            StoreError::Invalid(msg) => write!(f, "invalid record: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Db(err) => Some(err),
            StoreError::Invalid(_) => None,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self { StoreError::Db(err) }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The uniqueness key was already taken, possibly by a concurrent scan.
    Duplicate,
}

/// Job storage keyed by (company, title, url-or-empty).
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn exists(&self, key: &JobKey) -> Result<bool, StoreError>;
    async fn insert(&self, record: &StoredJobRecord) -> Result<InsertOutcome, StoreError>;
}

#[cfg(test)]
pub mod mock {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// In-memory store; titles listed in `failing` make `insert` error out.
    #[derive(Default)]
    pub struct MemoryJobStore {
        rows: Mutex<HashMap<JobKey, StoredJobRecord>>,
        failing: Vec<String>,
    }

    impl MemoryJobStore {
        pub fn new() -> Self { Self::default() }

        pub fn failing_on(title: &str) -> Self {
            Self { failing: vec![title.to_string()], ..Self::default() }
        }

        pub fn records(&self) -> Vec<StoredJobRecord> {
            self.rows.lock().unwrap().values().cloned().collect()
        }
    }

    #[async_trait]
    impl JobStore for MemoryJobStore {
        async fn exists(&self, key: &JobKey) -> Result<bool, StoreError> {
            Ok(self.rows.lock().unwrap().contains_key(key))
        }

        async fn insert(&self, record: &StoredJobRecord) -> Result<InsertOutcome, StoreError> {
            if self.failing.contains(&record.job.title) {
                return Err(StoreError::Invalid(format!("refused {}", record.job.title)));
            }
            let mut rows = self.rows.lock().unwrap();
            if rows.contains_key(&record.key()) {
                return Ok(InsertOutcome::Duplicate);
            }
            rows.insert(record.key(), record.clone());
            Ok(InsertOutcome::Inserted)
        }
    }
}
