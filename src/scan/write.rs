use serde::Serialize;
use uuid::Uuid;

use super::normalize::is_internship_title;
use super::store::{InsertOutcome, JobStore};
use super::types::{NormalizedJob, StoredJobRecord};

/// Link texts that leak through extraction as titles on some boards.
const TITLE_BLOCKLIST: &[&str] = &["internal career site", "career site", "careers", "jobs", "view jobs", "search jobs"];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PersistCounts {
    pub inserted: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub fn is_persistable_title(title: &str) -> bool {
    let folded = title.trim().to_lowercase();
    !TITLE_BLOCKLIST.contains(&folded.as_str()) && is_internship_title(&folded)
}

/// Store each job unless its (company, title, url) key is already present.
/// A failing row is logged and counted; the batch carries on.
pub async fn persist(store: &dyn JobStore, company_id: Uuid, jobs: Vec<NormalizedJob>) -> PersistCounts {
    let mut counts = PersistCounts::default();
    for job in jobs {
        if !is_persistable_title(&job.title) {
            tracing::debug!(title = %job.title, "blocked title");
            continue;
        }
        let record = StoredJobRecord { company_id, job };
        let key = record.key();
        match store.exists(&key).await {
            Ok(true) => {
                counts.skipped += 1;
                continue;
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(title = %key.title, url = %key.url, error = %e, "existence check failed");
                counts.failed += 1;
                continue;
            }
        }
        match store.insert(&record).await {
            Ok(InsertOutcome::Inserted) => counts.inserted += 1,
            Ok(InsertOutcome::Duplicate) => counts.skipped += 1,
            Err(e) => {
                tracing::warn!(title = %key.title, url = %key.url, error = %e, "insert failed");
                counts.failed += 1;
            }
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::store::mock::MemoryJobStore;
    use crate::scan::store::StoreError;
    use crate::scan::types::JobKey;
    use async_trait::async_trait;
    use chrono::NaiveDate;

    fn job(title: &str, url: &str) -> NormalizedJob {
        NormalizedJob {
            title: title.into(),
            description: String::new(),
            post_date: NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
            due_date: None,
            acceptance_rate: None,
            key_skills: vec![],
            visa_sponsorship: false,
            location: "Location not specified".into(),
            term: None,
            url: url.into(),
        }
    }

    #[test]
    fn blocklist_and_marker() {
        assert!(!is_persistable_title("  Internal Career Site "));
        assert!(!is_persistable_title("Careers"));
        assert!(!is_persistable_title("Staff Engineer"));
        assert!(is_persistable_title("Software Engineering Intern"));
    }

    #[tokio::test]
    async fn second_run_inserts_nothing() {
        let store = MemoryJobStore::new();
        let company = Uuid::new_v4();
        let batch = || vec![job("Data Intern", "https://a/1"), job("Data Intern", ""), job("careers", "https://a/2")];

        let first = persist(&store, company, batch()).await;
        assert_eq!(first, PersistCounts { inserted: 2, skipped: 0, failed: 0 });

        let second = persist(&store, company, batch()).await;
        assert_eq!(second, PersistCounts { inserted: 0, skipped: 2, failed: 0 });
        assert_eq!(store.records().len(), 2);
    }

    #[tokio::test]
    async fn row_failure_does_not_stop_batch() {
        let store = MemoryJobStore::failing_on("Audio Intern");
        let got = persist(&store, Uuid::new_v4(), vec![job("Audio Intern", "u1"), job("Video Intern", "u2")]).await;
        assert_eq!(got, PersistCounts { inserted: 1, skipped: 0, failed: 1 });
    }

    /// Reports every key as absent, then loses the race on insert.
    struct Racing;

    #[async_trait]
    impl JobStore for Racing {
        async fn exists(&self, _key: &JobKey) -> Result<bool, StoreError> { Ok(false) }
        async fn insert(&self, _record: &StoredJobRecord) -> Result<InsertOutcome, StoreError> {
            Ok(InsertOutcome::Duplicate)
        }
    }

    #[tokio::test]
    async fn unique_violation_counts_as_skipped() {
        let got = persist(&Racing, Uuid::new_v4(), vec![job("Data Intern", "u")]).await;
        assert_eq!(got, PersistCounts { inserted: 0, skipped: 1, failed: 0 });
    }
}
