use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::store::{InsertOutcome, JobStore, StoreError};
use super::targets::{CareerPage, Company, CompanyDirectory};
use super::types::{JobKey, StoredJobRecord};

const UNIQUE_VIOLATION: &str = "23505";
const CHECK_VIOLATION: &str = "23514";

pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
}

#[async_trait]
impl CompanyDirectory for PgDirectory {
    async fn companies(&self, ids: Option<&[Uuid]>) -> Result<Vec<Company>> {
        let rows = sqlx::query_as::<_, Company>(
            r#"
            SELECT company_id, name, website
            FROM scan.company
            WHERE ($1::uuid[] IS NULL OR company_id = ANY($1))
            ORDER BY added_at, name
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn career_pages(&self, ids: Option<&[Uuid]>) -> Result<Vec<CareerPage>> {
        let rows = sqlx::query_as::<_, CareerPage>(
            r#"
            SELECT company_id, url
            FROM scan.career_page
            WHERE ($1::uuid[] IS NULL OR company_id = ANY($1))
            ORDER BY added_at, url
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn exists(&self, key: &JobKey) -> Result<bool, StoreError> {
        let found: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
              SELECT 1 FROM scan.job_listing
              WHERE company_id = $1 AND title = $2 AND url = $3
            )
            "#,
        )
        .bind(key.company_id)
        .bind(&key.title)
        .bind(&key.url)
        .fetch_one(&self.pool)
        .await?;
        Ok(found)
    }

    async fn insert(&self, record: &StoredJobRecord) -> Result<InsertOutcome, StoreError> {
        let job = &record.job;
        let res = sqlx::query(
            r#"
            INSERT INTO scan.job_listing (company_id, title, description, post_date, due_date,
                is_rolling, acceptance_rate, key_skills, visa_sponsorship, location, term, url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(record.company_id)
        .bind(&job.title)
        .bind(&job.description)
        .bind(job.post_date)
        .bind(job.due_date)
        .bind(job.is_rolling())
        .bind(job.acceptance_rate)
        .bind(&job.key_skills)
        .bind(job.visa_sponsorship)
        .bind(&job.location)
        .bind(&job.term)
        .bind(&job.url)
        .execute(&self.pool)
        .await;

        match res {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                Ok(InsertOutcome::Duplicate)
            }
            Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some(CHECK_VIOLATION) => {
                Err(StoreError::Invalid(db_err.message().to_string()))
            }
            Err(e) => Err(StoreError::Db(e)),
        }
    }
}
