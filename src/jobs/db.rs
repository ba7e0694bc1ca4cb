use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use super::types::JobRow;

pub async fn list_jobs(pool: &PgPool, company: Option<Uuid>, limit: i64) -> Result<Vec<JobRow>> {
    let rows = sqlx::query_as::<_, JobRow>(
        r#"
        SELECT j.job_id, j.company_id, c.name AS company_name, j.title, j.location, j.term,
               j.post_date, j.due_date, j.is_rolling, j.acceptance_rate, j.key_skills,
               j.visa_sponsorship, j.url, j.scraped_at
        FROM scan.job_listing j
        JOIN scan.company c ON c.company_id = j.company_id
        WHERE ($1::uuid IS NULL OR j.company_id = $1)
        ORDER BY j.post_date DESC, j.job_id DESC
        LIMIT $2
        "#,
    )
    .bind(company)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
