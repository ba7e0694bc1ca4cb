use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use super::types::CompanyRow;

// Names match case-insensitively through the lower(name) unique index.
const UPSERT_COMPANY_SQL: &str = r#"
    INSERT INTO scan.company (name, website)
    VALUES ($1, $2)
    ON CONFLICT ((lower(name)))
    DO UPDATE SET website = COALESCE(EXCLUDED.website, scan.company.website)
    RETURNING company_id, (xmax = 0) AS inserted
"#;

/// Returns the company id and whether the row is new. An existing company
/// keeps its website unless a new one is given.
pub async fn upsert_company(pool: &PgPool, name: &str, website: Option<&str>) -> Result<(Uuid, bool)> {
    let row: (Uuid, bool) = sqlx::query_as(UPSERT_COMPANY_SQL)
    .bind(name)
    .bind(website)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn company_name(pool: &PgPool, company_id: Uuid) -> Result<Option<String>> {
    let name = sqlx::query_scalar("SELECT name FROM scan.company WHERE company_id = $1")
        .bind(company_id)
        .fetch_optional(pool)
        .await?;
    Ok(name)
}

pub async fn insert_career_page(pool: &PgPool, company_id: Uuid, url: &str) -> Result<bool> {
    let exec = sqlx::query(
        r#"
        INSERT INTO scan.career_page (company_id, url)
        VALUES ($1, $2)
        ON CONFLICT (company_id, url) DO NOTHING
        "#,
    )
    .bind(company_id)
    .bind(url)
    .execute(pool)
    .await?;
    Ok(exec.rows_affected() == 1)
}

pub async fn list_companies(pool: &PgPool) -> Result<Vec<CompanyRow>> {
    let rows = sqlx::query_as::<_, CompanyRow>(
        r#"
        SELECT c.company_id,
               c.name,
               c.website,
               c.added_at,
               COALESCE(array_agg(p.url ORDER BY p.url) FILTER (WHERE p.url IS NOT NULL), '{}') AS career_pages
        FROM scan.company c
        LEFT JOIN scan.career_page p ON p.company_id = c.company_id
        GROUP BY c.company_id
        ORDER BY c.added_at, c.name
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIGRATION: &str = include_str!("../../migrations/0001_init.sql");

    #[test]
    fn company_names_conflict_case_insensitively() {
        assert!(UPSERT_COMPANY_SQL.contains("ON CONFLICT ((lower(name)))"));
        assert!(MIGRATION.contains("CREATE UNIQUE INDEX IF NOT EXISTS company_name_lower_idx ON scan.company (lower(name));"));
        assert!(!MIGRATION.contains("name       TEXT NOT NULL UNIQUE"));
    }
}
