use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Serialize, sqlx::FromRow)]
pub struct JobRow {
    pub job_id: i64,
    pub company_id: Uuid,
    pub company_name: String,
    pub title: String,
    pub location: String,
    pub term: Option<String>,
    pub post_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub is_rolling: bool,
    pub acceptance_rate: Option<f64>,
    pub key_skills: Vec<String>,
    pub visa_sponsorship: bool,
    pub url: String,
    pub scraped_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct JobList {
    pub total: usize,
    pub jobs: Vec<JobRow>,
}
