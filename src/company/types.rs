use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Serialize)]
pub struct CompanyAddPlan {
    pub action: &'static str,
    pub name: String,
    pub website: Option<String>,
}

#[derive(Serialize)]
pub struct CompanyAddResult {
    pub inserted: bool,
    pub company_id: Uuid,
    pub name: String,
}

#[derive(Serialize)]
pub struct CareerPagePlan {
    pub action: &'static str,
    pub company_id: Uuid,
    pub url: String,
}

#[derive(Serialize)]
pub struct CareerPageResult {
    pub inserted: bool,
    pub company_id: Uuid,
    pub url: String,
}

#[derive(Serialize, sqlx::FromRow)]
pub struct CompanyRow {
    pub company_id: Uuid,
    pub name: String,
    pub website: Option<String>,
    pub added_at: DateTime<Utc>,
    pub career_pages: Vec<String>,
}

#[derive(Serialize)]
pub struct CompanyList {
    pub companies: Vec<CompanyRow>,
}
