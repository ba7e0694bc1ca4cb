use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

// Parse a posting date as published by job boards: RFC3339, "YYYY-MM-DD",
// naive "YYYY-MM-DDTHH:MM:SS", RFC2822 or US "MM/DD/YYYY".
// Returns None if unparseable; callers pick their own default.
pub fn parse_posting_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() { return None; }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(nd) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(nd);
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(ndt.date());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.date_naive());
    }
    if let Ok(nd) = NaiveDate::parse_from_str(s, "%m/%d/%Y") {
        return Some(nd);
    }
    // "2026-01-15 09:00:00" and other date-first strings: take the leading date
    s.get(..10).and_then(|head| NaiveDate::parse_from_str(head, "%Y-%m-%d").ok())
}

// Scan date used when a source does not publish one
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}
