use scraper::{Html, Selector};
use serde_json::Value;

use crate::scan::normalize::html_to_text;
use crate::scan::types::RawPosting;
use crate::util::time::parse_posting_date;

/// Every `application/ld+json` block on the page that describes a job posting.
///
/// Blocks that fail to parse are skipped and reported in the second element.
pub fn extract(doc: &Html, page_url: &str) -> (Vec<RawPosting>, Vec<String>) {
    let mut out = Vec::new();
    let mut errors = Vec::new();
    let Ok(sel) = Selector::parse(r#"script[type="application/ld+json"]"#) else { return (out, errors) };

    for (i, block) in doc.select(&sel).enumerate() {
        let raw = block.text().collect::<String>();
        let value: Value = match serde_json::from_str(raw.trim()) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(block = i, error = %e, "skip malformed ld+json block");
                errors.push(format!("ld+json block {i}: {e}"));
                continue;
            }
        };
        for item in items(&value) {
            if let Some(p) = posting(item, page_url) {
                out.push(p);
            }
        }
    }
    (out, errors)
}

// A block is one object, an array of objects, or an object carrying `@graph`.
fn items(v: &Value) -> Vec<&Value> {
    match v {
        Value::Array(arr) => arr.iter().flat_map(items).collect(),
        Value::Object(map) => match map.get("@graph") {
            Some(graph) => items(graph),
            None => vec![v],
        },
        _ => vec![],
    }
}

fn is_job_posting(item: &Value) -> bool {
    let is_jp = |t: &Value| t.as_str().is_some_and(|s| s.trim_start_matches("schema:") == "JobPosting");
    match item.get("@type") {
        Some(Value::Array(types)) => types.iter().any(is_jp),
        Some(t) => is_jp(t),
        None => false,
    }
}

fn str_field<'a>(item: &'a Value, key: &str) -> Option<&'a str> {
    item.get(key).and_then(Value::as_str).map(str::trim).filter(|s| !s.is_empty())
}

fn posting(item: &Value, page_url: &str) -> Option<RawPosting> {
    if !is_job_posting(item) { return None; }
    let title = str_field(item, "title").or_else(|| str_field(item, "name"))?;
    Some(RawPosting {
        title: title.to_string(),
        description_text: str_field(item, "description").map(html_to_text).unwrap_or_default(),
        posted_at: str_field(item, "datePosted").and_then(parse_posting_date),
        valid_through: str_field(item, "validThrough").and_then(parse_posting_date),
        raw_location_text: location(item),
        source_url: str_field(item, "url").unwrap_or(page_url).to_string(),
        context: String::new(),
    })
}

// jobLocation may be an object or a list of them; address may be a string.
fn location(item: &Value) -> Option<String> {
    let place = match item.get("jobLocation") {
        Some(Value::Array(places)) => places.first(),
        other => other,
    };
    let from_address = place.and_then(|p| p.get("address")).and_then(|addr| match addr {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        _ => ["addressLocality", "addressRegion", "addressCountry"]
            .iter()
            .find_map(|k| match addr.get(*k) {
                Some(Value::Object(_)) => addr.get(*k).and_then(|c| str_field(c, "name")).map(str::to_string),
                _ => str_field(addr, k).map(str::to_string),
            }),
    });
    from_address.or_else(|| {
        str_field(item, "jobLocationType")
            .filter(|t| t.eq_ignore_ascii_case("TELECOMMUTE"))
            .map(|_| "Remote".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const PAGE: &str = "https://example.com/careers";

    fn run(html: &str) -> (Vec<RawPosting>, Vec<String>) {
        extract(&Html::parse_document(html), PAGE)
    }

    #[test]
    fn single_object_with_address() {
        let html = r#"<html><head><script type="application/ld+json">
        {"@context":"https://schema.org","@type":"JobPosting","title":"Platform Engineering Intern",
         "description":"<p>Work on <b>Kubernetes</b></p>","datePosted":"2026-01-10","validThrough":"2026-02-28T23:59:00Z",
         "url":"https://example.com/jobs/42",
         "jobLocation":{"@type":"Place","address":{"addressLocality":"Toronto","addressRegion":"ON"}}}
        </script></head><body></body></html>"#;
        let (got, errs) = run(html);
        assert!(errs.is_empty());
        assert_eq!(got.len(), 1);
        let p = &got[0];
        assert_eq!(p.title, "Platform Engineering Intern");
        assert_eq!(p.description_text, "Work on Kubernetes");
        assert_eq!(p.posted_at, NaiveDate::from_ymd_opt(2026, 1, 10));
        assert_eq!(p.valid_through, NaiveDate::from_ymd_opt(2026, 2, 28));
        assert_eq!(p.raw_location_text.as_deref(), Some("Toronto"));
        assert_eq!(p.source_url, "https://example.com/jobs/42");
    }

    #[test]
    fn arrays_graphs_and_bad_blocks() {
        let html = r#"<html><head>
        <script type="application/ld+json">[{"@type":"JobPosting","title":"Data Intern"},{"@type":"Organization","name":"Acme"}]</script>
        <script type="application/ld+json">{"@graph":[{"@type":["JobPosting"],"title":"Design Intern","jobLocationType":"TELECOMMUTE"}]}</script>
        <script type="application/ld+json">{ not json </script>
        </head></html>"#;
        let (got, errs) = run(html);
        let titles: Vec<&str> = got.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Data Intern", "Design Intern"]);
        assert_eq!(got[0].source_url, PAGE);
        assert_eq!(got[1].raw_location_text.as_deref(), Some("Remote"));
        assert_eq!(errs.len(), 1);
    }
}
