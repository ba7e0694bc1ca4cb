pub mod heuristic;
pub mod jsonld;
pub mod vendor;

use std::collections::HashSet;

use scraper::Html;

use crate::scan::config::ScanConfig;
use crate::scan::fetch::FetchedPage;
use crate::scan::normalize::{collapse_whitespace, is_internship_title};
use crate::scan::types::{RawPosting, StepOutcome};

use self::vendor::Vendor;

#[derive(Clone, Debug, PartialEq)]
pub struct Extraction {
    /// Which tier produced the postings.
    pub source: &'static str,
    pub postings: Vec<RawPosting>,
}

/// The single admission point for every RawPosting: internship marker,
/// tidied title, and dedup by (url, lower-cased title).
pub fn admit(raw: Vec<RawPosting>) -> Vec<RawPosting> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    raw.into_iter()
        .filter_map(|mut p| {
            p.title = collapse_whitespace(&p.title);
            if !is_internship_title(&p.title) { return None; }
            seen.insert((p.source_url.clone(), p.title.to_lowercase())).then_some(p)
        })
        .collect()
}

/// Structured sources first (linked data, then a known vendor payload); the
/// heuristic tiers only run when those produce nothing.
pub fn extract(page: &FetchedPage, cfg: &ScanConfig) -> StepOutcome<Extraction> {
    let doc = Html::parse_document(&page.html);
    let mut failures: Vec<String> = Vec::new();

    let (linked, errors) = jsonld::extract(&doc, &page.url);
    failures.extend(errors);
    let linked = admit(linked);
    if !linked.is_empty() {
        return StepOutcome::Found(Extraction { source: "ld+json", postings: linked });
    }

    if let Some(board) = Vendor::detect(&page.url) {
        match board.extract(&page.html, &page.url) {
            Ok(found) => {
                let found = admit(found);
                if !found.is_empty() {
                    return StepOutcome::Found(Extraction { source: board.name(), postings: found });
                }
            }
            Err(e) => {
                tracing::warn!(vendor = board.name(), error = %e, "vendor payload unreadable");
                failures.push(format!("{}: {e}", board.name()));
            }
        }
    }

    let fragments = admit(heuristic::extract(&doc, &page.url, cfg.max_fragments));
    if !fragments.is_empty() {
        return StepOutcome::Found(Extraction { source: "html", postings: fragments });
    }

    let links = admit(heuristic::link_pass(&doc, &page.url, cfg.max_links));
    if !links.is_empty() {
        return StepOutcome::Found(Extraction { source: "links", postings: links });
    }

    if failures.is_empty() { StepOutcome::Empty } else { StepOutcome::Failed(failures.join("; ")) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(url: &str, html: &str) -> FetchedPage {
        FetchedPage { url: url.to_string(), html: html.to_string() }
    }

    #[test]
    fn linked_data_preempts_markup() {
        let html = r#"<html><head><script type="application/ld+json">
            {"@type":"JobPosting","title":"Platform Engineering Intern"}</script></head>
            <body><div class="job-item"><h3>Marketing Intern</h3></div></body></html>"#;
        let got = extract(&page("https://example.com/careers", html), &ScanConfig::default()).found().unwrap();
        assert_eq!(got.source, "ld+json");
        assert_eq!(got.postings.len(), 1);
        assert_eq!(got.postings[0].title, "Platform Engineering Intern");
    }

    #[test]
    fn non_intern_linked_data_falls_through() {
        let html = r#"<html><head><script type="application/ld+json">
            {"@type":"JobPosting","title":"Staff Engineer"}</script></head>
            <body><div class="job-item"><h3>Marketing Intern</h3></div></body></html>"#;
        let got = extract(&page("https://example.com/careers", html), &ScanConfig::default()).found().unwrap();
        assert_eq!(got.source, "html");
        assert_eq!(got.postings[0].title, "Marketing Intern");
    }

    #[test]
    fn link_pass_only_when_containers_empty() {
        let html = r#"<body><ul><li><a href="/jobs/1">Audio  Intern</a></li></ul></body>"#;
        let got = extract(&page("https://example.com/careers", html), &ScanConfig::default()).found().unwrap();
        assert_eq!(got.source, "links");
        assert_eq!(got.postings[0].title, "Audio Intern");
        assert_eq!(got.postings[0].source_url, "https://example.com/jobs/1");
    }

    #[test]
    fn nothing_found_reports_parse_failures() {
        let empty = extract(&page("https://example.com/careers", "<p>No openings</p>"), &ScanConfig::default());
        assert_eq!(empty, StepOutcome::Empty);

        let broken = extract(
            &page("https://boards.greenhouse.io/acme", "<p>No openings</p>"),
            &ScanConfig::default(),
        );
        assert!(matches!(broken, StepOutcome::Failed(_)));
    }

    #[test]
    fn admit_dedups_and_filters() {
        let p = |title: &str, url: &str| RawPosting { title: title.into(), source_url: url.into(), ..RawPosting::default() };
        let got = admit(vec![
            p("Data Intern", "https://x/1"),
            p("data intern", "https://x/1"),
            p("Data Intern", "https://x/2"),
            p("Staff Engineer", "https://x/3"),
        ]);
        assert_eq!(got.len(), 2);
    }
}
