//! Stateless field derivation shared by every extractor.
//!
//! All functions take plain text (or raw markup treated as text) and return
//! typed fields; none of them look at scan state.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use scraper::Html;

use super::types::{NormalizedJob, RawPosting};

pub const INTERN_MARKER: &str = "intern";
pub const LOCATION_UNSPECIFIED: &str = "Location not specified";
pub const MAX_DESCRIPTION_CHARS: usize = 1000;
pub const MAX_SKILLS: usize = 5;

const SKILL_VOCABULARY: &[&str] = &[
    "JavaScript", "TypeScript", "Python", "Java", "C++", "React", "Node.js",
    "SQL", "AWS", "Docker", "Kubernetes", "Git",
];

// ---------------------------------------------------------------------------
// Titles
// ---------------------------------------------------------------------------

/// Case-insensitive internship marker check; the one filter every posting passes.
pub fn is_internship_title(title: &str) -> bool {
    let t = title.trim();
    !t.is_empty() && t.to_lowercase().contains(INTERN_MARKER)
}

static BOILERPLATE_LEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(career|job|search|view|apply|internal|site|page|home|about|contact)").unwrap()
});
static BOILERPLATE_PHRASES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)career\s*site|job\s*board|apply\s*now|view\s*details|learn\s*more|see\s*all|read\s*more").unwrap()
});

/// Stricter check for titles scraped out of free-form markup: marker present,
/// 6..=99 chars, and not navigational boilerplate.
pub fn is_plausible_title(title: &str) -> bool {
    let t = title.trim();
    let len = t.chars().count();
    is_internship_title(t)
        && len > 5
        && len < 100
        && !BOILERPLATE_LEAD.is_match(t)
        && !BOILERPLATE_PHRASES.is_match(t)
}

static WS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

pub fn collapse_whitespace(s: &str) -> String {
    WS.replace_all(s.trim(), " ").into_owned()
}

// ---------------------------------------------------------------------------
// Description
// ---------------------------------------------------------------------------

/// Structured descriptions often carry HTML, sometimes entity-escaped; reduce them to text.
pub fn html_to_text(s: &str) -> String {
    let mut text = s.to_string();
    // escaped markup needs a second pass
    for _ in 0..2 {
        if !text.contains('<') && !text.contains('&') { break; }
        let frag = Html::parse_fragment(&text);
        text = frag.root_element().text().collect::<Vec<_>>().join(" ");
    }
    collapse_whitespace(&text)
}

pub fn truncate_description(s: &str) -> String {
    s.chars().take(MAX_DESCRIPTION_CHARS).collect()
}

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

static LOCATION_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\blocation\s*:\s*["']?([^"',\n<]+)"#).unwrap()
});
static LOCATION_CLASSED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<(?:span|div|p)[^>]*class=["'][^"']*location[^"']*["'][^>]*>([^<]+)<"#).unwrap()
});
static LOCATION_DATA_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)data-location=["']([^"']+)["']"#).unwrap()
});
static LOCATION_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?i:located in|based in|in|at)\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)?(?:\s*,\s*[A-Z][a-z]+)?)").unwrap()
});

fn usable_location(candidate: &str) -> Option<String> {
    let loc = collapse_whitespace(candidate);
    let len = loc.chars().count();
    if len == 0 || len >= 100 || loc.to_lowercase().contains("location") {
        return None;
    }
    Some(loc)
}

fn labeled_location(text: &str) -> Option<String> {
    [&LOCATION_LABEL, &LOCATION_CLASSED, &LOCATION_DATA_ATTR]
        .into_iter()
        .find_map(|re| re.captures(text).and_then(|c| usable_location(&c[1])))
}

/// Location resolution, most to least specific: structured field, labeled or
/// classed location in the posting then the page, an "in/at City" phrase in the
/// posting, the caller's default geography, the unspecified sentinel.
pub fn location(structured: Option<&str>, posting_text: &str, page_text: &str, default_geo: Option<&str>) -> String {
    if let Some(loc) = structured.and_then(usable_location) {
        return loc;
    }
    if let Some(loc) = labeled_location(posting_text).or_else(|| labeled_location(page_text)) {
        return loc;
    }
    if let Some(c) = LOCATION_PHRASE.captures(posting_text) {
        if let Some(loc) = usable_location(&c[1]) {
            return loc;
        }
    }
    default_geo
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .unwrap_or(LOCATION_UNSPECIFIED)
        .to_string()
}

// ---------------------------------------------------------------------------
// Visa sponsorship
// ---------------------------------------------------------------------------

static VISA_NEGATIVE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"no\s+visa\s+sponsorship",
        r"do\s+not\s+sponsor",
        r"cannot\s+sponsor",
        r"unable\s+to\s+sponsor",
        r"must\s+have\s+authorization",
        r"must\s+be\s+authorized",
        r"u\.?s\.?\s+citizen",
        r"permanent\s+resident",
    ]
    .iter()
    .map(|p| Regex::new(&format!("(?i){p}")).unwrap())
    .collect()
});
static VISA_POSITIVE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"visa\s+sponsorship",
        r"sponsor\s+visa",
        r"work\s+authorization\s+sponsorship",
        r"eligible\s+for\s+visa",
        r"we\s+sponsor\s+visas",
        r"will\s+sponsor",
        r"sponsorship\s+available",
        r"h-?1b\s+sponsorship",
        r"\btn\s+visa",
        r"eligible\s+for\s+work\s+authorization",
    ]
    .iter()
    .map(|p| Regex::new(&format!("(?i){p}")).unwrap())
    .collect()
});

/// Explicit denial wins over any positive mention.
pub fn visa_sponsorship(posting_text: &str, page_text: &str) -> bool {
    let hit = |set: &[Regex]| set.iter().any(|re| re.is_match(posting_text) || re.is_match(page_text));
    if hit(VISA_NEGATIVE.as_slice()) {
        return false;
    }
    hit(VISA_POSITIVE.as_slice())
}

// ---------------------------------------------------------------------------
// Term
// ---------------------------------------------------------------------------

static TERM_MONTH_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+\d{4}\s*[-–]\s*(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+\d{4}").unwrap()
});
static TERM_SEASON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:summer|fall|autumn|winter|spring)\s+\d{4}\b").unwrap()
});
static TERM_YEAR_RANGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{4}\s*[-–]\s*\d{4}\b").unwrap());

pub fn term(text: &str) -> Option<String> {
    [&TERM_MONTH_RANGE, &TERM_SEASON, &TERM_YEAR_RANGE]
        .into_iter()
        .find_map(|re| re.find(text))
        .map(|m| collapse_whitespace(m.as_str()))
}

// ---------------------------------------------------------------------------
// Skills
// ---------------------------------------------------------------------------

pub fn skills(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    SKILL_VOCABULARY
        .iter()
        .filter(|s| lower.contains(&s.to_lowercase()))
        .take(MAX_SKILLS)
        .map(|s| s.to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Derive every NormalizedJob field from one admitted posting.
///
/// `page_text` is the full page markup, `scan_date` the fallback post date.
pub fn normalize(raw: &RawPosting, page_text: &str, default_geo: Option<&str>, scan_date: NaiveDate) -> NormalizedJob {
    let posting_text = format!("{} {}", raw.description_text, raw.context);
    NormalizedJob {
        title: collapse_whitespace(&raw.title),
        description: truncate_description(&raw.description_text),
        post_date: raw.posted_at.unwrap_or(scan_date),
        due_date: raw.valid_through,
        acceptance_rate: None,
        key_skills: skills(&posting_text),
        visa_sponsorship: visa_sponsorship(&posting_text, page_text),
        location: location(raw.raw_location_text.as_deref(), &posting_text, page_text, default_geo),
        term: term(&format!("{} {}", raw.title, raw.description_text)),
        url: raw.source_url.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_defaults_post_date_and_rolls_without_deadline() {
        let scan_date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let raw = RawPosting {
            title: "Platform  Engineering Intern".into(),
            description_text: "Summer 2026. Go and Kubernetes. We will sponsor visas.".into(),
            source_url: "https://example.com/careers".into(),
            ..RawPosting::default()
        };
        let job = normalize(&raw, "<html></html>", None, scan_date);
        assert_eq!(job.title, "Platform Engineering Intern");
        assert_eq!(job.post_date, scan_date);
        assert_eq!(job.due_date, None);
        assert!(job.is_rolling());
        assert_eq!(job.key_skills, vec!["Kubernetes"]);
        assert!(job.visa_sponsorship);
        assert_eq!(job.term.as_deref(), Some("Summer 2026"));
        assert_eq!(job.location, LOCATION_UNSPECIFIED);
    }

    #[test]
    fn title_filter_rejects_boilerplate() {
        assert!(!is_plausible_title("Internal Career Site"));
        assert!(!is_plausible_title("Apply Now"));
        assert!(!is_plausible_title("Learn more about our intern program"));
        assert!(is_plausible_title("Software Engineering Intern"));
        assert!(is_internship_title("Software Engineering Intern"));
        assert!(!is_internship_title("Apply Now"));
        assert!(!is_internship_title("   "));
    }

    #[test]
    fn title_length_bounds() {
        assert!(is_plausible_title("Interns"));
        assert!(!is_plausible_title(&format!("Intern {}", "x".repeat(100))));
    }

    #[test]
    fn visa_negative_phrase_wins() {
        let text = "We do not sponsor visas. Visa sponsorship available for some roles.";
        assert!(!visa_sponsorship(text, ""));
        assert!(visa_sponsorship("H1B sponsorship offered.", ""));
        assert!(!visa_sponsorship("Great team.", "Candidates must be authorized to work."));
        assert!(!visa_sponsorship("", ""));
    }

    #[test]
    fn location_falls_back_in_order() {
        assert_eq!(location(Some("Toronto"), "", "", None), "Toronto");
        assert_eq!(location(None, "Location: Austin, TX", "", None), "Austin");
        assert_eq!(location(None, "", r#"<span class="job-location">Berlin</span>"#, None), "Berlin");
        assert_eq!(location(None, "Join us based in New York", "", None), "New York");
        assert_eq!(location(None, "", "", Some("Canada")), "Canada");
        assert_eq!(location(None, "", "", None), LOCATION_UNSPECIFIED);
    }

    #[test]
    fn location_phrase_needs_capitalised_place() {
        assert_eq!(location(None, "work in the office", "", None), LOCATION_UNSPECIFIED);
    }

    #[test]
    fn term_prefers_month_range() {
        assert_eq!(term("Runs Jan 2026 - Aug 2026, Summer 2026"), Some("Jan 2026 - Aug 2026".into()));
        assert_eq!(term("Summer 2026 Software Intern"), Some("Summer 2026".into()));
        assert_eq!(term("Academic year 2026-2027"), Some("2026-2027".into()));
        assert_eq!(term("Software Intern"), None);
    }

    #[test]
    fn skills_keep_vocabulary_order_and_cap() {
        let got = skills("Git, Docker, python, SQL, AWS, Kubernetes and TypeScript");
        assert_eq!(got, vec!["TypeScript", "Python", "SQL", "AWS", "Docker"]);
        assert!(skills("nothing relevant").is_empty());
    }

    #[test]
    fn html_descriptions_become_text() {
        assert_eq!(html_to_text("<p>Build <b>tools</b></p>\n<p>Ship</p>"), "Build tools Ship");
        assert_eq!(truncate_description(&"é".repeat(1200)).chars().count(), MAX_DESCRIPTION_CHARS);
    }
}
