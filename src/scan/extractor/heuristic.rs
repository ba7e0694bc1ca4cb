//! Best-effort scanning of uncontrolled career-page markup.
//!
//! Every stage is an ordered list of named matchers. A stage runs its
//! matchers in order and keeps the first usable result, so each tier only
//! matters when the tiers before it came up empty.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::scan::normalize::{collapse_whitespace, is_plausible_title, INTERN_MARKER};
use crate::scan::types::RawPosting;

/// A structural signature for job-container fragments.
pub struct ContainerSignature {
    pub name: &'static str,
    pub selector: &'static str,
}

pub const CONTAINER_SIGNATURES: &[ContainerSignature] = &[
    ContainerSignature { name: "data-job-id", selector: "[data-job-id]" },
    ContainerSignature { name: "job-listing", selector: r#"[class*="job-listing"]"# },
    ContainerSignature { name: "job-item", selector: r#"[class*="job-item"]"# },
    ContainerSignature { name: "position", selector: r#"div[class*="position"]"# },
    ContainerSignature { name: "job-article", selector: r#"article[class*="job"]"# },
    ContainerSignature { name: "job-list-item", selector: r#"li[class*="job"]"# },
];

pub const GENERIC_CONTAINER: ContainerSignature = ContainerSignature { name: "generic-job", selector: r#"div[class*="job"]"# };

/// A named field matcher run against one fragment.
pub struct Matcher {
    pub name: &'static str,
    pub run: fn(ElementRef<'_>) -> Option<String>,
}

pub const TITLE_MATCHERS: &[Matcher] = &[
    Matcher { name: "data-job-title", run: title_data_job_title },
    Matcher { name: "data-title", run: title_data_title },
    Matcher { name: "classed-heading", run: title_classed_heading },
    Matcher { name: "heading", run: title_heading },
    Matcher { name: "classed-job-link", run: title_classed_job_link },
    Matcher { name: "job-link", run: title_job_link },
    Matcher { name: "classed-span", run: title_classed_span },
    Matcher { name: "title-attribute", run: title_attribute },
];

pub const DESCRIPTION_MATCHERS: &[Matcher] = &[
    Matcher { name: "classed-paragraph", run: desc_classed_paragraph },
    Matcher { name: "classed-block", run: desc_classed_block },
    Matcher { name: "short-paragraph", run: desc_short_paragraph },
];

pub const LINK_MATCHERS: &[Matcher] = &[
    Matcher { name: "intern-text-link", run: link_intern_text },
    Matcher { name: "intern-href", run: link_intern_href },
    Matcher { name: "job-href", run: link_job_href },
];

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn text_of(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

fn has_marker(s: &str) -> bool {
    s.to_lowercase().contains(INTERN_MARKER)
}

// The fragment itself first, then its descendants.
fn matching<'a>(scope: ElementRef<'a>, selector: &str) -> Vec<ElementRef<'a>> {
    let Ok(sel) = Selector::parse(selector) else { return vec![] };
    let mut out: Vec<ElementRef<'a>> = Vec::new();
    if sel.matches(&scope) { out.push(scope); }
    out.extend(scope.select(&sel).filter(|el| el.id() != scope.id()));
    out
}

fn first_text_with_marker(scope: ElementRef<'_>, selector: &str) -> Option<String> {
    matching(scope, selector).into_iter().map(text_of).find(|t| has_marker(t))
}

fn first_attr_with_marker(scope: ElementRef<'_>, selector: &str, attr: &str) -> Option<String> {
    matching(scope, selector)
        .into_iter()
        .filter_map(|el| el.value().attr(attr).map(collapse_whitespace))
        .find(|t| has_marker(t))
}

fn first_href(scope: ElementRef<'_>, selector: &str, pred: impl Fn(ElementRef<'_>, &str) -> bool) -> Option<String> {
    matching(scope, selector).into_iter().find_map(|el| {
        let href = el.value().attr("href")?.trim();
        let usable = !href.is_empty() && !href.starts_with('#') && !href.to_lowercase().starts_with("javascript:");
        (usable && pred(el, href)).then(|| href.to_string())
    })
}

/// Resolve `href` against the page URL; absolute hrefs pass through.
pub fn resolve_url(page_url: &str, href: &str) -> Option<String> {
    match Url::parse(href) {
        Ok(abs) => Some(abs.to_string()),
        Err(_) => Url::parse(page_url).ok()?.join(href).ok().map(|u| u.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Title matchers
// ---------------------------------------------------------------------------

fn title_data_job_title(el: ElementRef<'_>) -> Option<String> {
    matching(el, "[data-job-title]")
        .into_iter()
        .filter_map(|e| e.value().attr("data-job-title").map(collapse_whitespace))
        .find(|t| !t.is_empty())
}

fn title_data_title(el: ElementRef<'_>) -> Option<String> {
    first_attr_with_marker(el, "[data-title]", "data-title")
}

fn title_classed_heading(el: ElementRef<'_>) -> Option<String> {
    first_text_with_marker(
        el,
        r#"h1[class*="job"], h1[class*="position"], h1[class*="title"], h2[class*="job"], h2[class*="position"], h2[class*="title"], h3[class*="job"], h3[class*="position"], h3[class*="title"]"#,
    )
}

fn title_heading(el: ElementRef<'_>) -> Option<String> {
    first_text_with_marker(el, "h1, h2, h3")
}

fn title_classed_job_link(el: ElementRef<'_>) -> Option<String> {
    first_text_with_marker(el, r#"a[class*="job"][href*="job"], a[class*="position"][href*="job"], a[class*="title"][href*="job"]"#)
}

fn title_job_link(el: ElementRef<'_>) -> Option<String> {
    first_text_with_marker(el, r#"a[href*="job"]"#)
}

fn title_classed_span(el: ElementRef<'_>) -> Option<String> {
    first_text_with_marker(el, r#"span[class*="job"], span[class*="position"], span[class*="title"]"#)
}

fn title_attribute(el: ElementRef<'_>) -> Option<String> {
    first_attr_with_marker(el, "[title]", "title")
}

// ---------------------------------------------------------------------------
// Description matchers
// ---------------------------------------------------------------------------

fn first_nonempty_text(el: ElementRef<'_>, selector: &str) -> Option<String> {
    matching(el, selector).into_iter().map(text_of).find(|t| !t.is_empty())
}

fn desc_classed_paragraph(el: ElementRef<'_>) -> Option<String> {
    first_nonempty_text(el, r#"p[class*="description"]"#)
}

fn desc_classed_block(el: ElementRef<'_>) -> Option<String> {
    first_nonempty_text(el, r#"div[class*="description"]"#)
}

fn desc_short_paragraph(el: ElementRef<'_>) -> Option<String> {
    matching(el, "p").into_iter().map(text_of).find(|t| (20..=200).contains(&t.chars().count()))
}

// ---------------------------------------------------------------------------
// Link matchers
// ---------------------------------------------------------------------------

fn link_intern_text(el: ElementRef<'_>) -> Option<String> {
    first_href(el, "a[href]", |a, _| has_marker(&text_of(a)))
}

fn link_intern_href(el: ElementRef<'_>) -> Option<String> {
    first_href(el, "a[href]", |_, href| has_marker(href))
}

fn link_job_href(el: ElementRef<'_>) -> Option<String> {
    first_href(el, "a[href]", |_, href| href.to_lowercase().contains("job"))
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

// Drop any fragment that contains another matched fragment, so a list
// wrapper like `div.job-listings` never stands in for its items.
fn innermost<'a>(found: Vec<ElementRef<'a>>) -> Vec<ElementRef<'a>> {
    found
        .iter()
        .filter(|outer| {
            !found.iter().any(|inner| inner.id() != outer.id() && inner.ancestors().any(|a| a.id() == outer.id()))
        })
        .copied()
        .collect()
}

fn select_innermost<'a>(doc: &'a Html, selector: &str, max: usize) -> Vec<ElementRef<'a>> {
    let Ok(sel) = Selector::parse(selector) else { return vec![] };
    let mut found = innermost(doc.select(&sel).collect());
    found.truncate(max);
    found
}

/// Innermost fragments from the first container signature that matches
/// anything, else the generic job container; capped at `max`.
pub fn segment<'a>(doc: &'a Html, max: usize) -> (&'static str, Vec<ElementRef<'a>>) {
    for sig in CONTAINER_SIGNATURES {
        let found = select_innermost(doc, sig.selector, max);
        if !found.is_empty() {
            return (sig.name, found);
        }
    }
    (GENERIC_CONTAINER.name, select_innermost(doc, GENERIC_CONTAINER.selector, max))
}

/// First title matcher whose result passes the plausibility filter.
pub fn title(fragment: ElementRef<'_>) -> Option<(&'static str, String)> {
    TITLE_MATCHERS.iter().find_map(|m| {
        let t = (m.run)(fragment)?;
        is_plausible_title(&t).then_some((m.name, t))
    })
}

pub fn description(fragment: ElementRef<'_>) -> String {
    DESCRIPTION_MATCHERS.iter().find_map(|m| (m.run)(fragment)).unwrap_or_default()
}

pub fn posting_url(fragment: ElementRef<'_>, page_url: &str) -> String {
    LINK_MATCHERS
        .iter()
        .find_map(|m| (m.run)(fragment).and_then(|href| resolve_url(page_url, &href)))
        .unwrap_or_else(|| page_url.to_string())
}

/// Container-based extraction.
pub fn extract(doc: &Html, page_url: &str, max_fragments: usize) -> Vec<RawPosting> {
    let (signature, fragments) = segment(doc, max_fragments);
    tracing::debug!(signature, fragments = fragments.len(), "segmented page");

    fragments
        .into_iter()
        .filter_map(|frag| {
            let (matcher, title) = title(frag)?;
            tracing::trace!(matcher, %title, "title matched");
            Some(RawPosting {
                title,
                description_text: description(frag),
                posted_at: None,
                valid_through: None,
                raw_location_text: None,
                source_url: posting_url(frag, page_url),
                context: frag.html(),
            })
        })
        .collect()
}

/// Last resort: every anchor whose visible text carries the marker.
pub fn link_pass(doc: &Html, page_url: &str, max_links: usize) -> Vec<RawPosting> {
    let Ok(sel) = Selector::parse("a[href]") else { return vec![] };
    doc.select(&sel)
        .filter_map(|a| {
            let text = text_of(a);
            has_marker(&text).then_some((a, text))
        })
        .take(max_links)
        .filter(|(_, text)| is_plausible_title(text))
        .filter_map(|(a, text)| {
            let href = a.value().attr("href")?;
            Some(RawPosting {
                title: text,
                source_url: resolve_url(page_url, href)?,
                ..RawPosting::default()
            })
        })
        .collect()
}
