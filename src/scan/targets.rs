use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use url::Url;
use uuid::Uuid;

use super::types::Target;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Company {
    #[sqlx(rename = "company_id")]
    pub id: Uuid,
    pub name: String,
    pub website: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct CareerPage {
    pub company_id: Uuid,
    pub url: String,
}

/// Read-only view of the companies and their recorded career pages.
/// `None` means every row.
#[async_trait]
pub trait CompanyDirectory: Send + Sync {
    async fn companies(&self, ids: Option<&[Uuid]>) -> Result<Vec<Company>>;
    async fn career_pages(&self, ids: Option<&[Uuid]>) -> Result<Vec<CareerPage>>;
}

/// Well-known companies whose careers site is not at `{name}.com/careers`.
const CAREER_SITE_OVERRIDES: &[(&str, &str)] = &[
    ("amazon", "https://www.amazon.jobs"),
    ("google", "https://careers.google.com"),
    ("microsoft", "https://careers.microsoft.com"),
    ("apple", "https://jobs.apple.com"),
    ("meta", "https://www.metacareers.com"),
    ("facebook", "https://www.metacareers.com"),
    ("netflix", "https://jobs.netflix.com"),
    ("spotify", "https://www.lifeatspotify.com"),
    ("salesforce", "https://www.salesforce.com/careers"),
    ("adobe", "https://careers.adobe.com"),
    ("oracle", "https://www.oracle.com/careers"),
    ("ibm", "https://www.ibm.com/careers"),
    ("intel", "https://www.intel.com/content/www/us/en/jobs"),
    ("nvidia", "https://www.nvidia.com/en-us/about-nvidia/careers"),
    ("shopify", "https://www.shopify.com/careers"),
    ("stripe", "https://stripe.com/jobs"),
    ("airbnb", "https://careers.airbnb.com"),
    ("uber", "https://www.uber.com/careers"),
    ("tesla", "https://www.tesla.com/careers"),
];

fn compact_name(name: &str) -> String {
    name.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_lowercase()
}

/// `{origin}/careers` of a real company website; encyclopedia pages don't count.
fn careers_from_website(website: &str) -> Option<String> {
    let website = website.trim();
    if website.is_empty() || website.to_lowercase().contains("wikipedia.org") {
        return None;
    }
    let parsed = Url::parse(website).or_else(|_| Url::parse(&format!("https://{website}"))).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return None;
    }
    Some(format!("{}/careers", parsed.origin().ascii_serialization()))
}

/// Website, then the override table, then the `https://{name}.com/careers` guess.
pub fn synthesize_url(company: &Company) -> Option<String> {
    if let Some(url) = company.website.as_deref().and_then(careers_from_website) {
        return Some(url);
    }
    let compact = compact_name(&company.name);
    if compact.is_empty() {
        return None;
    }
    if let Some((_, url)) = CAREER_SITE_OVERRIDES.iter().find(|(name, _)| *name == compact) {
        return Some(url.to_string());
    }
    Some(format!("https://{compact}.com/careers"))
}

/// Recorded career pages win per company; companies without any get a
/// synthesized URL. No URL repeats within a company.
pub async fn resolve(dir: &dyn CompanyDirectory, ids: Option<&[Uuid]>) -> Result<Vec<Target>> {
    let ids = ids.filter(|ids| !ids.is_empty());
    let companies = dir.companies(ids).await?;
    let pages = dir.career_pages(ids).await?;

    let mut seen: HashSet<(Uuid, String)> = HashSet::new();
    let mut targets: Vec<Target> = Vec::new();
    let mut push = |targets: &mut Vec<Target>, company_id: Uuid, company_name: &str, url: String| {
        if seen.insert((company_id, url.clone())) {
            targets.push(Target { company_id, company_name: company_name.to_string(), url });
        }
    };

    for company in &companies {
        let recorded: Vec<&CareerPage> = pages.iter().filter(|p| p.company_id == company.id).collect();
        if recorded.is_empty() {
            match synthesize_url(company) {
                Some(url) => push(&mut targets, company.id, &company.name, url),
                None => tracing::warn!(company_id = %company.id, "no usable name or website; skipped"),
            }
        } else {
            for page in recorded {
                push(&mut targets, company.id, &company.name, page.url.trim().to_string());
            }
        }
    }

    Ok(targets)
}


#[cfg(test)]
mod tests {
    use super::mock::MemoryDirectory;
    use super::*;

    fn company(name: &str, website: Option<&str>) -> Company {
        Company { id: Uuid::new_v4(), name: name.into(), website: website.map(str::to_string) }
    }

    #[test]
    fn synthesis_order() {
        assert_eq!(
            synthesize_url(&company("Acme", Some("https://www.acme.io/about/us/"))).as_deref(),
            Some("https://www.acme.io/careers")
        );
        assert_eq!(
            synthesize_url(&company("Stripe", Some("https://en.wikipedia.org/wiki/Stripe,_Inc."))).as_deref(),
            Some("https://stripe.com/jobs")
        );
        assert_eq!(synthesize_url(&company("Blue Bottle", None)).as_deref(), Some("https://bluebottle.com/careers"));
        assert_eq!(synthesize_url(&company("Globex", Some("globex.com"))).as_deref(), Some("https://globex.com/careers"));
        assert_eq!(synthesize_url(&company("  ", None)), None);
    }

    #[tokio::test]
    async fn recorded_pages_win_per_company() {
        let dir = MemoryDirectory::default().company("Acme", None).company("Initech", None);
        let acme = dir.id_of("Acme");
        let dir = dir
            .page(acme, "https://jobs.acme.com/interns")
            .page(acme, "https://jobs.acme.com/interns");

        let got = resolve(&dir, None).await.unwrap();
        let urls: Vec<&str> = got.iter().map(|t| t.url.as_str()).collect();
        assert_eq!(urls, vec!["https://jobs.acme.com/interns", "https://initech.com/careers"]);
        assert_eq!(got[0].company_name, "Acme");
    }

    #[tokio::test]
    async fn ids_restrict_targets_to_known_companies() {
        let dir = MemoryDirectory::default().company("Acme", None).company("Initech", None);
        let initech = dir.id_of("Initech");
        let stray = Uuid::new_v4();
        let dir = dir.page(stray, "https://careers.hooli.xyz/list");

        let got = resolve(&dir, Some(&[initech][..])).await.unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].url, "https://initech.com/careers");

        let got = resolve(&dir, Some(&[][..])).await.unwrap();
        let names: Vec<&str> = got.iter().map(|t| t.company_name.as_str()).collect();
        assert_eq!(names, vec!["Acme", "Initech"]);
        assert!(got.iter().all(|t| t.company_id != stray));
    }

    #[tokio::test]
    async fn empty_directory_is_no_targets() {
        let got = resolve(&MemoryDirectory::default(), None).await.unwrap();
        assert!(got.is_empty());
    }
}
