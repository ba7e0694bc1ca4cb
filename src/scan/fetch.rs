use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use url::Url;

use super::config::{ScanConfig, ACCEPT_HTML};
use super::types::StepOutcome;

#[derive(Debug)]
pub enum FetchError {
    Timeout,
    Status(StatusCode),
    Http(reqwest::Error),
}

impl FetchError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() { FetchError::Timeout } else { FetchError::Http(err) }
    }
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Timeout => write!(f, "request timed out"),
            FetchError::Status(status) => write!(f, "http status {status}"),
            FetchError::Http(err) => write!(f, "http error: {err}"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Http(err) => Some(err),
            _ => None,
        }
    }
}

/// Anything that can turn a URL into page markup.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn get(&self, url: &str, timeout: Duration) -> Result<String, FetchError>;
}

#[derive(Clone)]
pub struct HttpPageSource {
    http: Client,
}

impl HttpPageSource {
    pub fn new(cfg: &ScanConfig) -> Result<Self, FetchError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static(ACCEPT_HTML));
        let http = Client::builder()
            .user_agent(cfg.user_agent.clone())
            .default_headers(headers)
            .timeout(cfg.fetch_timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(FetchError::from_reqwest)?;
        Ok(Self { http })
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn get(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let resp = self
            .http
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        resp.text().await.map_err(FetchError::from_reqwest)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FetchedPage {
    /// The variant that actually answered; relative links resolve against it.
    pub url: String,
    pub html: String,
}

/// The URL itself, then at most two substitutions of a `careers` path
/// segment: `jobs` and `careers/en-us`. Host names are never touched.
pub fn url_variants(url: &str) -> Vec<String> {
    let mut out = vec![url.to_string()];
    let Ok(parsed) = Url::parse(url) else { return out };
    let segments: Vec<&str> = parsed.path_segments().map(|s| s.collect()).unwrap_or_default();
    let Some(idx) = segments.iter().position(|s| s.eq_ignore_ascii_case("careers")) else { return out };

    for replacement in [vec!["jobs"], vec![segments[idx], "en-us"]] {
        let path: Vec<&str> = segments[..idx].iter().copied().chain(replacement).chain(segments[idx + 1..].iter().copied()).collect();
        let mut alt = parsed.clone();
        alt.set_path(&format!("/{}", path.join("/")));
        let alt = alt.to_string();
        if !out.contains(&alt) { out.push(alt); }
    }
    out
}

/// Try each variant in order. Exhaustion is `Failed`, never an error.
pub async fn fetch_page(src: &dyn PageSource, url: &str, timeout: Duration) -> StepOutcome<FetchedPage> {
    let mut reasons: Vec<String> = Vec::new();
    for candidate in url_variants(url) {
        match src.get(&candidate, timeout).await {
            Ok(html) if !html.trim().is_empty() => {
                tracing::debug!(url = %candidate, bytes = html.len(), "fetched");
                return StepOutcome::Found(FetchedPage { url: candidate, html });
            }
            Ok(_) => reasons.push(format!("{candidate}: empty body")),
            Err(e) => {
                tracing::debug!(url = %candidate, error = %e, "fetch attempt failed");
                reasons.push(format!("{candidate}: {e}"));
            }
        }
    }
    StepOutcome::Failed(reasons.join("; "))
}


#[cfg(test)]
mod tests {
    use super::mock::StaticPages;
    use super::*;

    const T: Duration = Duration::from_secs(1);

    #[test]
    fn variants_only_for_careers_urls() {
        assert_eq!(
            url_variants("https://acme.com/careers"),
            vec![
                "https://acme.com/careers".to_string(),
                "https://acme.com/jobs".to_string(),
                "https://acme.com/careers/en-us".to_string(),
            ]
        );
        assert_eq!(url_variants("https://jobs.acme.com"), vec!["https://jobs.acme.com".to_string()]);
    }

    #[test]
    fn careers_host_is_not_a_careers_path() {
        assert_eq!(url_variants("https://careers.google.com"), vec!["https://careers.google.com".to_string()]);
        assert_eq!(
            url_variants("https://careers.acme.com/careers/?team=eng"),
            vec![
                "https://careers.acme.com/careers/?team=eng".to_string(),
                "https://careers.acme.com/jobs/?team=eng".to_string(),
                "https://careers.acme.com/careers/en-us/?team=eng".to_string(),
            ]
        );
        assert_eq!(url_variants("https://acme.com/careersite"), vec!["https://acme.com/careersite".to_string()]);
    }

    #[tokio::test]
    async fn timeouts_degrade_to_failed_outcome() {
        let src = StaticPages::new()
            .timing_out("https://acme.com/careers")
            .timing_out("https://acme.com/jobs")
            .timing_out("https://acme.com/careers/en-us");
        let got = fetch_page(&src, "https://acme.com/careers", T).await;
        match got {
            StepOutcome::Failed(reason) => assert!(reason.contains("timed out")),
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(src.calls().len(), 3);
    }

    #[tokio::test]
    async fn falls_back_to_jobs_path() {
        let src = StaticPages::new().with("https://acme.com/jobs", "<html>ok</html>");
        let got = fetch_page(&src, "https://acme.com/careers", T).await;
        assert_eq!(got.found().map(|p| p.url), Some("https://acme.com/jobs".to_string()));
        assert_eq!(src.calls().len(), 2);
    }

    #[tokio::test]
    async fn exhausted_variants_fail_softly() {
        let src = StaticPages::new();
        let got = fetch_page(&src, "https://acme.com/careers", T).await;
        assert!(matches!(got, StepOutcome::Failed(_)));
        assert_eq!(src.calls().len(), 3);

        let got = fetch_page(&src, "https://acme.com/work-with-us", T).await;
        assert_eq!(got.label(), "failed");
        assert_eq!(src.calls().len(), 4);
    }
}
