use std::time::Duration;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 20;
const DEFAULT_ENRICH_TIMEOUT_SECS: u64 = 8;
const DEFAULT_MAX_FRAGMENTS: usize = 50;
const DEFAULT_MAX_LINKS: usize = 30;

pub const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

#[derive(Clone, Debug)]
pub struct ScanConfig {
    pub user_agent: String,
    pub fetch_timeout: Duration,
    pub enrich_timeout: Duration,
    /// Cap on job-container fragments inspected per page.
    pub max_fragments: usize,
    /// Cap on anchors inspected by the last-resort link pass.
    pub max_links: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            enrich_timeout: Duration::from_secs(DEFAULT_ENRICH_TIMEOUT_SECS),
            max_fragments: DEFAULT_MAX_FRAGMENTS,
            max_links: DEFAULT_MAX_LINKS,
        }
    }
}

impl ScanConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(ua) = std::env::var("CAREERSCAN_USER_AGENT") {
            if !ua.trim().is_empty() {
                cfg.user_agent = ua;
            }
        }
        if let Ok(timeout) = std::env::var("CAREERSCAN_FETCH_TIMEOUT_SECS") {
            if let Ok(parsed) = timeout.parse::<u64>() {
                cfg.fetch_timeout = Duration::from_secs(parsed);
            }
        }
        if let Ok(timeout) = std::env::var("CAREERSCAN_ENRICH_TIMEOUT_SECS") {
            if let Ok(parsed) = timeout.parse::<u64>() {
                cfg.enrich_timeout = Duration::from_secs(parsed);
            }
        }
        if let Ok(max) = std::env::var("CAREERSCAN_MAX_FRAGMENTS") {
            if let Ok(parsed) = max.parse::<usize>() {
                cfg.max_fragments = parsed.max(1);
            }
        }
        cfg
    }
}
