// src/fetch.rs
// Web fetcher: download an article page and reduce it to plain text.
// Failures come back as `ERROR:` strings, never as Err.

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, warn};

use crate::chunker::{chunk_source, ContentChunk, ERROR_PREFIX};

pub const HEALTHCARE_SOURCES: &[(&str, &str)] = &[
    ("The Startup Journal", "https://www.thestartupjournal.com/"),
    ("FierceHealthcare", "https://www.fiercehealthcare.com/"),
    ("HealthcareITNews", "https://www.healthcareitnews.com/"),
    ("MedCityNews", "https://medcitynews.com/"),
    ("MobiHealthNews", "https://www.mobihealthnews.com/"),
    ("BeckersHospitalReview", "https://www.beckershospitalreview.com/"),
    ("HITConsultant", "https://hitconsultant.net/"),
    ("MedTechDive", "https://www.medtechdive.com/"),
    ("HealthcareFinanceNews", "https://www.healthcarefinancenews.com/"),
    ("ModernHealthcare", "https://www.modernhealthcare.com/"),
    ("DigitalHealthBiz", "https://digitalhealthbiz.com/"),
    ("BiopharmaDive", "https://www.biopharmadive.com/"),
    ("Digital Health Global", "https://www.digitalhealthglobal.com/"),
    ("Healthcare Innovation", "https://www.hcinnovationgroup.com/"),
];

pub const FINANCE_SOURCES: &[(&str, &str)] = &[
    ("The Startup Journal", "https://www.thestartupjournal.com/"),
    ("Finextra", "https://www.finextra.com/"),
    ("FintechFutures", "https://www.fintechfutures.com/"),
    ("TechCrunch Fintech", "https://techcrunch.com/category/fintech/"),
    ("American Banker", "https://www.americanbanker.com/"),
    ("PYMNTS", "https://www.pymnts.com/"),
    ("FintechNews", "https://fintechnews.org/"),
    ("The Financial Brand", "https://thefinancialbrand.com/"),
    ("BankingDive", "https://www.bankingdive.com/"),
    ("Crowdfund Insider", "https://www.crowdfundinsider.com/"),
    ("PaymentsDive", "https://www.paymentsdive.com/"),
    ("BankInnovation", "https://bankinnovation.net/"),
    ("Fintech Insight", "https://fintechinsight.com/"),
    ("FinTech Magazine", "https://fintechmagazine.com/"),
];

/// Curated news sources for an industry; empty for industries without a list.
pub fn curated_sources(industry: &str) -> &'static [(&'static str, &'static str)] {
    match industry {
        "Healthcare" => HEALTHCARE_SOURCES,
        "Finance" => FINANCE_SOURCES,
        _ => &[],
    }
}

/// Display name for a URL: the curated name when known, else "Custom URL n".
pub fn source_label(industry: &str, url: &str, position: usize) -> String {
    curated_sources(industry)
        .iter()
        .find(|(_, known)| known.trim_end_matches('/') == url.trim_end_matches('/'))
        .map(|(name, _)| name.to_string())
        .unwrap_or_else(|| format!("Custom URL {}", position + 1))
}

#[async_trait]
pub trait WebFetcher: Send + Sync {
    /// Cleaned plain text of the page, or an `ERROR:`-prefixed description.
    async fn fetch(&self, url: &str) -> String;
}

const MIN_ARTICLE_CHARS: usize = 500;
const NO_CONTENT: &str = "No content found on the page.";

static NOISE_BLOCKS: Lazy<Vec<Regex>> = Lazy::new(|| {
    ["script", "style", "nav", "footer", "header", "aside", "form", "iframe", "noscript"]
        .iter()
        .map(|tag| Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>")).expect("noise block regex"))
        .collect()
});

static CONTENT_CONTAINERS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?is)<article\b[^>]*>(.*?)</article\s*>",
        r#"(?is)<div\b[^>]*\bclass\s*=\s*["'][^"']*\b(?:post|article|entry|content|news-item)\b[^"']*["'][^>]*>(.*?)</div\s*>"#,
        r#"(?is)<div\b[^>]*\bid\s*=\s*["'](?:content|main-content|article-content|post-content)["'][^>]*>(.*?)</div\s*>"#,
        r"(?is)<main\b[^>]*>(.*?)</main\s*>",
        r#"(?is)<section\b[^>]*\bclass\s*=\s*["'][^"']*\b(?:content|main|articles|news)\b[^"']*["'][^>]*>(.*?)</section\s*>"#,
        r"(?is)<h2\b[^>]*>(.*?)</h2\s*>",
        r"(?is)<h3\b[^>]*>(.*?)</h3\s*>",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("content container regex"))
    .collect()
});

static BODY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<body\b[^>]*>(.*)</body\s*>").expect("body regex"));
static COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("comment regex"));
static BLOCK_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)</?(?:p|br|div|li|tr|h[1-6]|section|article|main|ul|ol|table|blockquote)\b[^>]*>")
        .expect("block tag regex")
});
static ANY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("tag regex"));
static BOILERPLATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(subscribe to our newsletter|sign up for our newsletter|subscribe for updates|email address).*")
        .expect("boilerplate regex")
});

/// Reduce an HTML page to article text.
///
/// Tries article-like containers first and keeps the first kind whose text is
/// long enough, then falls back to `<body>`. Paragraph breaks survive as blank lines.
pub fn extract_article_text(html: &str) -> String {
    let mut page = COMMENT.replace_all(html, "").into_owned();
    for noise in NOISE_BLOCKS.iter() {
        page = noise.replace_all(&page, "").into_owned();
    }

    for container in CONTENT_CONTAINERS.iter() {
        let parts: Vec<String> = container
            .captures_iter(&page)
            .filter_map(|caps| caps.get(1))
            .map(|m| html_to_text(m.as_str()))
            .filter(|text| !text.is_empty())
            .collect();
        let joined = parts.join("\n\n");
        if joined.chars().count() > MIN_ARTICLE_CHARS {
            return clean_text(&joined);
        }
    }

    let body = BODY
        .captures(&page)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(&page);
    let text = clean_text(&html_to_text(body));
    if text.is_empty() {
        NO_CONTENT.to_string()
    } else {
        text
    }
}

fn html_to_text(fragment: &str) -> String {
    let with_breaks = BLOCK_TAG.replace_all(fragment, "\n\n");
    let stripped = ANY_TAG.replace_all(&with_breaks, "");
    stripped
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#8217;", "'")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

/// Trim lines, collapse blank runs to a single blank line, drop newsletter prompts.
fn clean_text(text: &str) -> String {
    let without_boilerplate = BOILERPLATE.replace_all(text, "");
    let mut out = String::with_capacity(without_boilerplate.len());
    let mut pending_blank = false;

    for line in without_boilerplate.lines().map(str::trim) {
        if line.is_empty() {
            pending_blank = !out.is_empty();
            continue;
        }
        if !out.is_empty() {
            out.push_str(if pending_blank { "\n\n" } else { "\n" });
        }
        out.push_str(line);
        pending_blank = false;
    }
    out
}

/// `reqwest`-backed fetcher with a browser-like user agent.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (compatible; trendlens/0.4)")
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;
        Ok(Self { client })
    }

    async fn download(&self, url: &str) -> Result<String, String> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(format!("URL must start with http:// or https://: {}", url));
        }
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| format!("Error scraping {}: {}", url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(format!("Error scraping {}: HTTP {}", url, status));
        }
        response
            .text()
            .await
            .map_err(|e| format!("Error reading {}: {}", url, e))
    }
}

#[async_trait]
impl WebFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> String {
        info!(url, "Fetching page");
        match self.download(url).await {
            Ok(html) => extract_article_text(&html),
            Err(message) => {
                warn!(url, error = %message, "Fetch failed");
                format!("{} {}", ERROR_PREFIX, message)
            }
        }
    }
}

/// Fetch every URL in order and chunk each page under its source label.
///
/// Pages that come back as `ERROR:` text are logged and left out.
pub async fn fetch_chunks(
    fetcher: &dyn WebFetcher,
    industry: &str,
    urls: &[String],
    max_chars: usize,
) -> Vec<ContentChunk> {
    let mut chunks = Vec::new();
    for (i, url) in urls.iter().enumerate() {
        let label = source_label(industry, url, i);
        let text = fetcher.fetch(url).await;
        if text.starts_with(ERROR_PREFIX) {
            warn!(source = %label, url = %url, error = %text, "Skipping source");
            continue;
        }
        let page_chunks = chunk_source(&label, url, &text, max_chars);
        info!(source = %label, chunks = page_chunks.len(), "Source chunked");
        chunks.extend(page_chunks);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_blocks_are_dropped() {
        let html = r#"<html><head><style>p{}</style></head><body>
            <nav>Home | About</nav>
            <p>Telehealth visits rose again.</p>
            <script>track();</script>
            <footer>Copyright</footer>
        </body></html>"#;
        let text = extract_article_text(html);
        assert_eq!(text, "Telehealth visits rose again.");
    }

    #[test]
    fn test_article_container_preferred_when_long() {
        let article = "Payments infrastructure keeps consolidating. ".repeat(20);
        let html = format!(
            "<body><div class=\"sidebar\">Trending now</div><article><h1>Deals</h1><p>{}</p></article></body>",
            article
        );
        let text = extract_article_text(&html);
        assert!(text.starts_with("Deals\n\nPayments infrastructure"));
        assert!(!text.contains("Trending now"));
    }

    #[test]
    fn test_short_containers_fall_back_to_body() {
        let html = "<body><article>Tiny</article><p>Rest of page</p></body>";
        let text = extract_article_text(html);
        assert!(text.contains("Tiny"));
        assert!(text.contains("Rest of page"));
    }

    #[test]
    fn test_boilerplate_and_entities() {
        let html = "<body><p>R&amp;D spend &gt; 10%</p><p>Subscribe to our newsletter for more</p></body>";
        assert_eq!(extract_article_text(html), "R&D spend > 10%");
    }

    #[test]
    fn test_empty_page() {
        assert_eq!(extract_article_text("<html><body></body></html>"), NO_CONTENT);
    }

    #[test]
    fn test_source_lists() {
        assert_eq!(curated_sources("Healthcare").len(), 14);
        assert_eq!(curated_sources("Finance")[1].0, "Finextra");
        assert!(curated_sources("Retail").is_empty());
        assert_eq!(source_label("Finance", "https://www.finextra.com", 0), "Finextra");
        assert_eq!(source_label("Retail", "https://example.com", 2), "Custom URL 3");
    }

    struct CannedFetcher;

    #[async_trait]
    impl WebFetcher for CannedFetcher {
        async fn fetch(&self, url: &str) -> String {
            if url.contains("down") {
                format!("{} Error scraping {}: connection refused", ERROR_PREFIX, url)
            } else {
                "First paragraph.\n\nSecond paragraph.".to_string()
            }
        }
    }

    #[tokio::test]
    async fn test_fetch_chunks_skips_failed_sources() {
        let urls = vec![
            "https://down.example".to_string(),
            "https://www.finextra.com/".to_string(),
        ];
        let chunks = fetch_chunks(&CannedFetcher, "Finance", &urls, 20).await;
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].source_label.as_deref(), Some("Finextra"));
        assert_eq!(chunks[0].text, "First paragraph.");
        assert!(chunks[1].prompt_content().starts_with("Source: Finextra (https://www.finextra.com/)"));
    }

    #[tokio::test]
    async fn test_bad_url_is_error_string() {
        let fetcher = HttpFetcher::new(Duration::from_secs(1)).unwrap();
        let text = fetcher.fetch("ftp://example.com").await;
        assert!(text.starts_with("ERROR:"));
    }
}
