/// Marketplace eligibility and product-page detection
use std::sync::LazyLock;

use regex::Regex;

use crate::config::{ClientConfig, DEFAULT_ELIGIBLE_DOMAINS, MatchPolicy};

/// Path fragments that only appear on single-product detail pages
pub const PRODUCT_PATH_MARKERS: &[&str] = &["/dp/", "/gp/product/", "/gp/aw/d/"];

/// Element ids rendered by product detail pages
pub const PRODUCT_ELEMENT_IDS: &[&str] = &["productTitle", "dp-container", "ppd"];

static ASIN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)/(?:dp|gp/product|gp/aw/d)/([a-z0-9]{10})(?:[/?#]|$)")
        .expect("ASIN pattern is valid")
});

/// What the content script can observe about the current document
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageContext {
    pub path: String,
    pub has_product_element: bool,
}

impl PageContext {
    pub fn new(path: impl Into<String>, has_product_element: bool) -> Self {
        PageContext {
            path: path.into(),
            has_product_element,
        }
    }
}

/// Allow-list matcher built from configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DomainClassifier {
    domains: Vec<String>,
    policy: MatchPolicy,
}

impl DomainClassifier {
    pub fn new(domains: Vec<String>, policy: MatchPolicy) -> Self {
        DomainClassifier {
            domains: domains.into_iter().map(|d| d.to_lowercase()).collect(),
            policy,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.eligible_domains.clone(), config.match_policy)
    }

    /// Whether the URL belongs to an allow-listed marketplace.
    ///
    /// With `MatchPolicy::Substring` the entry may appear anywhere in the URL,
    /// so `https://example.com/?ref=amazon.com` is accepted.
    pub fn is_eligible(&self, url: &str) -> bool {
        let url = url.trim();
        if url.is_empty() {
            return false;
        }

        match self.policy {
            MatchPolicy::Substring => {
                let lowered = url.to_lowercase();
                self.domains.iter().any(|d| lowered.contains(d.as_str()))
            }
            MatchPolicy::Host => match extract_hostname(url) {
                Some(host) => self
                    .domains
                    .iter()
                    .any(|d| host == *d || host.ends_with(&format!(".{}", d))),
                None => false,
            },
        }
    }
}

impl Default for DomainClassifier {
    fn default() -> Self {
        Self::new(
            DEFAULT_ELIGIBLE_DOMAINS.iter().map(|d| d.to_string()).collect(),
            MatchPolicy::Substring,
        )
    }
}

/// Default allow-list check used by the badge and the popup input
pub fn is_eligible_domain(url: &str) -> bool {
    DomainClassifier::default().is_eligible(url)
}

/// Any single signal is enough: a product path marker or a product element
pub fn is_product_page(page: &PageContext) -> bool {
    page.has_product_element
        || PRODUCT_PATH_MARKERS
            .iter()
            .any(|marker| page.path.contains(marker))
}

/// Pull the 10-character product id out of a product URL
pub fn extract_asin(url: &str) -> Option<String> {
    ASIN_PATTERN
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_uppercase())
}

/// Lowercased hostname of a URL, tolerating missing schemes
fn extract_hostname(url: &str) -> Option<String> {
    if let Some(host) = url::Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(|h| h.to_lowercase()))
    {
        return Some(host);
    }

    // No scheme: everything before the first '/' minus any port
    let host = url.trim().split('/').next()?.split(':').next()?.to_lowercase();

    if host.is_empty() { None } else { Some(host) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eligible_marketplaces() {
        assert!(is_eligible_domain("https://www.amazon.com/dp/B0863TXGM3"));
        assert!(is_eligible_domain("https://www.amazon.co.uk/gp/product/B00TTD9BRC"));
        assert!(is_eligible_domain("https://www.amazon.com.au/some-item/dp/B077JBQZPX"));
        assert!(is_eligible_domain("https://WWW.AMAZON.DE/dp/B0002AR0II"));
    }

    #[test]
    fn test_eligible_shorteners() {
        assert!(is_eligible_domain("https://amzn.to/3xYz"));
        assert!(is_eligible_domain("https://a.co/d/abc123"));
    }

    #[test]
    fn test_ineligible_urls() {
        assert!(!is_eligible_domain("https://www.ebay.com/itm/123"));
        assert!(!is_eligible_domain("https://github.com/rust-lang/rust"));
        assert!(!is_eligible_domain("https://www.walmart.com/ip/42"));
        assert!(!is_eligible_domain(""));
        assert!(!is_eligible_domain("   "));
    }

    #[test]
    fn test_substring_tolerance_is_kept() {
        // Allow-list entry only in the query string still matches
        assert!(is_eligible_domain("https://example.org/?ref=amazon.com"));
    }

    #[test]
    fn test_host_policy_rejects_embedded_domain() {
        let classifier = DomainClassifier::new(
            vec!["amazon.com".to_string(), "a.co".to_string()],
            MatchPolicy::Host,
        );

        assert!(classifier.is_eligible("https://www.amazon.com/dp/B0863TXGM3"));
        assert!(classifier.is_eligible("https://a.co/d/abc"));
        assert!(classifier.is_eligible("smile.amazon.com/dp/B0863TXGM3"));
        assert!(!classifier.is_eligible("https://example.org/?ref=amazon.com"));
        assert!(!classifier.is_eligible("https://www.data.com/"));
        assert!(!classifier.is_eligible("https://notamazon.com/"));
    }

    #[test]
    fn test_classifier_from_config() {
        let mut config = ClientConfig::default();
        config.eligible_domains = vec!["amazon.ie".to_string()];
        let classifier = DomainClassifier::from_config(&config);

        assert!(classifier.is_eligible("https://www.amazon.ie/dp/B0863TXGM3"));
        assert!(!classifier.is_eligible("https://www.amazon.com/dp/B0863TXGM3"));
    }

    #[test]
    fn test_is_product_page_path_markers() {
        assert!(is_product_page(&PageContext::new("/Sony-WH-1000XM4/dp/B0863TXGM3", false)));
        assert!(is_product_page(&PageContext::new("/gp/product/B00TTD9BRC", false)));
        assert!(is_product_page(&PageContext::new("/gp/aw/d/B00TTD9BRC", false)));
        assert!(!is_product_page(&PageContext::new("/s?k=headphones", false)));
    }

    #[test]
    fn test_is_product_page_element_alone_is_enough() {
        assert!(is_product_page(&PageContext::new("/some/landing", true)));
        assert!(!is_product_page(&PageContext::default()));
    }

    #[test]
    fn test_extract_asin() {
        assert_eq!(
            extract_asin("https://www.amazon.com/Sony-WH-1000XM4/dp/B0863TXGM3?th=1"),
            Some("B0863TXGM3".to_string())
        );
        assert_eq!(
            extract_asin("https://www.amazon.com/gp/product/0735211299/"),
            Some("0735211299".to_string())
        );
        assert_eq!(
            extract_asin("https://www.amazon.com/dp/b0002ar0ii"),
            Some("B0002AR0II".to_string())
        );
        assert_eq!(extract_asin("https://www.amazon.com/s?k=kong"), None);
        assert_eq!(extract_asin("https://www.amazon.com/dp/SHORT"), None);
    }

    #[test]
    fn test_extract_hostname() {
        assert_eq!(extract_hostname("https://www.amazon.com/dp/x"), Some("www.amazon.com".to_string()));
        assert_eq!(extract_hostname("amazon.com:8080/dp/x"), Some("amazon.com".to_string()));
        assert_eq!(extract_hostname(""), None);
    }
}
