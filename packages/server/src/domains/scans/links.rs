//! URL handling for submitted sites and crawled links.

use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SiteUrlError {
    #[error("URL is required")]
    Missing,
    #[error("Invalid URL")]
    Invalid,
}

/// Normalize user input into the URL that will be crawled.
///
/// Input without a `scheme://` prefix gets `https://`. Only http(s) URLs with
/// a host are accepted.
pub fn normalize_site_url(input: &str) -> Result<Url, SiteUrlError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(SiteUrlError::Missing);
    }

    let url = if trimmed.contains("://") {
        Url::parse(trimmed)
    } else {
        Url::parse(&format!("https://{}", trimmed))
    }
    .map_err(|_| SiteUrlError::Invalid)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(SiteUrlError::Invalid);
    }
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(SiteUrlError::Invalid),
    }
}

/// Host of a stored URL, if it parses.
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
}

/// A link ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedLink {
    pub target_url: String,
    pub is_internal: bool,
}

/// Resolve `href` against the page it was found on and decide whether it
/// stays on the audited site.
///
/// Internal means the resolved host is `site_host` or one of its subdomains,
/// ignoring a leading `www.`. Hrefs that cannot be resolved are kept verbatim
/// and counted as external.
pub fn classify_link(href: &str, page_url: &str, site_host: &str) -> ClassifiedLink {
    let href = href.trim();

    let resolved = match Url::parse(page_url) {
        Ok(base) => base.join(href).ok(),
        Err(_) => Url::parse(href).ok(),
    };

    match resolved {
        Some(url) if matches!(url.scheme(), "http" | "https") => {
            let is_internal = url
                .host_str()
                .map(|host| same_site(host, site_host))
                .unwrap_or(false);
            ClassifiedLink {
                target_url: url.to_string(),
                is_internal,
            }
        }
        // mailto:, tel:, javascript: and unparseable hrefs
        _ => ClassifiedLink {
            target_url: href.to_string(),
            is_internal: false,
        },
    }
}

fn same_site(host: &str, site_host: &str) -> bool {
    let host = strip_www(host);
    let site = strip_www(site_host);
    if site.is_empty() {
        return false;
    }
    host == site || host.ends_with(&format!(".{}", site))
}

fn strip_www(host: &str) -> String {
    let lower = host.trim_end_matches('.').to_ascii_lowercase();
    match lower.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => lower,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_domain_gets_https() {
        let url = normalize_site_url("example.com").unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
    }

    #[test]
    fn bare_domain_starting_with_http_gets_https() {
        let url = normalize_site_url("httpbin.org").unwrap();
        assert_eq!(url.as_str(), "https://httpbin.org/");
    }

    #[test]
    fn non_http_scheme_is_rejected() {
        assert_eq!(normalize_site_url("ftp://example.com"), Err(SiteUrlError::Invalid));
        assert_eq!(normalize_site_url("FTP://example.com/x"), Err(SiteUrlError::Invalid));
    }

    #[test]
    fn explicit_scheme_is_kept() {
        let url = normalize_site_url("  http://example.com/about ").unwrap();
        assert_eq!(url.as_str(), "http://example.com/about");
    }

    #[test]
    fn empty_and_invalid_inputs() {
        assert_eq!(normalize_site_url("   "), Err(SiteUrlError::Missing));
        assert_eq!(normalize_site_url("https://"), Err(SiteUrlError::Invalid));
        assert_eq!(normalize_site_url("exa mple.com"), Err(SiteUrlError::Invalid));
        assert_eq!(
            normalize_site_url("httpx://example.com"),
            Err(SiteUrlError::Invalid)
        );
    }

    #[test]
    fn relative_links_are_internal() {
        let link = classify_link("/pricing", "https://example.com/about", "example.com");
        assert_eq!(link.target_url, "https://example.com/pricing");
        assert!(link.is_internal);
    }

    #[test]
    fn www_and_subdomains_are_internal() {
        assert!(classify_link("https://www.example.com/x", "https://example.com/", "example.com").is_internal);
        assert!(classify_link("https://blog.example.com/", "https://example.com/", "www.example.com").is_internal);
    }

    #[test]
    fn lookalike_hosts_are_external() {
        // Substring matching would wrongly call these internal
        assert!(!classify_link("https://notexample.com/", "https://example.com/", "example.com").is_internal);
        assert!(!classify_link("https://example.com.evil.io/", "https://example.com/", "example.com").is_internal);
        assert!(!classify_link("https://other.org/?ref=example.com", "https://example.com/", "example.com").is_internal);
    }

    #[test]
    fn non_http_links_are_kept_verbatim() {
        let link = classify_link("mailto:hi@example.com", "https://example.com/", "example.com");
        assert_eq!(link.target_url, "mailto:hi@example.com");
        assert!(!link.is_internal);
    }

    #[test]
    fn host_of_lowercases() {
        assert_eq!(host_of("https://Example.COM/path").as_deref(), Some("example.com"));
        assert_eq!(host_of("not a url"), None);
    }
}
