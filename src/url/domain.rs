use crate::{UrlError, UrlResult};
use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host, it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use catalog_crawler::url::extract_domain;
///
/// let url = Url::parse("https://Shop.Example.COM/collections/shoes").unwrap();
/// assert_eq!(extract_domain(&url), Some("shop.example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Parses an absolute http(s) URL string and returns its domain key
///
/// The domain is the queue, checkpoint, and strategy-cache key for a site.
///
/// # Examples
///
/// ```
/// use catalog_crawler::url::domain_of;
///
/// assert_eq!(domain_of("https://www.adidas.com/us").unwrap(), "www.adidas.com");
/// assert!(domain_of("ftp://example.com/").is_err());
/// assert!(domain_of("not a url").is_err());
/// ```
pub fn domain_of(input: &str) -> UrlResult<String> {
    let url = Url::parse(input.trim()).map_err(|e| UrlError::Parse(format!("{}: {}", input, e)))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(UrlError::InvalidScheme(other.to_string())),
    }

    extract_domain(&url)
        .filter(|d| !d.is_empty())
        .ok_or(UrlError::MissingDomain)
}

/// Homepage URL for a domain, as rendered by category discovery
pub fn homepage_url(domain: &str) -> String {
    format!("https://{}/", domain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_with_port() {
        let url = Url::parse("https://example.com:8080/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_uppercase_converted_to_lowercase() {
        let url = Url::parse("https://EXAMPLE.COM/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_domain_of_keeps_subdomain() {
        assert_eq!(
            domain_of("https://www.example.com/collections?x=1").unwrap(),
            "www.example.com"
        );
    }

    #[test]
    fn test_domain_of_http_accepted() {
        assert_eq!(domain_of("http://example.com").unwrap(), "example.com");
    }

    #[test]
    fn test_domain_of_trims_whitespace() {
        assert_eq!(domain_of("  https://example.com/  ").unwrap(), "example.com");
    }

    #[test]
    fn test_domain_of_rejects_bare_domain() {
        assert!(matches!(domain_of("example.com"), Err(UrlError::Parse(_))));
    }

    #[test]
    fn test_domain_of_rejects_other_schemes() {
        assert!(matches!(
            domain_of("mailto:someone@example.com"),
            Err(UrlError::InvalidScheme(_))
        ));
    }

    #[test]
    fn test_homepage_url() {
        assert_eq!(homepage_url("example.com"), "https://example.com/");
    }
}
