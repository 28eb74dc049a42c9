use crate::UrlResult;
use url::Url;

/// Returns the last non-empty path segment of a URL string
///
/// Used both as the category label in crawl results and as the anchor
/// token of the fallback extraction strategy. Returns `None` for URLs
/// that do not parse or have no path segment.
///
/// # Examples
///
/// ```
/// use catalog_crawler::url::last_path_segment;
///
/// assert_eq!(last_path_segment("https://shop.com/c/shoes"), Some("shoes".to_string()));
/// assert_eq!(last_path_segment("https://shop.com/c/shoes/"), Some("shoes".to_string()));
/// assert_eq!(last_path_segment("https://shop.com/"), None);
/// ```
pub fn last_path_segment(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .last()
        .map(str::to_string)
}

/// Number of `/`-separated parts of a URL string
///
/// Counts the raw string the same way for anchors and category URLs, so a
/// product page nested under a category always differs from its parent.
pub fn segment_count(url: &str) -> usize {
    url.split('/').count()
}

/// Builds the URL of pagination page `page` for a category
///
/// Sets `param=page` in the query string, replacing any existing value for
/// `param` and preserving every other query pair.
pub fn page_url(category_url: &str, param: &str, page: u32) -> UrlResult<String> {
    let mut url = Url::parse(category_url)
        .map_err(|e| crate::UrlError::Parse(format!("{}: {}", category_url, e)))?;

    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != param)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (k, v) in &retained {
            pairs.append_pair(k, v);
        }
        pairs.append_pair(param, &page.to_string());
    }

    Ok(url.to_string())
}
