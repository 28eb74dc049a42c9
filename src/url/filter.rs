use std::collections::HashSet;

/// Keeps links that belong to `domain` and carry none of the ignore words
///
/// A link is kept when it contains `domain`, is not exactly `domain`, and
/// contains none of `words_to_ignore`. Matching is plain substring matching
/// on the raw link text. Order is preserved.
///
/// # Examples
///
/// ```
/// use catalog_crawler::url::filter_domain_links;
///
/// let links = vec![
///     "https://example.com/faqs".to_string(),
///     "https://example.com/page1".to_string(),
///     "https://other.org/page1".to_string(),
/// ];
/// let kept = filter_domain_links(&links, "example.com", &["faqs".to_string()]);
/// assert_eq!(kept, vec!["https://example.com/page1".to_string()]);
/// ```
pub fn filter_domain_links(
    links: &[String],
    domain: &str,
    words_to_ignore: &[String],
) -> Vec<String> {
    links
        .iter()
        .filter(|link| {
            link.contains(domain)
                && link.as_str() != domain
                && words_to_ignore.iter().all(|word| !link.contains(word.as_str()))
        })
        .cloned()
        .collect()
}

/// Builds the category list for a site from its homepage anchors
///
/// Applies [`filter_domain_links`], drops the homepage itself, and
/// deduplicates while keeping first-seen order.
pub fn category_candidates(
    anchors: &[String],
    domain: &str,
    homepage: &str,
    words_to_ignore: &[String],
) -> Vec<String> {
    let mut seen = HashSet::new();
    filter_domain_links(anchors, domain, words_to_ignore)
        .into_iter()
        .filter(|link| link != homepage)
        .filter(|link| seen.insert(link.clone()))
        .collect()
}
