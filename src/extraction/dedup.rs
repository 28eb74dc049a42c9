use std::collections::HashSet;

/// Insertion-ordered set of links
///
/// Backs the per-category SeenLinks set: membership checks are O(1) and
/// the final link list keeps discovery order.
#[derive(Debug, Clone, Default)]
pub struct LinkSet {
    order: Vec<String>,
    index: HashSet<String>,
}

impl LinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, link: &str) -> bool {
        self.index.contains(link)
    }

    /// Adds a link; returns `false` if it was already present
    pub fn insert(&mut self, link: String) -> bool {
        if self.index.contains(&link) {
            return false;
        }
        self.index.insert(link.clone());
        self.order.push(link);
        true
    }

    /// Adds every unseen link and returns the ones that were new, in order
    pub fn absorb(&mut self, links: &[String]) -> Vec<String> {
        let fresh = filter_new(links, self);
        for link in &fresh {
            self.insert(link.clone());
        }
        fresh
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.order
    }

    pub fn into_vec(self) -> Vec<String> {
        self.order
    }
}

impl FromIterator<String> for LinkSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut set = LinkSet::new();
        for link in iter {
            set.insert(link);
        }
        set
    }
}

/// Links from `links` that are not in `seen`, first occurrence only
///
/// The result is always a subset of `links`, and `seen ∪ result` equals
/// `seen ∪ links`.
pub fn filter_new(links: &[String], seen: &LinkSet) -> Vec<String> {
    let mut batch = HashSet::new();
    links
        .iter()
        .filter(|link| !seen.contains(link))
        .filter(|link| batch.insert(link.as_str()))
        .cloned()
        .collect()
}

/// Split of a product link list against an accumulated list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueLinks {
    /// Product links absent from the accumulated list, in order
    pub new_links: Vec<String>,
    /// Accumulated list followed by the new links
    pub updated_links: Vec<String>,
}

/// Merges `product_links` into `all_links` without duplicates
///
/// # Examples
///
/// ```
/// use catalog_crawler::extraction::filter_unique_links;
///
/// let product = vec!["p1".to_string(), "p2".to_string(), "p3".to_string()];
/// let all = vec!["p1".to_string(), "p4".to_string()];
/// let split = filter_unique_links(&product, &all);
/// assert_eq!(split.new_links, vec!["p2", "p3"]);
/// assert_eq!(split.updated_links, vec!["p1", "p4", "p2", "p3"]);
/// ```
pub fn filter_unique_links(product_links: &[String], all_links: &[String]) -> UniqueLinks {
    let seen: LinkSet = all_links.iter().cloned().collect();
    let new_links = filter_new(product_links, &seen);

    let mut updated_links = seen.into_vec();
    updated_links.extend(new_links.iter().cloned());

    UniqueLinks {
        new_links,
        updated_links,
    }
}
