use crate::url::{last_path_segment, segment_count};
use std::collections::HashSet;
use url::Url;

/// Link-classification heuristic applied to a page's anchors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractionStrategy {
    /// Anchors whose path carries a product-path marker
    Primary,
    /// Anchors that nest under the category's last path segment
    Fallback,
}

impl ExtractionStrategy {
    /// Strategy implied by a cached "primary is effective" decision
    pub fn from_decision(primary_effective: bool) -> Self {
        if primary_effective {
            Self::Primary
        } else {
            Self::Fallback
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Fallback => "fallback",
        }
    }
}

/// Applies both strategies with a configured marker set
#[derive(Debug, Clone)]
pub struct LinkClassifier {
    markers: Vec<String>,
}

impl LinkClassifier {
    pub fn new(markers: Vec<String>) -> Self {
        Self { markers }
    }

    /// Runs `strategy` over `anchors`; results are deduplicated in page order
    pub fn select(
        &self,
        strategy: ExtractionStrategy,
        anchors: &[String],
        category_url: &str,
    ) -> Vec<String> {
        match strategy {
            ExtractionStrategy::Primary => self.primary(anchors),
            ExtractionStrategy::Fallback => fallback(anchors, category_url),
        }
    }

    /// Anchors whose target path contains any product-path marker
    pub fn primary(&self, anchors: &[String]) -> Vec<String> {
        dedup(anchors.iter().filter(|anchor| {
            let path = anchor_path(anchor);
            self.markers.iter().any(|m| path.contains(m.as_str()))
        }))
    }
}

/// Anchors that contain the category token, differ from the category URL,
/// and sit at a different depth than it
pub fn fallback(anchors: &[String], category_url: &str) -> Vec<String> {
    let Some(token) = last_path_segment(category_url) else {
        return Vec::new();
    };
    let category_depth = segment_count(category_url);

    dedup(anchors.iter().filter(|anchor| {
        anchor.as_str() != category_url
            && segment_count(anchor) != category_depth
            && anchor.contains(token.as_str())
    }))
}

/// Path of an absolute anchor, or the raw text if it does not parse
fn anchor_path(anchor: &str) -> String {
    Url::parse(anchor)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| anchor.to_string())
}

fn dedup<'a>(links: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut seen = HashSet::new();
    links
        .filter(|link| seen.insert(link.as_str()))
        .cloned()
        .collect()
}
