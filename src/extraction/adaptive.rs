use crate::extraction::strategy::{ExtractionStrategy, LinkClassifier};
use crate::storage::{StorageResult, StrategyCache};
use std::sync::Arc;

/// Links chosen for one page and the strategy that chose them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub strategy: ExtractionStrategy,
    pub links: Vec<String>,
}

/// Picks the extraction strategy per domain from the persisted decision
///
/// The first page ever seen for a domain probes the primary strategy and
/// records whether it found anything. Every later page reads that record
/// and never probes again.
#[derive(Clone)]
pub struct AdaptiveSelector {
    cache: Arc<dyn StrategyCache>,
    classifier: LinkClassifier,
}

impl AdaptiveSelector {
    pub fn new(cache: Arc<dyn StrategyCache>, classifier: LinkClassifier) -> Self {
        Self { cache, classifier }
    }

    pub fn select(
        &self,
        domain: &str,
        anchors: &[String],
        category_url: &str,
    ) -> StorageResult<Selection> {
        if let Some(primary_effective) = self.cache.get(domain)? {
            let strategy = ExtractionStrategy::from_decision(primary_effective);
            return Ok(Selection {
                strategy,
                links: self.classifier.select(strategy, anchors, category_url),
            });
        }

        let probe = self.classifier.primary(anchors);
        // Concurrent first pages race here; the stored decision wins
        let decided = self.cache.get_or_insert(domain, !probe.is_empty())?;
        let strategy = ExtractionStrategy::from_decision(decided);

        tracing::info!(
            "Extraction strategy for {}: {} (primary probe found {} links)",
            domain,
            strategy.as_str(),
            probe.len()
        );

        let links = match strategy {
            ExtractionStrategy::Primary => probe,
            ExtractionStrategy::Fallback => {
                self.classifier.select(strategy, anchors, category_url)
            }
        };
        Ok(Selection { strategy, links })
    }
}
