//! Product link extraction
//!
//! Two heuristics classify a page's anchors as product candidates:
//! a primary one keyed on product-path markers, and a fallback keyed on
//! the category URL's shape. [`AdaptiveSelector`] picks one per domain and
//! persists the choice; [`LinkExtractor`] wires it to the page renderer.

mod adaptive;
mod dedup;
mod extractor;
mod strategy;

pub use adaptive::{AdaptiveSelector, Selection};
pub use dedup::{filter_new, filter_unique_links, LinkSet, UniqueLinks};
pub use extractor::LinkExtractor;
pub use strategy::{fallback, ExtractionStrategy, LinkClassifier};
