//! URL handling module for Catalog-Crawler
//!
//! Domain keys, pagination URLs, path-segment helpers, and the
//! domain link filter used by category discovery.

mod domain;
mod filter;
mod paging;

pub use domain::{domain_of, extract_domain, homepage_url};
pub use filter::{category_candidates, filter_domain_links};
pub use paging::{last_path_segment, page_url, segment_count};
