//! Page and feed fetching
//!
//! - [`fetch_page_entries`]: navigate to one page and extract its entries
//! - [`FeedFetcher`]: fetch every page of a feed in one session, filter the
//!   entries and apply the feed's failure policy

mod feed;
mod filters;
mod page;

pub use feed::{FeedFetcher, FeedOutcome};
pub use filters::apply_filters;
pub use page::{extract_entries, fetch_page_entries, navigate_page};
