//! Entry field extraction
//!
//! This module turns a rendered entry fragment into field values:
//! - titles, bodies, links and images via CSS selectors
//! - publication dates via `datetime` markers, `xpathstr=` expressions or
//!   strftime patterns
//! - stable entry ids derived from the link or title

mod dates;
mod fields;
mod identity;
mod link;
mod xpath;

pub use dates::{normalize_date, parse_datetime_marker, DateSource};
pub use fields::{
    extract_contents, extract_date, extract_favicon, extract_image, extract_link, extract_title,
    select_first,
};
pub use identity::{identify, ID_HASH_LENGTH};
pub use link::resolve_link;
pub use xpath::{
    compile_xpath, extract_xpath_date, xpath_expression, XPathDocument, XPATH_STRING_PREFIX,
};

/// Selector meaning "the entry container itself"
pub const WILDCARD_SELECTOR: &str = "*";

/// Separator between values of multi-selector fields
pub const JOIN_SEPARATOR: &str = " — ";
