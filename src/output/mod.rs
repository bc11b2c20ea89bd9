//! Feed output
//!
//! This module handles:
//! - Serializing feeds as Atom, or RSS 2.0 when entries carry images
//! - Writing `<id>.xml` and the `<id>.json` snapshot for the next run

mod atom;
mod rss;
mod writer;

pub use self::atom::to_atom;
pub use self::rss::to_rss;
pub use writer::{render_feed, FeedFormat, FeedWriter, WrittenFeed, DEFAULT_OUTPUT_DIR};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to format output: {0}")]
    Format(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
