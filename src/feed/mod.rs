//! Feed extraction: RSS 2.0, RSS 1.0/RDF, Atom and JSON Feed into one shape.
//!
//! This module provides the whole pipeline from document text (or URL) to a
//! canonical [`Feed`]:
//!
//! - **Retrieval**: one-shot HTTP fetch with content-type sniffing and proxying
//! - **Tree building**: XML text into a generic JSON-like raw tree
//! - **Detection**: classify a raw tree into one of four dialects
//! - **Mapping**: declarative per-dialect field tables into [`Feed`]/[`Entry`]
//!
//! # Architecture
//!
//! - [`fetcher`] - HTTP retrieval over `reqwest`
//! - `tree` - raw tree construction over `quick-xml`
//! - `detect` - dialect detection
//! - `mapper` - field tables, link resolution and raw pass-through
//! - `hooks` - caller-supplied extra field extractors
//!
//! # Example
//!
//! ```no_run
//! use feedex::feed::{extract, ExtractOptions, RetrieverOptions};
//!
//! # async fn run() -> Result<(), feedex::feed::Error> {
//! let options = ExtractOptions::builder().use_iso_date_format(true).build();
//! let result = extract("https://example.com/feed.xml", &options, &RetrieverOptions::default()).await?;
//! if let Some(feed) = result.feed() {
//!     println!("{} ({} entries)", feed.title, feed.entries.len());
//! }
//! # Ok(())
//! # }
//! ```

mod detect;
mod extract;
pub mod fetcher;
mod hooks;
mod link;
mod mapper;
mod options;
mod tree;
mod types;

pub use detect::detect;
#[allow(deprecated)]
pub use extract::read;
pub use extract::{extract, extract_from_json, extract_from_json_str, extract_from_xml, Error};
pub use fetcher::{ContentKind, FetchError, Retrieved};
pub use link::{LinkCandidate, LinkResolver};
pub use mapper::text_of;
pub use options::{
    BoxError, ExtractOptions, ExtractOptionsBuilder, FieldHook, ProxyOptions, RetrieverOptions,
};
pub use tree::{is_atom, is_json_feed, is_rdf, is_rss, parse, validate, TreeError};
pub use types::{Dialect, Entry, Extraction, Feed, Source};
