//! Feed normalization library.
//!
//! Turns RSS 2.0, RSS 1.0/RDF, Atom and JSON Feed documents into one
//! canonical JSON-serializable shape, or hands back the dialect-native
//! object untouched when normalization is off.

pub mod config;
pub mod feed;
pub mod util;

pub use feed::{
    extract, extract_from_json, extract_from_json_str, extract_from_xml, Entry, Error,
    ExtractOptions, Extraction, Feed, RetrieverOptions,
};
