//! Data types produced by the normalization pipeline.
//!
//! [`Feed`] and [`Entry`] are the canonical, dialect-independent shapes.
//! Every canonical attribute is a `String`; absent source data is `""`.
//! Caller-supplied hook fields live in `extra` and serialize flattened next
//! to the canonical attributes.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// The wire format a feed document was published in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// RSS 0.9x / 2.0 (`<rss><channel>`)
    Rss2,
    /// RSS 1.0 (`<rdf:RDF>`)
    Rss1Rdf,
    /// Atom 1.0 and 0.3 (`<feed>`)
    Atom,
    /// JSON Feed 1.x
    JsonFeed,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dialect::Rss2 => "RSS 2.0",
            Dialect::Rss1Rdf => "RSS 1.0/RDF",
            Dialect::Atom => "Atom",
            Dialect::JsonFeed => "JSON Feed",
        };
        f.write_str(name)
    }
}

/// Which decoder produced a raw tree. Only JSON sources can be JSON Feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Xml,
    Json,
}

/// A feed in canonical form.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Feed {
    pub title: String,
    pub link: String,
    pub description: String,
    pub generator: String,
    pub language: String,
    pub published: String,
    /// Caller-injected fields from the feed-level hook
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    pub entries: Vec<Entry>,
}

/// One item of a feed in canonical form.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Entry {
    pub id: String,
    pub title: String,
    pub link: String,
    pub description: String,
    pub published: String,
    /// Caller-injected fields from the entry-level hook
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Canonical string attributes shared by feeds and entries that a hook may
/// overwrite by returning a key of the same name.
pub(crate) trait CanonicalFields {
    /// Keys a hook may not set at all.
    const RESERVED: &'static [&'static str] = &[];

    fn field_mut(&mut self, key: &str) -> Option<&mut String>;
    fn extra_mut(&mut self) -> &mut Map<String, Value>;
}

impl CanonicalFields for Feed {
    const RESERVED: &'static [&'static str] = &["entries"];

    fn field_mut(&mut self, key: &str) -> Option<&mut String> {
        match key {
            "title" => Some(&mut self.title),
            "link" => Some(&mut self.link),
            "description" => Some(&mut self.description),
            "generator" => Some(&mut self.generator),
            "language" => Some(&mut self.language),
            "published" => Some(&mut self.published),
            _ => None,
        }
    }

    fn extra_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.extra
    }
}

impl CanonicalFields for Entry {
    fn field_mut(&mut self, key: &str) -> Option<&mut String> {
        match key {
            "id" => Some(&mut self.id),
            "title" => Some(&mut self.title),
            "link" => Some(&mut self.link),
            "description" => Some(&mut self.description),
            "published" => Some(&mut self.published),
            _ => None,
        }
    }

    fn extra_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.extra
    }
}

/// The result of an extraction.
///
/// `Normalized` is the canonical [`Feed`]. `Raw` is returned when
/// normalization is disabled: the dialect-native object with its keys
/// untouched, except that entry containers are always arrays.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Extraction {
    Normalized(Feed),
    Raw(Value),
}

impl Extraction {
    /// Returns the canonical feed, if normalization was enabled.
    pub fn feed(&self) -> Option<&Feed> {
        match self {
            Extraction::Normalized(feed) => Some(feed),
            Extraction::Raw(_) => None,
        }
    }

    /// Consumes the extraction, returning the canonical feed if there is one.
    pub fn into_feed(self) -> Option<Feed> {
        match self {
            Extraction::Normalized(feed) => Some(feed),
            Extraction::Raw(_) => None,
        }
    }

    /// Returns the dialect-native object, if normalization was disabled.
    pub fn raw(&self) -> Option<&Value> {
        match self {
            Extraction::Normalized(_) => None,
            Extraction::Raw(value) => Some(value),
        }
    }

    /// Serializes the extraction into a JSON value.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if the normalized feed cannot be
    /// converted.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        match self {
            Extraction::Normalized(feed) => serde_json::to_value(feed),
            Extraction::Raw(value) => Ok(value.clone()),
        }
    }
}
