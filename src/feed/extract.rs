//! Entry points of the normalization pipeline.
//!
//! Every operation runs the same steps: build a raw tree, detect the
//! dialect, then either map to the canonical schema or pass the
//! dialect-native object through. Only [`extract`] touches the network.

use serde_json::Value;
use thiserror::Error;

use crate::feed::detect::detect;
use crate::feed::fetcher::{retrieve, ContentKind, FetchError};
use crate::feed::mapper::{map_feed, passthrough};
use crate::feed::options::{BoxError, ExtractOptions, RetrieverOptions};
use crate::feed::tree::{self, TreeError};
use crate::feed::types::{Extraction, Source};
use crate::util::is_valid_url;

/// Errors returned by the extraction entry points.
#[derive(Debug, Error)]
pub enum Error {
    /// `extract` was given something that is not an http(s) URL
    #[error("Input param must be a valid URL")]
    InvalidInput,

    /// The retriever failed; its error is passed through unchanged
    #[error(transparent)]
    Retrieval(#[from] FetchError),

    /// The retrieved body was empty after trimming
    #[error("Failed to load content from \"{origin}\"")]
    EmptyContent { origin: String },

    #[error("The XML document is not well-formed")]
    MalformedXml(#[source] TreeError),

    #[error("Failed to convert data to JSON object")]
    MalformedJson(#[source] serde_json::Error),

    #[error("Unrecognized feed format")]
    UnrecognizedFormat,

    /// A caller hook failed; its error is passed through unchanged
    #[error(transparent)]
    Hook(BoxError),
}

/// Detects the dialect of a raw tree and maps or passes it through.
fn run(tree: &Value, source: Source, options: &ExtractOptions) -> Result<Extraction, Error> {
    let dialect = detect(tree, source)?;
    if !options.normalization {
        tracing::debug!(dialect = %dialect, "Normalization disabled, passing raw object through");
        return Ok(Extraction::Raw(passthrough(dialect, tree)));
    }
    map_feed(dialect, tree, options).map(Extraction::Normalized)
}

/// Extracts a feed from XML text (RSS 2.0, RSS 1.0/RDF or Atom).
///
/// # Errors
///
/// - [`Error::MalformedXml`] - the text is not a well-formed XML document
/// - [`Error::UnrecognizedFormat`] - the document is not a known feed dialect
/// - [`Error::Hook`] - a caller hook failed
///
/// # Examples
///
/// ```
/// use feedex::feed::{extract_from_xml, ExtractOptions};
///
/// let xml = r#"<rss version="2.0"><channel>
///     <title>Example</title>
///     <item><title>Hello</title><link>https://example.com/hello</link></item>
/// </channel></rss>"#;
///
/// let result = extract_from_xml(xml, &ExtractOptions::default()).unwrap();
/// let feed = result.feed().unwrap();
/// assert_eq!(feed.title, "Example");
/// assert_eq!(feed.entries[0].link, "https://example.com/hello");
/// ```
pub fn extract_from_xml(xml: &str, options: &ExtractOptions) -> Result<Extraction, Error> {
    let tree = tree::parse(xml).map_err(Error::MalformedXml)?;
    run(&tree, Source::Xml, options)
}

/// Extracts a feed from an already-decoded JSON Feed document.
///
/// # Errors
///
/// - [`Error::UnrecognizedFormat`] - the value is not a JSON Feed
/// - [`Error::Hook`] - a caller hook failed
pub fn extract_from_json(json: &Value, options: &ExtractOptions) -> Result<Extraction, Error> {
    run(json, Source::Json, options)
}

/// Decodes JSON text and extracts a feed from it.
///
/// # Errors
///
/// [`Error::MalformedJson`] if the text does not decode, otherwise as
/// [`extract_from_json`].
pub fn extract_from_json_str(json: &str, options: &ExtractOptions) -> Result<Extraction, Error> {
    let value: Value = serde_json::from_str(json).map_err(Error::MalformedJson)?;
    extract_from_json(&value, options)
}

/// Fetches a feed URL and extracts it.
///
/// The retrieved content type picks the XML or JSON pipeline.
///
/// # Errors
///
/// - [`Error::InvalidInput`] - `url` is not an http(s) URL; no request is made
/// - [`Error::Retrieval`] - network, status or content-type failure
/// - [`Error::EmptyContent`] - the body is empty after trimming
/// - any error of [`extract_from_xml`] or [`extract_from_json_str`]
pub async fn extract(
    url: &str,
    options: &ExtractOptions,
    retriever_options: &RetrieverOptions,
) -> Result<Extraction, Error> {
    if !is_valid_url(url) {
        return Err(Error::InvalidInput);
    }

    let retrieved = retrieve(url.trim(), retriever_options).await?;
    if retrieved.text.is_empty() {
        return Err(Error::EmptyContent {
            origin: url.trim().to_owned(),
        });
    }

    match retrieved.kind {
        ContentKind::Xml => extract_from_xml(&retrieved.text, options),
        ContentKind::Json => extract_from_json_str(&retrieved.text, options),
    }
}

/// Former name of [`extract`].
#[deprecated(since = "0.2.0", note = "use `extract` instead")]
pub async fn read(
    url: &str,
    options: &ExtractOptions,
    retriever_options: &RetrieverOptions,
) -> Result<Extraction, Error> {
    extract(url, options, retriever_options).await
}
