use serde_json::Value;

use crate::feed::extract::Error;
use crate::feed::tree::{is_atom, is_json_feed, is_rdf, is_rss};
use crate::feed::types::{Dialect, Source};

/// Classifies a raw tree into a feed dialect.
///
/// Checks run in a fixed order and the first match wins: JSON Feed (JSON
/// sources only), Atom, RSS 1.0/RDF, RSS 2.0. A JSON document is never
/// probed for XML dialects.
///
/// # Errors
///
/// Returns [`Error::UnrecognizedFormat`] when nothing matches.
pub fn detect(tree: &Value, source: Source) -> Result<Dialect, Error> {
    let dialect = match source {
        Source::Json if is_json_feed(tree) => Some(Dialect::JsonFeed),
        Source::Json => None,
        Source::Xml if is_atom(tree) => Some(Dialect::Atom),
        Source::Xml if is_rdf(tree) => Some(Dialect::Rss1Rdf),
        Source::Xml if is_rss(tree) => Some(Dialect::Rss2),
        Source::Xml => None,
    };

    match dialect {
        Some(dialect) => {
            tracing::debug!(dialect = %dialect, "Detected feed dialect");
            Ok(dialect)
        }
        None => {
            let root = tree
                .as_object()
                .and_then(|map| map.keys().next())
                .map(String::as_str)
                .unwrap_or("<none>");
            tracing::debug!(root, "No feed dialect matched");
            Err(Error::UnrecognizedFormat)
        }
    }
}
