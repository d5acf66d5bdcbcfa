//! Declarative field mapping from dialect-native raw trees to the canonical
//! [`Feed`]/[`Entry`] schema.
//!
//! Each dialect is described by a [`DialectTable`]: where the feed node and
//! the entry container live, and for every canonical attribute an ordered
//! list of candidate paths. The first candidate that yields a non-empty value
//! wins; values are never merged across candidates.
//!
//! Namespaced extension elements (`itunes:*`, `syn:*`, `slash:*`, ...) are
//! deliberately absent from the tables. Callers reach them through the raw
//! pass-through or the field hooks.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::feed::extract::Error;
use crate::feed::hooks;
use crate::feed::link::{collect_candidates, permalink_candidate, LinkCandidate, LinkResolver};
use crate::feed::options::ExtractOptions;
use crate::feed::tree::{ATTR_PREFIX, TEXT_KEY};
use crate::feed::types::{Dialect, Entry, Feed};
use crate::util::{clean_text, normalize_date};

/// A sequence of object keys leading from a node to a value.
type Path = &'static [&'static str];

/// A link location; `alternate_only` keeps just `rel="alternate"` candidates,
/// for foreign elements such as `atom:link` inside RSS where `rel="self"`
/// points at the feed document rather than the site.
#[derive(Debug, Clone, Copy)]
struct LinkPath {
    path: Path,
    alternate_only: bool,
}

const fn any(path: Path) -> LinkPath {
    LinkPath {
        path,
        alternate_only: false,
    }
}

const fn alternate(path: Path) -> LinkPath {
    LinkPath {
        path,
        alternate_only: true,
    }
}

#[derive(Debug)]
struct FeedPaths {
    title: &'static [Path],
    link: &'static [LinkPath],
    description: &'static [Path],
    generator: &'static [Path],
    language: &'static [Path],
    published: &'static [Path],
}

#[derive(Debug)]
struct EntryPaths {
    id: &'static [Path],
    title: &'static [Path],
    link: &'static [LinkPath],
    /// Fall back to a permalink `<guid>` when no link candidate exists
    guid_permalink: bool,
    description: &'static [Path],
    published: &'static [Path],
}

#[derive(Debug)]
struct DialectTable {
    /// From the tree root to the node holding feed-level fields
    feed_node: Path,
    /// From the tree root to the node holding the entry container;
    /// also the object returned by the raw pass-through
    entries_parent: Path,
    entries_key: &'static str,
    feed: FeedPaths,
    entry: EntryPaths,
}

const RSS2: DialectTable = DialectTable {
    feed_node: &["rss", "channel"],
    entries_parent: &["rss", "channel"],
    entries_key: "item",
    feed: FeedPaths {
        title: &[&["title"]],
        link: &[any(&["link"]), alternate(&["atom:link"])],
        description: &[&["description"]],
        generator: &[&["generator"]],
        language: &[&["language"], &["dc:language"]],
        published: &[&["lastBuildDate"], &["pubDate"], &["dc:date"]],
    },
    entry: EntryPaths {
        id: &[&["guid"]],
        title: &[&["title"]],
        link: &[any(&["link"])],
        guid_permalink: true,
        description: &[&["description"], &["content:encoded"]],
        published: &[&["pubDate"], &["dc:date"]],
    },
};

const RSS1_RDF: DialectTable = DialectTable {
    feed_node: &["rdf:RDF", "channel"],
    entries_parent: &["rdf:RDF"],
    entries_key: "item",
    feed: FeedPaths {
        title: &[&["title"]],
        link: &[any(&["link"])],
        description: &[&["description"]],
        generator: &[&["admin:generatorAgent", "@_rdf:resource"]],
        language: &[&["dc:language"]],
        published: &[&["dc:date"]],
    },
    entry: EntryPaths {
        id: &[&["@_rdf:about"], &["link"]],
        title: &[&["title"]],
        link: &[any(&["link"]), any(&["@_rdf:about"])],
        guid_permalink: false,
        description: &[&["description"], &["content:encoded"]],
        published: &[&["dc:date"]],
    },
};

const ATOM: DialectTable = DialectTable {
    feed_node: &["feed"],
    entries_parent: &["feed"],
    entries_key: "entry",
    feed: FeedPaths {
        title: &[&["title"]],
        link: &[any(&["link"])],
        description: &[&["subtitle"], &["tagline"]],
        generator: &[&["generator"]],
        language: &[&["@_xml:lang"]],
        published: &[&["updated"], &["modified"]],
    },
    entry: EntryPaths {
        id: &[&["id"]],
        title: &[&["title"]],
        link: &[any(&["link"])],
        guid_permalink: false,
        description: &[&["summary"], &["content"]],
        published: &[&["published"], &["updated"], &["issued"], &["modified"]],
    },
};

const JSON_FEED: DialectTable = DialectTable {
    feed_node: &[],
    entries_parent: &[],
    entries_key: "items",
    feed: FeedPaths {
        title: &[&["title"]],
        link: &[any(&["home_page_url"])],
        description: &[&["description"]],
        generator: &[],
        language: &[&["language"]],
        published: &[],
    },
    entry: EntryPaths {
        id: &[&["id"]],
        title: &[&["title"]],
        link: &[any(&["url"]), any(&["external_url"])],
        guid_permalink: false,
        description: &[&["summary"], &["content_text"], &["content_html"]],
        published: &[&["date_published"], &["date_modified"]],
    },
};

fn table_for(dialect: Dialect) -> &'static DialectTable {
    match dialect {
        Dialect::Rss2 => &RSS2,
        Dialect::Rss1Rdf => &RSS1_RDF,
        Dialect::Atom => &ATOM,
        Dialect::JsonFeed => &JSON_FEED,
    }
}

/// Reads the text content of a raw node.
///
/// Strings are returned as-is, numbers and booleans are stringified, objects
/// yield their `#text` (or, lacking one, the text of their child elements
/// joined by spaces), arrays yield their first element's text.
pub fn text_of(node: &Value) -> String {
    match node {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.first().map(text_of).unwrap_or_default(),
        Value::Object(map) => match map.get(TEXT_KEY) {
            Some(text) => text_of(text),
            None => map
                .iter()
                .filter(|(key, _)| !key.starts_with(ATTR_PREFIX))
                .map(|(_, child)| text_of(child))
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
        },
    }
}

/// Follows `path` from `node`, stepping into the first element whenever an
/// intermediate value is an array. The final value is returned untouched.
fn lookup<'a>(node: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(node, |current, key| {
        let current = match current {
            Value::Array(items) => items.first()?,
            other => other,
        };
        current.get(*key)
    })
}

/// First candidate path whose text is non-empty, trimmed; `""` otherwise.
fn first_text(node: &Value, paths: &[Path]) -> String {
    paths
        .iter()
        .filter_map(|path| lookup(node, path))
        .map(|value| text_of(value).trim().to_owned())
        .find(|text| !text.is_empty())
        .unwrap_or_default()
}

/// Link candidates from the first link path that yields any.
fn link_candidates(node: &Value, paths: &[LinkPath]) -> Vec<LinkCandidate> {
    paths
        .iter()
        .filter_map(|link_path| {
            let value = lookup(node, link_path.path)?;
            let mut candidates = collect_candidates(value);
            if link_path.alternate_only {
                candidates.retain(LinkCandidate::is_alternate);
            }
            (!candidates.is_empty()).then_some(candidates)
        })
        .next()
        .unwrap_or_default()
}

/// Coerces an entry container into a sequence: an array is used as-is, a
/// lone entry becomes a one-element sequence, absence is empty.
pub fn entry_nodes(container: Option<&Value>) -> Vec<&Value> {
    match container {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().collect(),
        Some(single) => vec![single],
    }
}

/// Deterministic identifier for entries whose source carries none.
fn generate_id(link: &str, title: &str, published: &str) -> String {
    let input = format!("{}|{}|{}", link, title, published);
    let hash = Sha256::digest(input.as_bytes());
    format!("{:x}", hash)
}

/// Maps a raw tree of the given dialect onto the canonical schema.
///
/// # Errors
///
/// Only caller hooks can fail; their errors are returned as
/// [`Error::Hook`] unmodified.
pub fn map_feed(dialect: Dialect, tree: &Value, options: &ExtractOptions) -> Result<Feed, Error> {
    let table = table_for(dialect);
    let feed_node = lookup(tree, table.feed_node).unwrap_or(&Value::Null);
    let feed_node = match feed_node {
        Value::Array(items) => items.first().unwrap_or(&Value::Null),
        other => other,
    };
    let resolver = LinkResolver::new(options.base_url.as_deref());
    let paths = &table.feed;

    let mut feed = Feed {
        title: clean_text(&first_text(feed_node, paths.title)),
        link: resolver.feed_link(&link_candidates(feed_node, paths.link)),
        description: clean_text(&first_text(feed_node, paths.description)),
        generator: first_text(feed_node, paths.generator),
        language: first_text(feed_node, paths.language),
        published: normalize_date(
            &first_text(feed_node, paths.published),
            options.use_iso_date_format,
        ),
        extra: Map::new(),
        entries: Vec::new(),
    };
    hooks::apply(&mut feed, options.get_extra_feed_fields.as_ref(), feed_node)?;

    let container = lookup(tree, table.entries_parent).and_then(|parent| {
        let parent = match parent {
            Value::Array(items) => items.first()?,
            other => other,
        };
        parent.get(table.entries_key)
    });
    let nodes = entry_nodes(container);

    feed.entries = nodes
        .into_iter()
        .map(|node| map_entry(&table.entry, node, &resolver, options))
        .collect::<Result<_, _>>()?;

    tracing::debug!(
        dialect = %dialect,
        entries = feed.entries.len(),
        "Mapped feed to canonical schema"
    );
    Ok(feed)
}

fn map_entry(
    paths: &EntryPaths,
    node: &Value,
    resolver: &LinkResolver,
    options: &ExtractOptions,
) -> Result<Entry, Error> {
    let title = clean_text(&first_text(node, paths.title));
    let published_raw = first_text(node, paths.published);

    let mut candidates = link_candidates(node, paths.link);
    if candidates.is_empty() && paths.guid_permalink {
        candidates.extend(node.get("guid").and_then(permalink_candidate));
    }
    let link = resolver.entry_link(&candidates);

    let id = match first_text(node, paths.id) {
        id if id.is_empty() => generate_id(&link, &title, &published_raw),
        id => id,
    };

    let mut entry = Entry {
        id,
        title,
        link,
        description: clean_text(&first_text(node, paths.description)),
        published: normalize_date(&published_raw, options.use_iso_date_format),
        extra: Map::new(),
    };
    hooks::apply(&mut entry, options.get_extra_entry_fields.as_ref(), node)?;
    Ok(entry)
}

/// Returns the dialect-native object with no renaming.
///
/// The object is the RSS `<channel>`, the RDF root, the Atom `<feed>` or the
/// JSON Feed document. The only change is that a lone entry in the entry
/// container becomes a one-element array.
pub fn passthrough(dialect: Dialect, tree: &Value) -> Value {
    let table = table_for(dialect);
    let mut node = match lookup(tree, table.entries_parent) {
        Some(Value::Array(items)) => items.first().cloned().unwrap_or(Value::Null),
        Some(other) => other.clone(),
        None => Value::Null,
    };

    if let Some(container) = node.get_mut(table.entries_key) {
        if !container.is_array() {
            let single = container.take();
            *container = Value::Array(vec![single]);
        }
    }
    node
}
