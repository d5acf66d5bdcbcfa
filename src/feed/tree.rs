use std::borrow::Cow;

use quick_xml::escape::resolve_html5_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};
use thiserror::Error;

/// SEC-003: Maximum element nesting depth.
/// Feeds are shallow; anything deeper is a crafted document.
const MAX_TREE_DEPTH: usize = 256;

/// Prefix marking attribute keys in the raw tree.
pub const ATTR_PREFIX: &str = "@_";
/// Key holding element text when the element also has attributes or children.
pub const TEXT_KEY: &str = "#text";

pub const ATOM_NS: &str = "http://www.w3.org/2005/Atom";
pub const ATOM_03_NS: &str = "http://purl.org/atom/ns#";

/// Errors raised while building a raw tree from XML text.
#[derive(Debug, Error)]
pub enum TreeError {
    /// The tokenizer rejected the document (bad syntax, mismatched end tag, ...).
    #[error("XML parse error: {0}")]
    Syntax(String),

    #[error("element <{0}> is never closed")]
    Unclosed(String),

    #[error("text found outside the root element")]
    TextOutsideRoot,

    #[error("document has more than one root element")]
    MultipleRoots,

    #[error("document has no root element")]
    NoRoot,

    /// SEC-003: Nesting depth exceeds safety limit.
    #[error("nesting depth exceeds maximum of {0} levels")]
    MaxDepthExceeded(usize),
}

/// An element being assembled while its children are still streaming in.
struct Frame {
    name: String,
    node: Map<String, Value>,
    text: String,
}

impl Frame {
    fn open(e: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Result<Self, TreeError> {
        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let mut node = Map::new();

        for attr_result in e.attributes() {
            let attr = attr_result.map_err(|e| TreeError::Syntax(e.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref());
            // SEC-002: entity declarations are never read; only the static HTML5 table resolves
            let value = match attr.decode_and_unescape_value_with(reader.decoder(), |entity| {
                resolve_html5_entity(entity)
            }) {
                Ok(v) => v.into_owned(),
                Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
            };
            node.insert(format!("{ATTR_PREFIX}{key}"), Value::String(value));
        }

        Ok(Self {
            name,
            node,
            text: String::new(),
        })
    }

    fn push_text(&mut self, segment: &str) {
        if segment.is_empty() {
            return;
        }
        if !self.text.is_empty() {
            self.text.push(' ');
        }
        self.text.push_str(segment);
    }

    fn finish(self) -> (String, Value) {
        if self.node.is_empty() {
            return (self.name, Value::String(self.text));
        }
        let mut node = self.node;
        if !self.text.is_empty() {
            node.insert(TEXT_KEY.to_owned(), Value::String(self.text));
        }
        (self.name, Value::Object(node))
    }
}

/// Inserts a child under `name`, turning repeated siblings into an array.
fn insert_child(node: &mut Map<String, Value>, name: String, child: Value) {
    match node.get_mut(&name) {
        Some(Value::Array(items)) => items.push(child),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, child]);
        }
        None => {
            node.insert(name, child);
        }
    }
}

/// Returns true when `text` is a well-formed XML document.
pub fn validate(text: &str) -> bool {
    parse(text).is_ok()
}

/// Converts XML text into a raw tree.
///
/// The result is `{ <root name>: <root node> }`. Element names and attribute
/// names keep their namespace prefixes (`dc:date`, `@_rdf:about`). Leaf
/// elements without attributes become plain strings; everything else is an
/// object with `@_`-prefixed attributes, child elements and a `#text` entry.
/// Repeated siblings collapse into an array in document order.
///
/// # Errors
///
/// Returns [`TreeError`] when the document is not well-formed: syntax errors,
/// mismatched or missing end tags, stray text or elements outside the single
/// root, or an empty document.
///
/// # Security
///
/// `quick-xml` (0.37) never expands `<!ENTITY>` declarations, so external
/// entities cannot be smuggled in through a DOCTYPE.
pub fn parse(text: &str) -> Result<Value, TreeError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if stack.is_empty() && root.is_some() {
                    return Err(TreeError::MultipleRoots);
                }
                if stack.len() >= MAX_TREE_DEPTH {
                    return Err(TreeError::MaxDepthExceeded(MAX_TREE_DEPTH));
                }
                stack.push(Frame::open(&e, &reader)?);
            }
            Ok(Event::Empty(e)) => {
                let frame = Frame::open(&e, &reader)?;
                close_frame(frame, &mut stack, &mut root)?;
            }
            Ok(Event::End(_)) => {
                // check_end_names is on, so the tokenizer already matched the name
                let frame = stack
                    .pop()
                    .ok_or_else(|| TreeError::Syntax("unexpected end tag".to_owned()))?;
                close_frame(frame, &mut stack, &mut root)?;
            }
            Ok(Event::Text(t)) => {
                // Unknown entities keep the segment raw for the mapper to decode
                let segment = match t.unescape_with(|entity| resolve_html5_entity(entity)) {
                    Ok(s) => s,
                    Err(_) => Cow::Owned(String::from_utf8_lossy(&t).into_owned()),
                };
                push_text(&mut stack, &segment)?;
            }
            Ok(Event::CData(c)) => {
                let segment = String::from_utf8_lossy(&c).into_owned();
                push_text(&mut stack, segment.trim())?;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(TreeError::Syntax(e.to_string())),
            // Declarations, processing instructions, comments, DOCTYPE
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(TreeError::Unclosed(open.name.clone()));
    }

    let (name, node) = root.ok_or(TreeError::NoRoot)?;
    let mut doc = Map::new();
    doc.insert(name, node);
    Ok(Value::Object(doc))
}

fn push_text(stack: &mut [Frame], segment: &str) -> Result<(), TreeError> {
    match stack.last_mut() {
        Some(frame) => {
            frame.push_text(segment);
            Ok(())
        }
        None if segment.trim().is_empty() => Ok(()),
        None => Err(TreeError::TextOutsideRoot),
    }
}

fn close_frame(
    frame: Frame,
    stack: &mut [Frame],
    root: &mut Option<(String, Value)>,
) -> Result<(), TreeError> {
    let (name, value) = frame.finish();
    match stack.last_mut() {
        Some(parent) => insert_child(&mut parent.node, name, value),
        None if root.is_some() => return Err(TreeError::MultipleRoots),
        None => *root = Some((name, value)),
    }
    Ok(())
}

/// Checks whether a node declares `uri` as its default or a prefixed namespace.
fn declares_namespace(node: &Value, uri: &str) -> bool {
    node.as_object().is_some_and(|attrs| {
        attrs.iter().any(|(key, value)| {
            let is_xmlns = key == "@_xmlns" || key.starts_with("@_xmlns:");
            is_xmlns
                && value
                    .as_str()
                    .is_some_and(|v| v.trim_end_matches('/') == uri.trim_end_matches('/'))
        })
    })
}

/// An `<rss>` root with a `<channel>` child.
pub fn is_rss(tree: &Value) -> bool {
    tree.get("rss").and_then(|rss| rss.get("channel")).is_some()
}

/// An `<rdf:RDF>` root that declares the RDF namespace and carries a `<channel>`.
pub fn is_rdf(tree: &Value) -> bool {
    tree.get("rdf:RDF")
        .is_some_and(|rdf| rdf.get("@_xmlns:rdf").is_some() && rdf.get("channel").is_some())
}

/// A `<feed>` root that declares the Atom 1.0 (or legacy 0.3) namespace.
pub fn is_atom(tree: &Value) -> bool {
    tree.get("feed")
        .is_some_and(|feed| declares_namespace(feed, ATOM_NS) || declares_namespace(feed, ATOM_03_NS))
}

/// A decoded JSON object whose `version` names a JSON Feed version URL.
pub fn is_json_feed(value: &Value) -> bool {
    value
        .get("version")
        .and_then(Value::as_str)
        .is_some_and(|v| v.contains("jsonfeed.org/version"))
}
