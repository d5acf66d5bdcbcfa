use serde_json::Value;
use url::Url;

use crate::feed::mapper::text_of;
use crate::feed::tree::TEXT_KEY;
use crate::util::{parse_http_url, purify};

/// One link representation found in a feed: a bare URL string or an
/// Atom-style `{href, rel}` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCandidate {
    pub href: String,
    pub rel: Option<String>,
}

impl LinkCandidate {
    pub(crate) fn is_alternate(&self) -> bool {
        self.rel
            .as_deref()
            .is_some_and(|rel| rel.eq_ignore_ascii_case("alternate"))
    }
}

/// Collects link candidates from a raw link node, in document order.
///
/// Strings become relation-less candidates. Objects contribute their `@_href`
/// attribute (Atom) or their text (`<link>` with attributes in RSS), with the
/// `@_rel` attribute as relation. An `@_href` link without `@_rel` is an
/// `alternate` link (RFC 4287 section 4.2.7.2). Arrays are flattened. Empty
/// hrefs are dropped.
pub fn collect_candidates(node: &Value) -> Vec<LinkCandidate> {
    let mut out = Vec::new();
    push_candidates(node, &mut out);
    out
}

fn push_candidates(node: &Value, out: &mut Vec<LinkCandidate>) {
    let (href, rel) = match node {
        Value::Array(items) => {
            for item in items {
                push_candidates(item, out);
            }
            return;
        }
        Value::Object(map) => {
            let rel = map.get("@_rel").map(text_of).filter(|r| !r.is_empty());
            match map.get("@_href") {
                Some(href) => (text_of(href), rel.or_else(|| Some("alternate".to_owned()))),
                None => (map.get(TEXT_KEY).map(text_of).unwrap_or_default(), rel),
            }
        }
        other => (text_of(other), None),
    };

    let href = href.trim();
    if !href.is_empty() {
        out.push(LinkCandidate {
            href: href.to_owned(),
            rel,
        });
    }
}

/// Picks the canonical link: the first `alternate` candidate, otherwise the
/// first candidate in document order.
pub fn select(candidates: &[LinkCandidate]) -> Option<&str> {
    candidates
        .iter()
        .find(|c| c.is_alternate())
        .or_else(|| candidates.first())
        .map(|c| c.href.as_str())
}

/// Builds the RSS 2.0 `<guid>` fallback link.
///
/// A guid only stands in for a missing `<link>` when it is a permanent URL:
/// either flagged `isPermaLink="true"` or, with the flag absent, already an
/// absolute URL. `isPermaLink="false"` always disqualifies it.
pub fn permalink_candidate(guid: &Value) -> Option<LinkCandidate> {
    let flag = guid.get("@_isPermaLink").map(text_of);
    let href = text_of(guid).trim().to_owned();
    if href.is_empty() {
        return None;
    }

    let is_permalink = match flag.as_deref().map(str::trim) {
        Some(f) if f.eq_ignore_ascii_case("false") => false,
        Some(f) if f.eq_ignore_ascii_case("true") => true,
        _ => parse_http_url(&href).is_some(),
    };

    is_permalink.then_some(LinkCandidate { href, rel: None })
}

/// Turns selected link candidates into canonical absolute URLs.
///
/// Holds the optional caller `baseUrl`. Nothing here ever fails: a link that
/// cannot be made into an absolute `http(s)` URL canonicalizes to `""`.
#[derive(Debug, Clone, Default)]
pub struct LinkResolver {
    base: Option<Url>,
    base_raw: Option<String>,
}

impl LinkResolver {
    pub fn new(base_url: Option<&str>) -> Self {
        let Some(raw) = base_url.map(str::trim).filter(|s| !s.is_empty()) else {
            return Self::default();
        };

        match parse_http_url(raw) {
            Some(base) => Self {
                base: Some(base),
                base_raw: Some(raw.to_owned()),
            },
            None => {
                tracing::warn!(base_url = %raw, "Ignoring invalid baseUrl");
                Self::default()
            }
        }
    }

    /// Resolves `href` against the base URL and strips tracking parameters.
    ///
    /// Absolute URLs pass through (purified). Relative references need a
    /// base; protocol-relative ones (`//host/x`) default to `https:` without
    /// one. Everything else yields `""`.
    pub fn absolutize(&self, href: &str) -> String {
        let href = href.trim();
        if href.is_empty() {
            return String::new();
        }

        if let Some(url) = parse_http_url(href) {
            return purify(url).into();
        }

        let joined = match &self.base {
            Some(base) => base.join(href).ok(),
            None if href.starts_with("//") => Url::parse(&format!("https:{href}")).ok(),
            None => None,
        };

        joined
            .filter(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
            .map(|url| purify(url).into())
            .unwrap_or_default()
    }

    /// Canonical feed-level link.
    ///
    /// When the feed declares no link at all and a base URL was given, the
    /// base URL itself is the link.
    pub fn feed_link(&self, candidates: &[LinkCandidate]) -> String {
        match select(candidates) {
            Some(href) => self.absolutize(href),
            None => self.base_raw.clone().unwrap_or_default(),
        }
    }

    /// Canonical entry-level link; `""` when the entry has none.
    pub fn entry_link(&self, candidates: &[LinkCandidate]) -> String {
        select(candidates)
            .map(|href| self.absolutize(href))
            .unwrap_or_default()
    }
}
