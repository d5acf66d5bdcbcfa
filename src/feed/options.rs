use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Error type a field hook may fail with. Returned to the caller unmodified.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A caller-supplied extractor run against a dialect-native node.
///
/// Receives the raw node (the RSS `<channel>`, the Atom `<feed>`, an `<item>`,
/// a JSON Feed item, ...) before any mapping and returns extra keys to merge
/// into the canonical object.
pub type FieldHook = Arc<dyn Fn(&Value) -> Result<Map<String, Value>, BoxError> + Send + Sync>;

/// Options controlling how a feed is normalized.
///
/// One immutable value is threaded through every pipeline step; nothing is
/// stored globally, so concurrent extractions with different options never
/// interfere.
#[derive(Clone)]
pub struct ExtractOptions {
    /// Map to the canonical schema (`true`) or return the dialect-native object.
    pub normalization: bool,
    /// Rewrite dates as ISO 8601 UTC with millisecond precision.
    pub use_iso_date_format: bool,
    /// Root URL used to absolutize relative links.
    pub base_url: Option<String>,
    pub get_extra_feed_fields: Option<FieldHook>,
    pub get_extra_entry_fields: Option<FieldHook>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            normalization: true,
            use_iso_date_format: false,
            base_url: None,
            get_extra_feed_fields: None,
            get_extra_entry_fields: None,
        }
    }
}

impl fmt::Debug for ExtractOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractOptions")
            .field("normalization", &self.normalization)
            .field("use_iso_date_format", &self.use_iso_date_format)
            .field("base_url", &self.base_url)
            .field(
                "get_extra_feed_fields",
                &self.get_extra_feed_fields.as_ref().map(|_| "<hook>"),
            )
            .field(
                "get_extra_entry_fields",
                &self.get_extra_entry_fields.as_ref().map(|_| "<hook>"),
            )
            .finish()
    }
}

impl ExtractOptions {
    #[must_use]
    pub fn builder() -> ExtractOptionsBuilder {
        ExtractOptionsBuilder::default()
    }
}

#[derive(Default)]
pub struct ExtractOptionsBuilder {
    inner: ExtractOptions,
}

impl ExtractOptionsBuilder {
    #[must_use]
    pub fn build(self) -> ExtractOptions {
        self.inner
    }

    #[must_use]
    pub fn normalization(mut self, normalization: bool) -> Self {
        self.inner.normalization = normalization;
        self
    }

    #[must_use]
    pub fn use_iso_date_format(mut self, use_iso_date_format: bool) -> Self {
        self.inner.use_iso_date_format = use_iso_date_format;
        self
    }

    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.inner.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn get_extra_feed_fields<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Value) -> Result<Map<String, Value>, BoxError> + Send + Sync + 'static,
    {
        self.inner.get_extra_feed_fields = Some(Arc::new(hook));
        self
    }

    #[must_use]
    pub fn get_extra_entry_fields<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Value) -> Result<Map<String, Value>, BoxError> + Send + Sync + 'static,
    {
        self.inner.get_extra_entry_fields = Some(Arc::new(hook));
        self
    }
}

/// Routes the request through a URL-prefix proxy service.
///
/// The fetched URL becomes `target` followed by the percent-encoded feed URL,
/// e.g. `https://proxy.example/api?url=https%3A%2F%2Fsite%2Ffeed`.
#[derive(Debug, Clone, Default)]
pub struct ProxyOptions {
    pub target: String,
    /// Headers sent to the proxy instead of the feed-level ones.
    pub headers: HashMap<String, String>,
}

/// Options forwarded to the retriever. Opaque to the normalization pipeline.
#[derive(Debug, Clone)]
pub struct RetrieverOptions {
    /// Extra request headers; a `user-agent` entry overrides the default.
    pub headers: HashMap<String, String>,
    pub proxy: Option<ProxyOptions>,
    /// HTTP(S) proxy URL the client connects through.
    pub http_proxy: Option<String>,
    pub timeout: Duration,
}

impl Default for RetrieverOptions {
    fn default() -> Self {
        Self {
            headers: HashMap::new(),
            proxy: None,
            http_proxy: None,
            timeout: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let opts = ExtractOptions::default();
        assert!(opts.normalization);
        assert!(!opts.use_iso_date_format);
        assert!(opts.base_url.is_none());
        assert!(opts.get_extra_feed_fields.is_none());
        assert!(opts.get_extra_entry_fields.is_none());

        let retriever = RetrieverOptions::default();
        assert_eq!(retriever.timeout, Duration::from_secs(30));
        assert!(retriever.proxy.is_none());
    }

    #[test]
    fn test_builder_sets_every_option() {
        let opts = ExtractOptions::builder()
            .normalization(false)
            .use_iso_date_format(true)
            .base_url("https://example.com")
            .get_extra_feed_fields(|node| {
                let mut extra = Map::new();
                extra.insert("copy".into(), node.clone());
                Ok(extra)
            })
            .build();

        assert!(!opts.normalization);
        assert!(opts.use_iso_date_format);
        assert_eq!(opts.base_url.as_deref(), Some("https://example.com"));
        let hook = opts.get_extra_feed_fields.as_ref().unwrap();
        assert_eq!(hook(&json!(1)).unwrap()["copy"], json!(1));
    }

    #[test]
    fn test_debug_hides_hook_bodies() {
        let opts = ExtractOptions::builder()
            .get_extra_entry_fields(|_| Ok(Map::new()))
            .build();
        let debug = format!("{:?}", opts);
        assert!(debug.contains("<hook>"));
        assert!(debug.contains("normalization: true"));
    }
}
