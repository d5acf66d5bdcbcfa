use futures::StreamExt;
use thiserror::Error;
use url::form_urlencoded::byte_serialize;

use crate::feed::options::RetrieverOptions;

const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// User-Agent sent unless the caller provides one.
pub const DEFAULT_USER_AGENT: &str = concat!("feedex/", env!("CARGO_PKG_VERSION"));

/// Errors that can occur while retrieving a feed document.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with a non-2xx status code
    #[error("Request failed with error code {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Response was neither JSON nor XML
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
    /// `http_proxy` is not a usable proxy URL
    #[error("Invalid proxy URL: {0}")]
    InvalidProxy(String),
}

/// Which pipeline a retrieved body belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Xml,
    Json,
}

/// A successfully retrieved document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retrieved {
    pub kind: ContentKind,
    /// Body decoded as UTF-8 and whitespace-trimmed; may be empty.
    pub text: String,
}

/// Builds the HTTP client for one retrieval.
///
/// # Errors
///
/// Returns [`FetchError::InvalidProxy`] if `http_proxy` is set but unusable.
pub fn build_client(options: &RetrieverOptions) -> Result<reqwest::Client, FetchError> {
    let mut builder = reqwest::Client::builder()
        .user_agent(DEFAULT_USER_AGENT)
        .timeout(options.timeout);

    if let Some(proxy_url) = options.http_proxy.as_deref() {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|_| FetchError::InvalidProxy(proxy_url.to_owned()))?;
        builder = builder.proxy(proxy);
    }

    builder.build().map_err(FetchError::Network)
}

/// Fetches `url` with a fresh client built from `options`.
///
/// # Errors
///
/// See [`retrieve_with`].
pub async fn retrieve(url: &str, options: &RetrieverOptions) -> Result<Retrieved, FetchError> {
    let client = build_client(options)?;
    retrieve_with(&client, url, options).await
}

/// Fetches `url` (or its proxied form) and classifies the body.
///
/// A single attempt is made; retry policy belongs to the caller.
///
/// # Errors
///
/// - [`FetchError::Network`] - Connection or TLS errors
/// - [`FetchError::Timeout`] - Request exceeded `options.timeout`
/// - [`FetchError::HttpStatus`] - Non-2xx HTTP response
/// - [`FetchError::InvalidContentType`] - Neither JSON nor XML
/// - [`FetchError::ResponseTooLarge`] - Response exceeded 10MB
pub async fn retrieve_with(
    client: &reqwest::Client,
    url: &str,
    options: &RetrieverOptions,
) -> Result<Retrieved, FetchError> {
    let (target, headers) = match &options.proxy {
        Some(proxy) => {
            let encoded: String = byte_serialize(url.as_bytes()).collect();
            (format!("{}{}", proxy.target, encoded), &proxy.headers)
        }
        None => (url.to_owned(), &options.headers),
    };

    let mut request = client.get(&target);
    for (name, value) in headers {
        request = request.header(name.as_str(), value.as_str());
    }

    tracing::debug!(url = %url, target = %target, "Retrieving feed");
    let response = tokio::time::timeout(options.timeout, request.send())
        .await
        .map_err(|_| FetchError::Timeout)?
        .map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Network(e)
            }
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::HttpStatus(status.as_u16()));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    let kind = classify(&content_type)?;

    let bytes = read_limited_bytes(response, MAX_FEED_SIZE).await?;
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(url = %url, "Response is not valid UTF-8, decoding lossily");
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    };

    tracing::debug!(url = %url, kind = ?kind, bytes = text.len(), "Retrieved feed");
    Ok(Retrieved {
        kind,
        text: text.trim().to_owned(),
    })
}

/// Maps a `Content-Type` header value onto a pipeline.
///
/// # Errors
///
/// Returns [`FetchError::InvalidContentType`] for anything that is neither
/// JSON nor XML (HTML counts as XML).
pub fn classify(content_type: &str) -> Result<ContentKind, FetchError> {
    let lowered = content_type.to_ascii_lowercase();
    if lowered.contains("json") {
        Ok(ContentKind::Json)
    } else if lowered.contains("/xml") || lowered.contains("+xml") || lowered.contains("/html") {
        Ok(ContentKind::Xml)
    } else {
        Err(FetchError::InvalidContentType(content_type.to_owned()))
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Capture Content-Length for completeness check
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let Some(len) = expected_length {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}
