//! Integration tests for `extract()`: retrieval, dispatch and error surfaces.
//!
//! Every test starts its own `wiremock` server so responses never leak
//! between tests.

use feedex::feed::{extract, Error, ExtractOptions, FetchError, RetrieverOptions};
use pretty_assertions::assert_eq;
use serde_json::{json, Map};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fixture(name: &str) -> String {
    let path = format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("missing fixture {path}: {e}"))
}

async fn serve(route: &str, body: String, content_type: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(body, content_type),
        )
        .mount(&server)
        .await;
    server
}

// ============================================================================
// Error surfaces
// ============================================================================

#[tokio::test]
async fn test_invalid_url_is_rejected() {
    let err = extract("not-a-url", &ExtractOptions::default(), &RetrieverOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Input param must be a valid URL");
}

#[tokio::test]
async fn test_404_is_reported_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/alpha/beta", server.uri());
    let err = extract(&url, &ExtractOptions::default(), &RetrieverOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Retrieval(FetchError::HttpStatus(404))));
    assert_eq!(err.to_string(), "Request failed with error code 404");
}

#[tokio::test]
async fn test_empty_body_reports_source() {
    let server = serve("/rss", "   \n ".to_owned(), "application/xml").await;
    let url = format!("{}/rss", server.uri());

    let err = extract(&url, &ExtractOptions::default(), &RetrieverOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), format!("Failed to load content from \"{}\"", url));
}

#[tokio::test]
async fn test_invalid_xml_body() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8><noop><oops></ooops>"#.to_owned();
    let server = serve("/rss", xml, "application/xml").await;

    let err = extract(
        &format!("{}/rss", server.uri()),
        &ExtractOptions::default(),
        &RetrieverOptions::default(),
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "The XML document is not well-formed");
}

#[tokio::test]
async fn test_invalid_json_body() {
    let server = serve("/jsonfeed", "this is not json string".to_owned(), "application/json").await;

    let err = extract(
        &format!("{}/jsonfeed", server.uri()),
        &ExtractOptions::default(),
        &RetrieverOptions::default(),
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "Failed to convert data to JSON object");
}

#[tokio::test]
async fn test_unsupported_content_type() {
    let server = serve("/feed", fixture("rss-feed-standard.xml"), "text/plain").await;

    let err = extract(
        &format!("{}/feed", server.uri()),
        &ExtractOptions::default(),
        &RetrieverOptions::default(),
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "Invalid content type: text/plain");
}

// ============================================================================
// Dispatch by content type
// ============================================================================

#[tokio::test]
async fn test_rss_over_http() {
    let server = serve("/rss", fixture("rss-feed-standard-realworld.xml"), "application/rss+xml").await;
    let options = ExtractOptions::builder().use_iso_date_format(true).build();

    let feed = extract(&format!("{}/rss", server.uri()), &options, &RetrieverOptions::default())
        .await
        .unwrap()
        .into_feed()
        .unwrap();

    assert_eq!(feed.published, "2022-07-28T03:39:57.000Z");
    assert_eq!(feed.entries[0].published, "2022-07-28T02:43:00.000Z");
}

#[tokio::test]
async fn test_json_feed_over_http() {
    let server = serve("/json", fixture("json-feed-standard-realworld.json"), "text/json").await;
    let options = ExtractOptions::builder()
        .get_extra_feed_fields(|node| {
            let mut extra = Map::new();
            extra.insert("icon".into(), node["icon"].clone());
            Ok(extra)
        })
        .build();

    let result = extract(&format!("{}/json", server.uri()), &options, &RetrieverOptions::default())
        .await
        .unwrap();
    let value = result.to_value().unwrap();

    assert_eq!(value["icon"], json!("https://micro.blog/manton/avatar.jpg"));
    assert_eq!(value["entries"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_raw_podcast_over_http() {
    let server = serve("/podcast/rss", fixture("podcast.rss"), "application/xml").await;
    let options = ExtractOptions::builder().normalization(false).build();

    let result = extract(
        &format!("{}/podcast/rss", server.uri()),
        &options,
        &RetrieverOptions::default(),
    )
    .await
    .unwrap();
    let raw = result.raw().unwrap();

    assert!(raw.get("itunes:owner").is_some());
    assert!(raw["item"][0].get("itunes:duration").is_some());
}

#[tokio::test]
async fn test_base_url_over_http() {
    let server = serve("/blog/rss", fixture("rss-feed-miss-base-url.xml"), "application/xml").await;
    let options = ExtractOptions::builder()
        .base_url("https://huggingface.co")
        .build();

    let feed = extract(
        &format!("{}/blog/rss", server.uri()),
        &options,
        &RetrieverOptions::default(),
    )
    .await
    .unwrap()
    .into_feed()
    .unwrap();

    assert_eq!(feed.link, "https://huggingface.co/blog");
    assert_eq!(feed.entries[0].link, "https://huggingface.co/blog/intro-graphml");
}

#[tokio::test]
#[allow(deprecated)]
async fn test_deprecated_read_still_works() {
    let server = serve("/rss", fixture("rss-feed-standard-realworld.xml"), "application/xml").await;
    let options = ExtractOptions::builder().use_iso_date_format(true).build();
    let url = format!("{}/rss", server.uri());

    let via_read = feedex::feed::read(&url, &options, &RetrieverOptions::default())
        .await
        .unwrap();
    let via_extract = extract(&url, &options, &RetrieverOptions::default())
        .await
        .unwrap();

    assert_eq!(via_read, via_extract);
    assert_eq!(
        via_read.feed().map(|f| f.published.as_str()),
        Some("2022-07-28T03:39:57.000Z")
    );
}
