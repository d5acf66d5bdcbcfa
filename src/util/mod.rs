//! Utility functions shared by the normalization pipeline.
//!
//! - **Dates**: reconcile RFC 2822 / RFC 3339 / ad-hoc feed dates into ISO 8601
//! - **URLs**: plain syntax validation and tracking-parameter removal
//! - **Text**: reduce HTML fragments in titles and descriptions to plain text
//!
//! # Examples
//!
//! ```
//! use feedex::util::{clean_text, is_valid_url, to_iso_date_string};
//!
//! assert!(is_valid_url("https://example.com/feed.xml"));
//! assert_eq!(clean_text("<b>Breaking</b>  news"), "Breaking news");
//! assert_eq!(to_iso_date_string("2022-07-28T02:43:00Z"), "2022-07-28T02:43:00.000Z");
//! ```

mod date;
mod text;
mod url_validator;

pub use date::{normalize_date, parse_date, to_iso_date_string};
pub use text::{clean_text, collapse_whitespace, html_to_text, strip_control_chars};
pub use url_validator::{is_valid_url, parse_http_url, purify};
