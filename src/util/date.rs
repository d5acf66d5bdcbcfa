use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// Naive timestamp layouts seen in the wild, interpreted as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Offset-bearing layouts that neither RFC 3339 nor RFC 2822 accept.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%a, %d %b %Y %H:%M %z",
    "%d %b %Y %H:%M %z",
];

/// Normalizes a feed date string according to the selected date mode.
///
/// With `use_iso` off the source string is returned unchanged. With it on,
/// the result is [`to_iso_date_string`].
pub fn normalize_date(raw: &str, use_iso: bool) -> String {
    if use_iso {
        to_iso_date_string(raw)
    } else {
        raw.to_owned()
    }
}

/// Converts a feed date into ISO 8601 UTC with millisecond precision.
///
/// Accepts RFC 2822 (RSS `pubDate`), RFC 3339 with any fractional second
/// precision (Atom, JSON Feed), and a handful of common near-misses.
/// Sub-millisecond digits are truncated, not rounded. Anything that cannot
/// be parsed, the empty string included, yields `""`.
///
/// # Examples
///
/// ```
/// use feedex::util::to_iso_date_string;
///
/// assert_eq!(
///     to_iso_date_string("Thu, 28 Jul 2022 08:59:58 GMT"),
///     "2022-07-28T08:59:58.000Z"
/// );
/// assert_eq!(
///     to_iso_date_string("2022-07-28T02:43:00.000000000Z"),
///     "2022-07-28T02:43:00.000Z"
/// );
/// assert_eq!(to_iso_date_string("garbage"), "");
/// ```
pub fn to_iso_date_string(raw: &str) -> String {
    parse_date(raw)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

/// Parses a feed date string into a UTC instant.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(dt) = parse_with_offset(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Feeds often carry a weekday that disagrees with the date; the date wins
    if let Some(dt) = strip_weekday(s).and_then(parse_with_offset) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// RFC 2822 and the offset-bearing near-misses.
fn parse_with_offset(s: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt);
    }
    // "UTC" is not an RFC 2822 zone name but shows up constantly
    if let Some(head) = s.strip_suffix(" UTC") {
        if let Ok(dt) = DateTime::parse_from_rfc2822(&format!("{head} GMT")) {
            return Some(dt);
        }
    }
    OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(s, fmt).ok())
}

/// Drops a leading `Word, ` day name, abbreviated or not.
fn strip_weekday(s: &str) -> Option<&str> {
    let (day, rest) = s.split_once(',')?;
    if day.is_empty() || !day.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some(rest.trim_start())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_rfc2822_gmt() {
        assert_eq!(
            to_iso_date_string("Thu, 28 Jul 2022 08:59:58 GMT"),
            "2022-07-28T08:59:58.000Z"
        );
    }

    #[test]
    fn test_rfc2822_with_offset() {
        assert_eq!(
            to_iso_date_string("Wed, 23 Aug 2023 18:40:00 -0400"),
            "2023-08-23T22:40:00.000Z"
        );
        assert_eq!(
            to_iso_date_string("Mon, 06 Sep 2021 16:45:00 PDT"),
            "2021-09-06T23:45:00.000Z"
        );
    }

    #[test]
    fn test_rfc2822_utc_suffix() {
        assert_eq!(
            to_iso_date_string("Fri, 04 Aug 2023 10:00:00 UTC"),
            "2023-08-04T10:00:00.000Z"
        );
    }

    #[test]
    fn test_rfc2822_wrong_weekday_keeps_date() {
        // 28 Jul 2022 was a Thursday
        assert_eq!(
            to_iso_date_string("Wed, 28 Jul 2022 08:59:58 GMT"),
            "2022-07-28T08:59:58.000Z"
        );
        assert_eq!(
            to_iso_date_string("Thursday, 28 Jul 2022 08:59:58 GMT"),
            "2022-07-28T08:59:58.000Z"
        );
        assert_eq!(
            to_iso_date_string("Mon, 28 Jul 2022 08:59 +0200"),
            "2022-07-28T06:59:00.000Z"
        );
    }

    #[test]
    fn test_strip_weekday() {
        assert_eq!(strip_weekday("Thu, 28 Jul 2022"), Some("28 Jul 2022"));
        assert_eq!(strip_weekday("28 Jul 2022"), None);
        assert_eq!(strip_weekday("2022-07-28, noon"), None);
    }

    #[test]
    fn test_rfc3339_nanoseconds_truncated() {
        assert_eq!(
            to_iso_date_string("2022-07-28T02:43:00.000000000Z"),
            "2022-07-28T02:43:00.000Z"
        );
        assert_eq!(
            to_iso_date_string("2022-07-28T02:43:00.123999999Z"),
            "2022-07-28T02:43:00.123Z"
        );
    }

    #[test]
    fn test_rfc3339_offset_converted_to_utc() {
        assert_eq!(
            to_iso_date_string("2023-08-24T01:00:00+02:00"),
            "2023-08-23T23:00:00.000Z"
        );
    }

    #[test]
    fn test_offset_without_colon() {
        assert_eq!(
            to_iso_date_string("2023-08-24T01:00:00+0200"),
            "2023-08-23T23:00:00.000Z"
        );
    }

    #[test]
    fn test_naive_and_date_only() {
        assert_eq!(
            to_iso_date_string("2023-08-24 01:00:00"),
            "2023-08-24T01:00:00.000Z"
        );
        assert_eq!(to_iso_date_string("2020-08-07"), "2020-08-07T00:00:00.000Z");
    }

    #[test]
    fn test_unparseable_is_empty() {
        assert_eq!(to_iso_date_string(""), "");
        assert_eq!(to_iso_date_string("   "), "");
        assert_eq!(to_iso_date_string("garbage"), "");
        assert_eq!(to_iso_date_string("Thi, 280 Jul 2022 108:79:68 XMT"), "");
    }

    #[test]
    fn test_default_mode_passes_through() {
        assert_eq!(
            normalize_date("Thu, 28 Jul 2022 03:39:57 GMT", false),
            "Thu, 28 Jul 2022 03:39:57 GMT"
        );
        assert_eq!(normalize_date("garbage", false), "garbage");
        assert_eq!(
            normalize_date("Thu, 28 Jul 2022 03:39:57 GMT", true),
            "2022-07-28T03:39:57.000Z"
        );
    }

    proptest! {
        #[test]
        fn iso_output_is_empty_or_utc(s in "\\PC*") {
            let out = to_iso_date_string(&s);
            prop_assert!(out.is_empty() || out.ends_with('Z'));
        }
    }
}
