use std::borrow::Cow;

use scraper::Html;

/// Reduces feed-supplied markup to a single line of plain text.
///
/// Applies, in order: control character stripping, HTML text extraction
/// (tags dropped, the full HTML5 entity table decoded) and whitespace
/// collapsing. Used for canonical titles and descriptions, which are often
/// HTML fragments wrapped in CDATA.
///
/// # Examples
///
/// ```
/// use feedex::util::clean_text;
///
/// assert_eq!(clean_text("<p>Hello <b>world</b></p>"), "Hello world");
/// assert_eq!(clean_text("Fish &amp; Chips"), "Fish & Chips");
/// assert_eq!(clean_text("Caf&eacute; &euro;5"), "Caf\u{e9} \u{20ac}5");
/// ```
pub fn clean_text(s: &str) -> String {
    let stripped = strip_control_chars(s);
    let text = html_to_text(&stripped);
    collapse_whitespace(&text)
}

/// Extracts the text content of an HTML fragment.
///
/// The fragment goes through an HTML5 parser, so every named and numeric
/// entity is decoded and malformed markup is recovered the way a browser
/// would. Each text node is preceded by a space so adjacent block elements
/// do not glue words together; callers collapse whitespace afterwards.
/// Comments, `<script>` and `<style>` bodies are dropped.
pub fn html_to_text(s: &str) -> Cow<'_, str> {
    if !s.contains(['<', '&']) {
        return Cow::Borrowed(s);
    }

    let fragment = Html::parse_fragment(s);
    let mut out = String::with_capacity(s.len());

    for node in fragment.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|parent| parent.value().as_element().map(|el| el.name()))
            .is_some_and(|name| matches!(name, "script" | "style"));
        if !hidden {
            out.push(' ');
            out.push_str(text);
        }
    }

    Cow::Owned(out)
}

/// Collapses every run of whitespace into one ASCII space and trims both ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strips control characters that have no place in feed text.
///
/// Removes C0 controls other than tab, newline and carriage return, plus
/// DEL. An ESC introducing a CSI sequence (`\x1b[...m`) is dropped together
/// with the sequence, so colour codes smuggled into titles do not leave
/// `[31m` residue behind.
///
/// Returns `Cow::Borrowed` when there is nothing to strip.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    let is_control = |c: char| {
        c == '\u{7f}' || (c < '\u{20}' && !matches!(c, '\t' | '\n' | '\r'))
    };

    if !s.chars().any(is_control) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\u{1b}' && chars.peek() == Some(&'[') {
            chars.next();
            // Parameter bytes run until a final byte in 0x40..=0x7e
            for n in chars.by_ref() {
                if ('\u{40}'..='\u{7e}').contains(&n) {
                    break;
                }
            }
        } else if !is_control(c) {
            out.push(c);
        }
    }

    Cow::Owned(out)
}
