use aho_corasick::{AhoCorasick, MatchKind};
use once_cell::sync::Lazy;

// Built once, shared by every writer
static XML_ESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .build(["&", "<", ">", "\"", "'", "\r"])
        .expect("Failed to build XML escaper")
});

// LeftmostLongest so `&amp;` wins over any shorter overlap
static XML_UNESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .match_kind(MatchKind::LeftmostLongest)
        .build(["&amp;", "&lt;", "&gt;", "&quot;", "&apos;"])
        .expect("Failed to build XML unescaper")
});

/// Escape XML special characters for use in text nodes and attribute values.
///
/// # Examples
///
/// ```
/// use officekit::common::xml::escape_xml;
/// assert_eq!(escape_xml("a & b"), "a &amp; b");
/// assert_eq!(escape_xml("${name}<br>"), "${name}&lt;br&gt;");
/// ```
#[inline]
pub fn escape_xml(s: &str) -> String {
    // A literal CR would be normalized away by the next XML reader
    XML_ESCAPER.replace_all(s, &["&amp;", "&lt;", "&gt;", "&quot;", "&apos;", "&#13;"])
}

/// Unescape the five predefined XML entities and numeric character references.
///
/// Unknown or malformed references are left unchanged.
///
/// # Examples
///
/// ```
/// use officekit::common::xml::unescape_xml;
/// assert_eq!(unescape_xml("&lt;a &amp; b&gt;"), "<a & b>");
/// assert_eq!(unescape_xml("&#36;{x}"), "${x}");
/// assert_eq!(unescape_xml("&#x41;&amp;lt;"), "A&lt;");
/// assert_eq!(unescape_xml("&invalid;"), "&invalid;");
/// ```
pub fn unescape_xml(s: &str) -> String {
    if memchr::memchr(b'&', s.as_bytes()).is_none() {
        return s.to_string();
    }
    if memchr::memmem::find(s.as_bytes(), b"&#").is_none() {
        return XML_UNESCAPER.replace_all(s, &["&", "<", ">", "\"", "'"]);
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match tail.find(';').and_then(|end| resolve_reference(&tail[1..end]).map(|c| (c, end))) {
            Some((resolved, end)) => {
                out.push(resolved);
                rest = &tail[end + 1..];
            },
            None => {
                out.push('&');
                rest = &tail[1..];
            },
        }
    }
    out.push_str(rest);
    out
}

fn resolve_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let digits = name.strip_prefix('#')?;
            let code = match digits.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        },
    }
}
