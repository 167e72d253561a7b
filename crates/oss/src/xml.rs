//! Minimal parser for OSS `ListBucketResult` responses
//!
//! The listing response is a small, flat XML document; this scans tag pairs
//! directly instead of pulling in an XML dependency. Only the fields the
//! listing loop consumes are extracted.

use jiff::Timestamp;

/// One `<Contents>` block of a listing page
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSummary {
    pub key: String,
    pub size: i64,
    pub last_modified: Option<Timestamp>,
}

/// One page of a marker-paginated listing
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    pub objects: Vec<ObjectSummary>,
    pub is_truncated: bool,
    pub next_marker: Option<String>,
}

/// Extract the text of the first `<tag>...</tag>` pair in `xml`
fn tag_value<'a>(xml: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = xml.find(&open)? + open.len();
    let end = xml[start..].find(&close)? + start;
    Some(&xml[start..end])
}

/// Iterate the inner text of every `<tag>...</tag>` pair in `xml`
fn tag_blocks<'a>(xml: &'a str, tag: &'a str) -> impl Iterator<Item = &'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let mut remaining = xml;
    std::iter::from_fn(move || {
        let start = remaining.find(&open)? + open.len();
        let end = remaining[start..].find(&close)? + start;
        let block = &remaining[start..end];
        remaining = &remaining[end + close.len()..];
        Some(block)
    })
}

/// Decode the predefined XML entities in element text. Keys with `&`, `<`
/// or quotes come back escaped; everything else passes through untouched.
fn unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        let (replacement, len) = if rest.starts_with("&amp;") {
            ("&", 5)
        } else if rest.starts_with("&lt;") {
            ("<", 4)
        } else if rest.starts_with("&gt;") {
            (">", 4)
        } else if rest.starts_with("&quot;") {
            ("\"", 6)
        } else if rest.starts_with("&apos;") {
            ("'", 6)
        } else {
            ("&", 1)
        };
        out.push_str(replacement);
        rest = &rest[len..];
    }
    out.push_str(rest);
    out
}

/// Parse one listing page.
///
/// Malformed blocks degrade instead of failing: a block without a key is
/// skipped, a bad size parses as zero, a bad timestamp is dropped.
pub fn parse_list_page(xml: &str) -> ListPage {
    let mut page = ListPage {
        is_truncated: tag_value(xml, "IsTruncated") == Some("true"),
        next_marker: tag_value(xml, "NextMarker")
            .filter(|m| !m.is_empty())
            .map(unescape),
        ..Default::default()
    };

    for block in tag_blocks(xml, "Contents") {
        let Some(key) = tag_value(block, "Key") else {
            continue;
        };
        page.objects.push(ObjectSummary {
            key: unescape(key),
            size: tag_value(block, "Size")
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
            last_modified: tag_value(block, "LastModified")
                .and_then(|s| s.parse::<Timestamp>().ok()),
        });
    }

    page
}
