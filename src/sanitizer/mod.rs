//! Removal of executable markup from untrusted post content.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Strips unsafe markup while keeping structural and text content.
pub trait Sanitizer: Send + Sync {
    fn sanitize(&self, html: &str) -> String;
}

/// Elements dropped together with everything inside them.
const BLOCKED_ELEMENTS: &[&str] = &[
    "script", "style", "iframe", "object", "embed", "form", "noscript", "template",
];

static BLOCKED_BLOCK_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    BLOCKED_ELEMENTS
        .iter()
        .map(|tag| {
            Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>")).expect("valid block regex")
        })
        .collect()
});
static BLOCKED_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)</?(?:{})\b[^>]*>", BLOCKED_ELEMENTS.join("|")))
        .expect("valid tag regex")
});
static COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex"));
static OPEN_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[A-Za-z][A-Za-z0-9-]*(?:\s[^>]*)?/?>").expect("valid open tag regex"));
static ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\s+([A-Za-z_:][-A-Za-z0-9_:.]*)(?:\s*=\s*("[^"]*"|'[^']*'|[^\s"'>]+))?"#)
        .expect("valid attribute regex")
});

/// Conservative default sanitizer.
///
/// Drops script-bearing elements and comments, event handler attributes and
/// script URLs. Everything else passes through byte for byte.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicSanitizer;

impl BasicSanitizer {
    pub fn new() -> Self {
        Self
    }

    fn clean_tag(tag: &str) -> String {
        ATTR_RE
            .replace_all(tag, |caps: &Captures| {
                let name = caps[1].to_ascii_lowercase();
                let value = caps
                    .get(2)
                    .map(|v| v.as_str().trim_matches(|c| c == '"' || c == '\''))
                    .unwrap_or("");

                if name.starts_with("on") || (is_url_attr(&name) && is_script_url(value)) {
                    String::new()
                } else {
                    caps[0].to_string()
                }
            })
            .into_owned()
    }
}

fn is_url_attr(name: &str) -> bool {
    matches!(name, "href" | "src" | "action" | "formaction" | "xlink:href" | "poster")
}

fn is_script_url(value: &str) -> bool {
    let compact: String = html_escape::decode_html_entities(value)
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    compact.starts_with("javascript:")
        || compact.starts_with("vbscript:")
        || compact.starts_with("data:text/html")
}

impl Sanitizer for BasicSanitizer {
    fn sanitize(&self, html: &str) -> String {
        let mut out = COMMENT_RE.replace_all(html, "").into_owned();
        for re in BLOCKED_BLOCK_RES.iter() {
            out = re.replace_all(&out, "").into_owned();
        }
        out = BLOCKED_TAG_RE.replace_all(&out, "").into_owned();
        OPEN_TAG_RE
            .replace_all(&out, |caps: &Captures| Self::clean_tag(&caps[0]))
            .into_owned()
    }
}
