//! Splits sanitized HTML into text, media and link segments.
//!
//! Only `img`, `video` and `a` elements are recognised; every other byte of
//! the input lands in a text segment unchanged, so concatenating text
//! segments of link- and media-free content gives back the input.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::resolver::{self, LinkReference};

static ELEMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?is)<img\b(?P<img>[^>]*)>|<video\b(?P<video>[^>]*)>(?P<sources>.*?</video\s*>)?|<a\b(?P<a>[^>]*)>(?P<label>.*?)</a\s*>",
    )
    .expect("valid element regex")
});
static ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("valid attribute regex")
});
static SOURCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<source\b([^>]*)>").expect("valid source regex"));
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag regex"));
static BREAK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>|</p\s*>").expect("valid break regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaReference {
    pub kind: MediaKind,
    /// Left exactly as published; resolving it is the media loader's job.
    pub src: String,
    pub alt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Media(MediaReference),
    Link {
        link: LinkReference,
        /// Anchor body, with its own media already substituted.
        label: NormalizedContent,
    },
}

/// Ordered segments of one note body, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedContent {
    pub segments: Vec<Segment>,
}

impl NormalizedContent {
    /// Concatenation of the text segments.
    pub fn text(&self) -> String {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn links(&self) -> impl Iterator<Item = &LinkReference> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Link { link, .. } => Some(link),
            _ => None,
        })
    }

    /// Media in document order, including media wrapped in links.
    pub fn media(&self) -> Box<dyn Iterator<Item = &MediaReference> + '_> {
        Box::new(self.segments.iter().flat_map(
            |s| -> Box<dyn Iterator<Item = &MediaReference> + '_> {
                match s {
                    Segment::Media(media) => Box::new(std::iter::once(media)),
                    Segment::Link { label, .. } => label.media(),
                    Segment::Text(_) => Box::new(std::iter::empty()),
                }
            },
        ))
    }

    /// Readable text with markup removed, for terminal output.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.push_plain(&mut out);
        out.trim().to_string()
    }

    fn push_plain(&self, out: &mut String) {
        for segment in &self.segments {
            match segment {
                Segment::Text(html) => out.push_str(&strip_markup(html)),
                Segment::Link { label, .. } => label.push_plain(out),
                Segment::Media(media) => {
                    let kind = match media.kind {
                        MediaKind::Image => "image",
                        MediaKind::Video => "video",
                    };
                    out.push_str(&format!("[{}: {}]", kind, media.src));
                }
            }
        }
    }
}

fn strip_markup(html: &str) -> String {
    let with_breaks = BREAK_RE.replace_all(html, "\n");
    let bare = TAG_RE.replace_all(&with_breaks, "");
    html_escape::decode_html_entities(&bare).into_owned()
}

/// Attribute value by name, entity-decoded.
pub fn attribute(attrs: &str, name: &str) -> Option<String> {
    ATTR_RE.captures_iter(attrs).find_map(|caps| {
        if !caps[1].eq_ignore_ascii_case(name) {
            return None;
        }
        let raw = caps.get(2).or_else(|| caps.get(3)).or_else(|| caps.get(4))?;
        Some(html_escape::decode_html_entities(raw.as_str()).into_owned())
    })
}

pub fn segment(html: &str) -> NormalizedContent {
    let mut segments = Vec::new();
    let mut last = 0;

    for caps in ELEMENT_RE.captures_iter(html) {
        let Some(whole) = caps.get(0) else { continue };

        let replacement = if let Some(attrs) = caps.name("img") {
            Some(Segment::Media(MediaReference {
                kind: MediaKind::Image,
                src: attribute(attrs.as_str(), "src").unwrap_or_default(),
                alt: attribute(attrs.as_str(), "alt"),
            }))
        } else if let Some(attrs) = caps.name("video") {
            let src = attribute(attrs.as_str(), "src").or_else(|| {
                let inner = caps.name("sources")?.as_str();
                SOURCE_RE
                    .captures_iter(inner)
                    .find_map(|source| attribute(&source[1], "src"))
            });
            Some(Segment::Media(MediaReference {
                kind: MediaKind::Video,
                src: src.unwrap_or_default(),
                alt: None,
            }))
        } else if let Some(attrs) = caps.name("a") {
            // Anchors without an href are left as text.
            attribute(attrs.as_str(), "href").map(|href| Segment::Link {
                link: resolver::rewrite(&href),
                label: segment(caps.name("label").map(|l| l.as_str()).unwrap_or("")),
            })
        } else {
            None
        };

        if let Some(replacement) = replacement {
            if whole.start() > last {
                segments.push(Segment::Text(html[last..whole.start()].to_string()));
            }
            segments.push(replacement);
            last = whole.end();
        }
    }

    if last < html.len() {
        segments.push(Segment::Text(html[last..].to_string()));
    }

    NormalizedContent { segments }
}
