//! Turns a stored note into a render-agnostic structure.
//!
//! ```text
//! content → Sanitizer → segments (text / media / rewritten links)
//!         + disclosure gating + attachment gallery
//! ```

pub mod disclosure;
pub mod markup;

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::app::{Result, StrandError};
use crate::domain::{Attachment, Note, Record};
use crate::sanitizer::{BasicSanitizer, Sanitizer};

pub use disclosure::{DisclosureMode, DisclosureState};
pub use markup::{MediaKind, MediaReference, NormalizedContent, Segment};

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedNote {
    pub id: String,
    pub attributed_to: Option<String>,
    pub published: Option<DateTime<Utc>>,
    pub in_reply_to: Option<String>,
    pub content: NormalizedContent,
    pub disclosure: DisclosureState,
    /// Attachments shown below ungated notes.
    pub gallery: Vec<MediaReference>,
}

#[derive(Clone)]
pub struct ContentNormalizer {
    sanitizer: Arc<dyn Sanitizer>,
}

impl Default for ContentNormalizer {
    fn default() -> Self {
        Self::new(Arc::new(BasicSanitizer::new()))
    }
}

impl ContentNormalizer {
    pub fn new(sanitizer: Arc<dyn Sanitizer>) -> Self {
        Self { sanitizer }
    }

    /// Entry point for rendering a single post by URL.
    ///
    /// Activities are refused here rather than unwrapped.
    pub fn normalize(&self, record: &Record) -> Result<NormalizedNote> {
        match record {
            Record::Note(note) => self.normalize_note(note),
            Record::Activity(_) => Err(StrandError::Discrimination),
        }
    }

    /// Content already known to be a Note, such as timeline entries.
    pub fn normalize_note(&self, note: &Note) -> Result<NormalizedNote> {
        let content = note
            .content
            .as_deref()
            .ok_or_else(|| StrandError::MalformedRecord(format!("{} has no content", note.id)))?;

        Ok(self.build(
            note,
            content,
            note.attributed_to.as_deref(),
            note.sensitive,
            note.summary.as_deref(),
        ))
    }

    /// Normalizes whatever Note a record carries, reading each field from
    /// the envelope first and the embedded object second.
    pub fn normalize_embedded(&self, record: &Record) -> Result<NormalizedNote> {
        let note = record.as_note().ok_or_else(|| {
            StrandError::MalformedRecord(format!("{} carries no note", record.id()))
        })?;
        let content = record
            .content()
            .ok_or_else(|| StrandError::MalformedRecord(format!("{} has no content", record.id())))?;

        Ok(self.build(
            note,
            content,
            record.attributed_to(),
            record.sensitive(),
            record.summary(),
        ))
    }

    fn build(
        &self,
        note: &Note,
        content: &str,
        attributed_to: Option<&str>,
        sensitive: bool,
        summary: Option<&str>,
    ) -> NormalizedNote {
        let sanitized = self.sanitizer.sanitize(content);
        let disclosure = DisclosureState::for_note(sensitive, summary);

        let gallery = if disclosure.is_gated() {
            Vec::new()
        } else {
            gallery(&note.attachment)
        };

        NormalizedNote {
            id: note.id.clone(),
            attributed_to: attributed_to.map(String::from),
            published: note.published,
            in_reply_to: note.in_reply_to.clone(),
            content: markup::segment(&sanitized),
            disclosure,
            gallery,
        }
    }
}

/// Attachments by declared media type; anything not image or video is dropped.
pub fn gallery(attachments: &[Attachment]) -> Vec<MediaReference> {
    attachments
        .iter()
        .filter_map(|attachment| {
            let media_type = attachment.media_type.as_deref()?;
            let (kind, default_alt) = if media_type.starts_with("image/") {
                (MediaKind::Image, "Attached image")
            } else if media_type.starts_with("video/") {
                (MediaKind::Video, "Attached video")
            } else {
                return None;
            };

            Some(MediaReference {
                kind,
                src: attachment.url.clone()?,
                alt: Some(attachment.name.clone().unwrap_or_else(|| default_alt.to_string())),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Activity, ActivityObject};
    use crate::resolver::LinkKind;

    fn note(content: &str) -> Note {
        let mut note = Note::new("https://a.example/n/1");
        note.content = Some(content.into());
        note.attributed_to = Some("https://a.example/@alice".into());
        note
    }

    fn attachment(media_type: &str, url: &str) -> Attachment {
        Attachment {
            media_type: Some(media_type.into()),
            url: Some(url.into()),
            name: None,
        }
    }

    fn activity(object: Note) -> Record {
        Record::Activity(Activity {
            id: "https://a.example/act/1".into(),
            kind: Some("Create".into()),
            actor: Some("https://a.example/@alice".into()),
            content: None,
            attributed_to: None,
            summary: None,
            sensitive: false,
            object: ActivityObject::Note(Box::new(object)),
        })
    }

    #[test]
    fn test_plain_text_roundtrip() {
        let text = "Just some words about Rust, nothing more.";
        let normalizer = ContentNormalizer::default();
        let normalized = normalizer.normalize(&Record::Note(note(text))).unwrap();

        assert_eq!(normalized.content.text(), BasicSanitizer::new().sanitize(text));
        assert_eq!(normalized.content.text(), text);
        assert_eq!(normalized.disclosure.mode, DisclosureMode::None);
    }

    #[test]
    fn test_activity_rejected_at_single_post_entry() {
        let normalizer = ContentNormalizer::default();
        let err = normalizer.normalize(&activity(note("<p>hi</p>"))).unwrap_err();
        assert!(matches!(err, StrandError::Discrimination));
    }

    #[test]
    fn test_embedded_activity_uses_fallback_fields() {
        let mut inner = note("<p>hi</p>");
        inner.sensitive = true;
        let normalizer = ContentNormalizer::default();

        let normalized = normalizer.normalize_embedded(&activity(inner)).unwrap();
        assert_eq!(normalized.id, "https://a.example/n/1");
        assert_eq!(normalized.disclosure.mode, DisclosureMode::Sensitive);
        assert_eq!(normalized.content.text(), "<p>hi</p>");
    }

    #[test]
    fn test_missing_content_is_malformed() {
        let normalizer = ContentNormalizer::default();
        let err = normalizer
            .normalize_note(&Note::new("https://a.example/n/2"))
            .unwrap_err();
        assert!(matches!(err, StrandError::MalformedRecord(_)));
    }

    #[test]
    fn test_sanitized_before_segmenting() {
        let normalizer = ContentNormalizer::default();
        let normalized = normalizer
            .normalize_note(&note(r#"<p>ok</p><script>bad()</script><img src="a.png" onerror="x()">"#))
            .unwrap();

        assert_eq!(normalized.content.text(), "<p>ok</p>");
        let media: Vec<_> = normalized.content.media().collect();
        assert_eq!(media.len(), 1);
        assert_eq!(media[0].src, "a.png");
    }

    #[test]
    fn test_links_rewritten() {
        let normalizer = ContentNormalizer::default();
        let normalized = normalizer
            .normalize_note(&note(r#"cc <a href="https://instance.example/@bob">@bob</a>"#))
            .unwrap();

        let link = normalized.content.links().next().unwrap();
        assert_eq!(link.kind, LinkKind::Actor);
        assert_eq!(
            link.rewritten_href,
            "/profile.html?actor=https%3A%2F%2Finstance.example%2F%40bob"
        );
    }

    #[test]
    fn test_sensitive_wins_over_summary() {
        let mut n = note("<p>x</p>");
        n.sensitive = true;
        n.summary = Some("spoiler".into());
        n.attachment = vec![attachment("image/png", "https://a.example/a.png")];

        let normalized = ContentNormalizer::default().normalize_note(&n).unwrap();
        assert_eq!(normalized.disclosure.mode, DisclosureMode::Sensitive);
        assert!(normalized.gallery.is_empty());
    }

    #[test]
    fn test_summary_hides_gallery() {
        let mut n = note("<p>x</p>");
        n.summary = Some("A title".into());
        n.attachment = vec![attachment("image/png", "https://a.example/a.png")];

        let normalized = ContentNormalizer::default().normalize_note(&n).unwrap();
        assert_eq!(normalized.disclosure.mode, DisclosureMode::Summary);
        assert_eq!(normalized.disclosure.label, "A title");
        assert!(normalized.gallery.is_empty());
    }

    #[test]
    fn test_gallery_classification() {
        let mut n = note("<p>x</p>");
        n.attachment = vec![
            attachment("image/jpeg", "https://a.example/a.jpg"),
            attachment("audio/ogg", "https://a.example/a.ogg"),
            attachment("video/mp4", "https://a.example/a.mp4"),
            Attachment {
                media_type: None,
                url: Some("https://a.example/unknown".into()),
                name: None,
            },
        ];
        n.attachment[0].name = Some("A cat".into());

        let normalized = ContentNormalizer::default().normalize_note(&n).unwrap();
        assert_eq!(
            normalized.gallery,
            vec![
                MediaReference {
                    kind: MediaKind::Image,
                    src: "https://a.example/a.jpg".into(),
                    alt: Some("A cat".into()),
                },
                MediaReference {
                    kind: MediaKind::Video,
                    src: "https://a.example/a.mp4".into(),
                    alt: Some("Attached video".into()),
                },
            ]
        );
    }
}
