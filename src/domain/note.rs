use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::jsonld;

/// A single post, as stored locally after ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "jsonld::opt_text")]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "jsonld::opt_link")]
    pub attributed_to: Option<String>,
    #[serde(default, deserialize_with = "jsonld::opt_datetime")]
    pub published: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "jsonld::opt_text", skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "jsonld::lenient_bool")]
    pub sensitive: bool,
    #[serde(default, deserialize_with = "jsonld::opt_link", skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<String>,
    #[serde(default, deserialize_with = "jsonld::one_or_many")]
    pub attachment: Vec<Attachment>,
    #[serde(default, deserialize_with = "jsonld::opt_link", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Note {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: Some("Note".into()),
            content: None,
            attributed_to: None,
            published: None,
            summary: None,
            sensitive: false,
            in_reply_to: None,
            attachment: Vec::new(),
            url: None,
        }
    }

    pub fn is_reply(&self) -> bool {
        self.in_reply_to.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default, deserialize_with = "jsonld::opt_link")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "jsonld::opt_text")]
    pub name: Option<String>,
}
