//! Note/Activity discrimination at the ingestion boundary.
//!
//! A document carrying an `object` field is an Activity envelope; anything
//! else with an `id` is treated as a Note. Downstream code matches on the
//! variant instead of probing fields.

use serde::Deserialize;
use serde_json::Value;

use crate::app::{Result, StrandError};
use crate::domain::{jsonld, Note};

#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Note(Note),
    Activity(Activity),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "jsonld::opt_link")]
    pub actor: Option<String>,
    #[serde(default, deserialize_with = "jsonld::opt_text")]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "jsonld::opt_link")]
    pub attributed_to: Option<String>,
    #[serde(default, deserialize_with = "jsonld::opt_text")]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "jsonld::lenient_bool")]
    pub sensitive: bool,
    #[serde(skip)]
    pub object: ActivityObject,
}

impl Activity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: None,
            actor: None,
            content: None,
            attributed_to: None,
            summary: None,
            sensitive: false,
            object: ActivityObject::Other,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum ActivityObject {
    Note(Box<Note>),
    Link(String),
    #[default]
    Other,
}

impl Record {
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut map) = value else {
            return Err(StrandError::MalformedRecord("record is not an object".into()));
        };

        if let Some(object) = map.remove("object") {
            let mut activity: Activity = serde_json::from_value(Value::Object(map))?;
            activity.object = ActivityObject::from_value(object);
            return Ok(Record::Activity(activity));
        }

        if !map.get("id").is_some_and(Value::is_string) {
            return Err(StrandError::MalformedRecord("record has no id".into()));
        }
        Ok(Record::Note(serde_json::from_value(Value::Object(map))?))
    }

    pub fn id(&self) -> &str {
        match self {
            Record::Note(note) => &note.id,
            Record::Activity(activity) => &activity.id,
        }
    }

    pub fn is_activity(&self) -> bool {
        matches!(self, Record::Activity(_))
    }

    /// The Note carried by this record, either directly or as an embedded object.
    pub fn into_note(self) -> Option<Note> {
        match self {
            Record::Note(note) => Some(note),
            Record::Activity(Activity {
                object: ActivityObject::Note(note),
                ..
            }) => Some(*note),
            Record::Activity(_) => None,
        }
    }

    /// The Note itself, or the one embedded in an activity.
    pub fn as_note(&self) -> Option<&Note> {
        match self {
            Record::Note(note) => Some(note),
            Record::Activity(_) => self.nested(),
        }
    }

    fn nested(&self) -> Option<&Note> {
        match self {
            Record::Activity(Activity {
                object: ActivityObject::Note(note),
                ..
            }) => Some(note),
            _ => None,
        }
    }

    pub fn content(&self) -> Option<&str> {
        match self {
            Record::Note(note) => note.content.as_deref(),
            Record::Activity(a) => a
                .content
                .as_deref()
                .or_else(|| self.nested().and_then(|n| n.content.as_deref())),
        }
    }

    pub fn attributed_to(&self) -> Option<&str> {
        match self {
            Record::Note(note) => note.attributed_to.as_deref(),
            Record::Activity(a) => a
                .attributed_to
                .as_deref()
                .or_else(|| self.nested().and_then(|n| n.attributed_to.as_deref())),
        }
    }

    pub fn summary(&self) -> Option<&str> {
        match self {
            Record::Note(note) => note.summary.as_deref(),
            Record::Activity(a) => a
                .summary
                .as_deref()
                .or_else(|| self.nested().and_then(|n| n.summary.as_deref())),
        }
    }

    pub fn sensitive(&self) -> bool {
        match self {
            Record::Note(note) => note.sensitive,
            Record::Activity(a) => a.sensitive || self.nested().is_some_and(|n| n.sensitive),
        }
    }
}

impl ActivityObject {
    fn from_value(value: Value) -> Self {
        match value {
            Value::Object(_) => match serde_json::from_value::<Note>(value) {
                Ok(note) if !note.id.is_empty() => ActivityObject::Note(Box::new(note)),
                _ => ActivityObject::Other,
            },
            other => jsonld::link_of(&other)
                .map(ActivityObject::Link)
                .unwrap_or_default(),
        }
    }
}
