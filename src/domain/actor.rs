use serde::{Deserialize, Serialize};

use crate::domain::jsonld;

/// Icon used when an actor publishes none.
pub const DEFAULT_ICON: &str = "./assets/profile.png";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "jsonld::opt_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "jsonld::opt_text")]
    pub preferred_username: Option<String>,
    /// Either a single image or an ordered list; both land here.
    #[serde(default, deserialize_with = "jsonld::one_or_many")]
    pub icon: Vec<Image>,
    #[serde(default, deserialize_with = "jsonld::opt_link", skip_serializing_if = "Option::is_none")]
    pub outbox: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    #[serde(default, deserialize_with = "jsonld::opt_link")]
    pub url: Option<String>,
}

impl Actor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: None,
            name: None,
            preferred_username: None,
            icon: Vec::new(),
            outbox: None,
        }
    }

    /// First icon by position, then the actor id, then the bundled fallback.
    pub fn icon_url(&self) -> &str {
        match self.icon.first() {
            Some(image) => image.url.as_deref().unwrap_or(&self.id),
            None => DEFAULT_ICON,
        }
    }

    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn handle(&self) -> Option<String> {
        self.preferred_username.as_ref().map(|u| format!("@{}", u))
    }
}

/// An entry of the follow list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowedActor {
    pub url: String,
}
