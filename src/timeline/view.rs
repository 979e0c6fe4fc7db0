//! What the view layer asks for, and what it reads from the query string.

use url::form_urlencoded;

use crate::domain::Sort;

/// Options a page is opened with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewOptions {
    pub sort: Sort,
    /// `view=replies`: a single-post render also carries its thread.
    pub show_replies: bool,
}

impl ViewOptions {
    /// Parse `sort=...&view=...`, with or without a leading `?`.
    ///
    /// Unknown sort values fall back to latest.
    pub fn from_query(query: &str) -> Self {
        let mut options = Self::default();
        let query = query.strip_prefix('?').unwrap_or(query);

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "sort" => options.sort = value.parse().unwrap_or_default(),
                "view" => options.show_replies = value == "replies",
                _ => {}
            }
        }

        options
    }

    /// Query string written back to the location after a sort change.
    pub fn to_query(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("sort", self.sort.as_str());
        if self.show_replies {
            query.append_pair("view", "replies");
        }
        format!("?{}", query.finish())
    }
}

/// User intents reported back by the rendering adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewIntent {
    RequestMore,
    /// Expand or collapse the note with this id.
    ToggleDisclosure(String),
    ChangeSort(Sort),
}
