use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

/// A saved link.
///
/// Links are unique per user by their `url`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    /// A user-facing title for the link.
    pub name: String,

    /// The link's URL. This is its identity within a user's collection.
    pub url: String,

    /// Case-sensitive tag names.
    #[serde(default)]
    pub tags: BTreeSet<String>,

    /// When the link was first saved.
    pub created_at: DateTime<Utc>,

    /// When the link was last saved.
    pub updated_at: DateTime<Utc>,
}

impl Link {
    /// Whether this link carries the given tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// A link as the user hands it over, before it's been stored.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Deserialize)]
pub struct NewLink {
    #[serde(default)]
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewLink {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            tags: Vec::new(),
        }
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

impl From<Link> for NewLink {
    fn from(link: Link) -> Self {
        Self {
            name: link.name,
            url: link.url,
            tags: link.tags.into_iter().collect(),
        }
    }
}
