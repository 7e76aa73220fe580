//! Types that are really the bedrock of the app.

use core::fmt;

use uuid::Uuid;

pub mod group;
pub mod link;
pub mod rule;
pub mod tags;

/// Whoever owns a set of links, tags, and groups.
///
/// Accounts live elsewhere. Here, a user is just a key that scopes data.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}
