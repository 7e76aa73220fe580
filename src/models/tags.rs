/// A user's tag.
///
/// Tags exist as long as something created them. Removing the last link
/// using a tag leaves the tag in place.
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize, sqlx::FromRow,
)]
pub struct Tag {
    /// The tag's name, unique for its user. Compared case-sensitively.
    pub name: String,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
