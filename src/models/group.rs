//! Groups and the match blocks that decide what's in them.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer};

use super::rule::MatchType;

/// Three independent sets of values to match a link against.
///
/// A block "passes" for a link when ANY of its values match. A block with
/// no values at all always passes.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MatchBlock {
    #[serde(default, deserialize_with = "nullable_set")]
    pub tags: BTreeSet<String>,
    #[serde(default, deserialize_with = "nullable_set")]
    pub names: BTreeSet<String>,
    #[serde(default, deserialize_with = "nullable_set")]
    pub urls: BTreeSet<String>,
}

impl MatchBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tag to match on.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Adds an exact link name to match on.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.names.insert(name.into());
        self
    }

    /// Adds an exact URL to match on.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.urls.insert(url.into());
        self
    }

    /// The set of values compared against the given link field.
    pub fn values(&self, match_type: MatchType) -> &BTreeSet<String> {
        match match_type {
            MatchType::Tags => &self.tags,
            MatchType::Names => &self.names,
            MatchType::Urls => &self.urls,
        }
    }

    pub fn values_mut(&mut self, match_type: MatchType) -> &mut BTreeSet<String> {
        match match_type {
            MatchType::Tags => &mut self.tags,
            MatchType::Names => &mut self.names,
            MatchType::Urls => &mut self.urls,
        }
    }

    /// Whether this block has no values at all.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.names.is_empty() && self.urls.is_empty()
    }

    /// Total number of values across all three sets.
    pub fn len(&self) -> usize {
        self.tags.len() + self.names.len() + self.urls.len()
    }
}

/// A named, rule-based view over a user's links.
///
/// Every `include` block must pass, and no `exclude` block may pass.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Group {
    pub name: String,
    #[serde(default)]
    pub include: Vec<MatchBlock>,
    #[serde(default)]
    pub exclude: Vec<MatchBlock>,
}

impl Group {
    /// Creates a group with no rules. It'll match everything.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }

    pub fn with_include(mut self, block: MatchBlock) -> Self {
        self.include.push(block);
        self
    }

    pub fn with_exclude(mut self, block: MatchBlock) -> Self {
        self.exclude.push(block);
        self
    }

    /// How many flat rules this group turns into when stored.
    pub fn rule_count(&self) -> usize {
        self.include
            .iter()
            .chain(self.exclude.iter())
            .map(MatchBlock::len)
            .sum()
    }
}

/// Clients sometimes send `null` instead of an empty list.
fn nullable_set<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<BTreeSet<String>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_always_emit_all_three_fields() {
        let json = serde_json::to_value(MatchBlock::new().tag("work")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "tags": ["work"], "names": [], "urls": [] })
        );
    }

    #[test]
    fn missing_and_null_sets_become_empty() {
        let block: MatchBlock =
            serde_json::from_str(r#"{ "tags": null, "urls": ["https://x.com"] }"#).unwrap();
        assert!(block.tags.is_empty());
        assert!(block.names.is_empty());
        assert_eq!(block.urls.len(), 1);
    }

    #[test]
    fn rule_count_spans_both_lists() {
        let group = Group::new("g")
            .with_include(MatchBlock::new().tag("a").tag("b"))
            .with_exclude(MatchBlock::new().name("c").url("d"));
        assert_eq!(group.rule_count(), 4);
    }
}
