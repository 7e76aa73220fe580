//! Decides whether a link belongs to a group.
//!
//! All of this is pure. Nothing here can fail.

use crate::models::{
    group::{Group, MatchBlock},
    link::Link,
};

impl MatchBlock {
    /// Whether any of this block's values match the link.
    ///
    /// Names and URLs must equal the link's field exactly. Tags match when
    /// the link carries at least one of them. An empty block always matches.
    pub fn matches(&self, link: &Link) -> bool {
        if self.is_empty() {
            return true;
        }

        !self.tags.is_disjoint(&link.tags)
            || self.names.contains(&link.name)
            || self.urls.contains(&link.url)
    }
}

impl Group {
    /// Whether the link passes every include block.
    ///
    /// With no include blocks, everything passes.
    pub fn include_matches(&self, link: &Link) -> bool {
        self.include.iter().all(|block| block.matches(link))
    }

    /// Whether the link trips any exclude block.
    ///
    /// With no exclude blocks, nothing is excluded.
    pub fn exclude_matches(&self, link: &Link) -> bool {
        self.exclude.iter().any(|block| block.matches(link))
    }

    /// Whether the link belongs in this group.
    pub fn matches(&self, link: &Link) -> bool {
        self.include_matches(link) && !self.exclude_matches(link)
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use super::*;

    fn link(name: &str, url: &str, tags: &[&str]) -> Link {
        Link {
            name: name.into(),
            url: url.into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            created_at: DateTime::from_timestamp_nanos(1_700_000_000_000_000_000),
            updated_at: DateTime::from_timestamp_nanos(1_700_000_000_000_000_000),
        }
    }

    fn doc() -> Link {
        link("Doc", "https://docs.example.com", &["work", "ref"])
    }

    #[test]
    fn no_rules_matches_everything() {
        let group = Group::new("all");
        assert!(group.matches(&doc()));
        assert!(group.matches(&link("", "https://x.com", &[])));
    }

    #[test]
    fn lone_exclude_block_inverts_the_block() {
        let archive = MatchBlock::new().tag("archive");
        let group = Group::new("g").with_exclude(archive.clone());

        let plain = doc();
        let mut archived = doc();
        archived.tags.insert("archive".into());

        assert_eq!(group.matches(&plain), !archive.matches(&plain));
        assert_eq!(group.matches(&archived), !archive.matches(&archived));
        assert!(group.matches(&plain));
        assert!(!group.matches(&archived));
    }

    #[test]
    fn include_blocks_are_anded() {
        let hit = MatchBlock::new().tag("work");
        let miss = MatchBlock::new().tag("games");
        assert!(hit.matches(&doc()));
        assert!(!miss.matches(&doc()));

        let group = Group::new("g").with_include(hit).with_include(miss);
        assert!(!group.include_matches(&doc()));
        assert!(!group.matches(&doc()));
    }

    #[test]
    fn exclude_blocks_are_ored() {
        let group = Group::new("g")
            .with_exclude(MatchBlock::new().tag("games"))
            .with_exclude(MatchBlock::new().name("Doc"));
        assert!(group.exclude_matches(&doc()));
        assert!(!group.matches(&doc()));
    }

    #[test]
    fn values_within_a_block_are_ored() {
        let block = MatchBlock::new().tag("work").url("https://x.com");

        assert!(block.matches(&link("Other", "https://elsewhere.com", &["work"])));
        assert!(block.matches(&link("Other", "https://x.com", &[])));
        assert!(!block.matches(&link("Other", "https://elsewhere.com", &["play"])));
    }

    #[test]
    fn urls_and_names_match_exactly() {
        let by_url = MatchBlock::new().url("https://x.com/a");
        assert!(!by_url.matches(&link("a", "https://x.com/ab", &[])));
        assert!(!by_url.matches(&link("a", "https://x.com/", &[])));
        assert!(by_url.matches(&link("a", "https://x.com/a", &[])));

        let by_name = MatchBlock::new().name("Doc");
        assert!(!by_name.matches(&link("doc", "https://x.com", &[])));
        assert!(!by_name.matches(&link("Docs", "https://x.com", &[])));
    }

    #[test]
    fn tags_are_case_sensitive() {
        let block = MatchBlock::new().tag("Work");
        assert!(!block.matches(&doc()));
    }

    #[test]
    fn empty_blocks_always_match() {
        let empty = MatchBlock::new();
        assert!(empty.matches(&doc()));

        // an empty include block doesn't get in the way...
        let group = Group::new("g")
            .with_include(MatchBlock::new())
            .with_include(MatchBlock::new().tag("ref"));
        assert!(group.matches(&doc()));

        // ...but an empty exclude block shuts out everything
        let group = Group::new("g").with_exclude(MatchBlock::new());
        assert!(!group.matches(&doc()));
    }

    #[test]
    fn work_but_not_archive() {
        let group = Group::new("work")
            .with_include(MatchBlock::new().tag("work"))
            .with_exclude(MatchBlock::new().tag("archive"));

        let mut link = doc();
        assert!(group.matches(&link));

        link.tags.insert("archive".into());
        assert!(!group.matches(&link));
    }

    #[test]
    fn second_include_block_needs_its_url() {
        let group = Group::new("g")
            .with_include(MatchBlock::new().name("Doc"))
            .with_include(MatchBlock::new().url("https://other.com"));
        assert!(!group.matches(&doc()));
    }
}
