//! Cleans up user input before it's stored.

use std::collections::BTreeSet;

use crate::{
    config::Limits,
    error::{RuleError, ValidationError},
    models::{
        group::{Group, MatchBlock},
        link::NewLink,
        rule::MatchType,
    },
};

impl NewLink {
    /// Trims everything and checks the link against `limits`.
    ///
    /// Blank tags are dropped, and a blank name falls back to the URL.
    pub fn normalized(self, limits: &Limits) -> Result<Self, ValidationError> {
        let url = self.url.trim().to_string();
        if url.is_empty() {
            return Err(ValidationError::EmptyUrl);
        }

        let name = match self.name.trim() {
            "" => url.clone(),
            name => name.to_string(),
        };
        check_name(&name, limits)?;

        let tags: BTreeSet<String> = self
            .tags
            .iter()
            .map(|tag| tag.trim())
            .filter(|tag| !tag.is_empty())
            .map(String::from)
            .collect();

        if tags.len() > limits.max_tags_per_link {
            return Err(ValidationError::TooManyTags {
                url,
                count: tags.len(),
                max: limits.max_tags_per_link,
            });
        }

        if let Some(tag) = tags
            .iter()
            .find(|tag| tag.chars().count() > limits.max_tag_length)
        {
            return Err(ValidationError::TagTooLong {
                tag: tag.clone(),
                max: limits.max_tag_length,
            });
        }

        Ok(Self {
            name,
            url,
            tags: tags.into_iter().collect(),
        })
    }
}

impl Group {
    /// Trims every match value and checks the group against `limits`.
    ///
    /// Blank values are dropped. Include blocks left without any values are
    /// dropped too, since they'd pass every link anyway. An exclude block
    /// left empty would hide every link, so it's refused instead.
    pub fn normalized(self, limits: &Limits) -> Result<Self, ValidationError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::EmptyGroupName);
        }
        check_name(&name, limits)?;

        let include = self
            .include
            .into_iter()
            .map(clean_block)
            .filter(|block| {
                if block.is_empty() {
                    tracing::debug!("Dropping an include block with no values.");
                }
                !block.is_empty()
            })
            .collect();

        let exclude = self
            .exclude
            .into_iter()
            .map(clean_block)
            .collect::<Vec<_>>();
        if exclude.iter().any(MatchBlock::is_empty) {
            return Err(ValidationError::EmptyExcludeBlock { group: name });
        }

        let group = Self {
            name,
            include,
            exclude,
        };

        let count = group.rule_count();
        if count > limits.max_rules_per_group {
            return Err(ValidationError::BadGroupRules(
                group.name,
                RuleError::TooManyRules {
                    count,
                    max: limits.max_rules_per_group,
                },
            ));
        }

        Ok(group)
    }
}

/// Trims the block's values, dropping the blank ones.
fn clean_block(block: MatchBlock) -> MatchBlock {
    let mut cleaned = MatchBlock::new();
    for match_type in MatchType::ALL {
        cleaned.values_mut(match_type).extend(
            block
                .values(match_type)
                .iter()
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .map(String::from),
        );
    }
    cleaned
}

pub(crate) fn check_name(name: &str, limits: &Limits) -> Result<(), ValidationError> {
    if name.chars().count() > limits.max_name_length {
        return Err(ValidationError::NameTooLong {
            name: name.to_string(),
            max: limits.max_name_length,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_are_trimmed_and_deduplicated() {
        let link = NewLink::new("  Doc ", " https://docs.example.com ")
            .tag(" work")
            .tag("work ")
            .tag("   ")
            .tag("ref")
            .normalized(&Limits::default())
            .unwrap();

        assert_eq!(link.name, "Doc");
        assert_eq!(link.url, "https://docs.example.com");
        assert_eq!(link.tags, ["ref", "work"]);
    }

    #[test]
    fn blank_name_falls_back_to_url() {
        let link = NewLink::new(" ", "https://x.com")
            .normalized(&Limits::default())
            .unwrap();
        assert_eq!(link.name, "https://x.com");
    }

    #[test]
    fn blank_url_is_refused() {
        assert_eq!(
            NewLink::new("Doc", "  ").normalized(&Limits::default()),
            Err(ValidationError::EmptyUrl)
        );
    }

    #[test]
    fn tag_limits_hold() {
        let limits = Limits {
            max_tags_per_link: 2,
            max_tag_length: 4,
            ..Limits::default()
        };

        let too_many = NewLink::new("a", "b").tag("1").tag("2").tag("3");
        assert!(matches!(
            too_many.normalized(&limits),
            Err(ValidationError::TooManyTags { count: 3, max: 2, .. })
        ));

        let too_long = NewLink::new("a", "b").tag("toolong");
        assert!(matches!(
            too_long.normalized(&limits),
            Err(ValidationError::TagTooLong { max: 4, .. })
        ));

        // length is in characters, not bytes
        let wide = NewLink::new("a", "b").tag("ñañá");
        assert!(wide.normalized(&limits).is_ok());
    }

    #[test]
    fn groups_lose_blank_values_and_empty_blocks() {
        let group = Group::new(" reading ")
            .with_include(MatchBlock::new().tag(" work ").tag(""))
            .with_include(MatchBlock::new().name("   "))
            .with_exclude(MatchBlock::new().url(" https://x.com"))
            .normalized(&Limits::default())
            .unwrap();

        assert_eq!(
            group,
            Group::new("reading")
                .with_include(MatchBlock::new().tag("work"))
                .with_exclude(MatchBlock::new().url("https://x.com"))
        );
    }

    #[test]
    fn empty_exclude_blocks_are_refused() {
        // blank values only count once they're trimmed away
        for block in [MatchBlock::new(), MatchBlock::new().tag("  ").url("")] {
            assert_eq!(
                Group::new(" hidden ")
                    .with_exclude(block)
                    .normalized(&Limits::default()),
                Err(ValidationError::EmptyExcludeBlock {
                    group: "hidden".into()
                })
            );
        }
    }

    #[test]
    fn unnamed_groups_are_refused() {
        assert_eq!(
            Group::new("  ").normalized(&Limits::default()),
            Err(ValidationError::EmptyGroupName)
        );
    }

    #[test]
    fn rule_cap_holds() {
        let limits = Limits {
            max_rules_per_group: 2,
            ..Limits::default()
        };

        let group = Group::new("g").with_include(MatchBlock::new().tag("a").tag("b").tag("c"));
        assert_eq!(
            group.normalized(&limits),
            Err(ValidationError::BadGroupRules(
                "g".into(),
                RuleError::TooManyRules { count: 3, max: 2 }
            ))
        );
    }
}
