//! Turns flat rule tuples into nested blocks, and back again.

use std::collections::BTreeMap;

use crate::{
    error::RuleError,
    models::{
        group::{Group, MatchBlock},
        rule::{GroupRule, GroupRuleRow, MatchType, RuleType},
    },
};

/// Identifies which block a flat rule belongs to.
///
/// Ordering is by rule type, then numerically by index, so walking a
/// `BTreeMap` of these yields each list's blocks in storage order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockKey {
    pub rule_type: RuleType,
    pub block_index: u32,
}

impl From<&GroupRule> for BlockKey {
    fn from(rule: &GroupRule) -> Self {
        Self {
            rule_type: rule.rule_type,
            block_index: rule.block_index,
        }
    }
}

/// A group's include and exclude lists, without the group itself.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Blocks {
    pub include: Vec<MatchBlock>,
    pub exclude: Vec<MatchBlock>,
}

impl Blocks {
    pub fn into_group(self, name: impl Into<String>) -> Group {
        Group {
            name: name.into(),
            include: self.include,
            exclude: self.exclude,
        }
    }
}

/// Rebuilds nested blocks from flat rules.
///
/// Rules sharing a `(rule_type, block_index)` land in the same block.
/// Blocks come out sorted by index, and index gaps are skipped.
pub fn assemble<I>(rules: I) -> Blocks
where
    I: IntoIterator<Item = GroupRule>,
{
    let mut by_key: BTreeMap<BlockKey, MatchBlock> = BTreeMap::new();

    for rule in rules {
        by_key
            .entry(BlockKey::from(&rule))
            .or_default()
            .values_mut(rule.match_type)
            .insert(rule.match_value);
    }

    let mut blocks = Blocks::default();
    for (key, block) in by_key {
        match key.rule_type {
            RuleType::Include => blocks.include.push(block),
            RuleType::Exclude => blocks.exclude.push(block),
        }
    }

    blocks
}

/// Checks raw database rows, then assembles them.
///
/// Anything malformed fails the whole group rather than getting dropped.
#[tracing::instrument(skip(rows), fields(count = rows.len()))]
pub fn assemble_rows(rows: Vec<GroupRuleRow>, max_rules: usize) -> Result<Blocks, RuleError> {
    if rows.len() > max_rules {
        tracing::warn!("Refusing to assemble {} rules (max: {max_rules})", rows.len());
        return Err(RuleError::TooManyRules {
            count: rows.len(),
            max: max_rules,
        });
    }

    let rules = rows
        .into_iter()
        .map(GroupRule::try_from)
        .collect::<Result<Vec<_>, _>>()
        .inspect_err(|e| tracing::error!("Found a malformed group rule! err: {e}"))?;

    let blocks = assemble(rules);
    tracing::debug!(
        "Assembled {} include and {} exclude blocks.",
        blocks.include.len(),
        blocks.exclude.len()
    );
    Ok(blocks)
}

/// Flattens a group into rules for storage.
///
/// Blocks are numbered by their position. Blocks without any values have
/// nothing to store, so they don't survive a trip through the database.
pub fn flatten(group: &Group) -> Vec<GroupRule> {
    let mut rules = Vec::with_capacity(group.rule_count());

    for (rule_type, blocks) in [
        (RuleType::Include, &group.include),
        (RuleType::Exclude, &group.exclude),
    ] {
        for (index, block) in blocks.iter().enumerate() {
            let block_index = u32::try_from(index).unwrap_or(u32::MAX);

            for match_type in MatchType::ALL {
                rules.extend(
                    block
                        .values(match_type)
                        .iter()
                        .map(|value| GroupRule::new(rule_type, match_type, value, block_index)),
                );
            }
        }
    }

    rules
}
