//! Flat group rules, as they're kept in the `group_rules` table.

use core::{fmt, str::FromStr};

use crate::error::RuleError;

/// Whether a block requires a match or disqualifies on one.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RuleType {
    Include,
    Exclude,
}

impl RuleType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            RuleType::Include => "include",
            RuleType::Exclude => "exclude",
        }
    }
}

impl FromStr for RuleType {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "include" => Ok(Self::Include),
            "exclude" => Ok(Self::Exclude),
            other => Err(RuleError::UnknownRuleType(other.to_string())),
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which field of a link a match value is compared against.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Tags,
    Names,
    Urls,
}

impl MatchType {
    /// Every match type, in the order blocks are flattened.
    pub const ALL: [MatchType; 3] = [MatchType::Tags, MatchType::Names, MatchType::Urls];

    pub const fn as_str(&self) -> &'static str {
        match self {
            MatchType::Tags => "tags",
            MatchType::Names => "names",
            MatchType::Urls => "urls",
        }
    }
}

impl FromStr for MatchType {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tags" => Ok(Self::Tags),
            "names" => Ok(Self::Names),
            "urls" => Ok(Self::Urls),
            other => Err(RuleError::UnknownMatchType(other.to_string())),
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One flat rule tuple belonging to a group.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupRule {
    pub rule_type: RuleType,
    pub match_type: MatchType,
    pub match_value: String,
    /// The position of the owning block within its include/exclude list.
    pub block_index: u32,
}

impl GroupRule {
    pub fn new(
        rule_type: RuleType,
        match_type: MatchType,
        match_value: impl Into<String>,
        block_index: u32,
    ) -> Self {
        Self {
            rule_type,
            match_type,
            match_value: match_value.into(),
            block_index,
        }
    }
}

/// A rule exactly as it comes out of the database, before any checking.
#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct GroupRuleRow {
    pub rule_type: String,
    pub match_type: String,
    pub match_value: String,
    pub block_index: i64,
}

impl TryFrom<GroupRuleRow> for GroupRule {
    type Error = RuleError;

    fn try_from(row: GroupRuleRow) -> Result<Self, Self::Error> {
        let rule_type = row.rule_type.parse()?;
        let match_type = row.match_type.parse()?;
        let block_index = u32::try_from(row.block_index)
            .map_err(|_| RuleError::NegativeBlockIndex(row.block_index))?;

        // values are trimmed on the way in, so anything else is corruption
        if row.match_value.is_empty() || row.match_value.trim() != row.match_value {
            return Err(RuleError::BadMatchValue {
                block_index,
                value: row.match_value,
            });
        }

        Ok(Self {
            rule_type,
            match_type,
            match_value: row.match_value,
            block_index,
        })
    }
}
