use core::error::Error;
use pisserror::Error;

use crate::config::CONFIG;

const DEFAULT_REPO: &str = "https://github.com/tabinator/tabinator";

/// Stick this at the end of bug warnings/errors.
///
/// It helps users find out where to report bugs when looking at logs.
pub async fn bug_msg() -> String {
    let repo = match CONFIG.get() {
        Some(conf) => conf.read().await.bug_report_info.repo.clone(),
        None => DEFAULT_REPO.to_string(),
    };

    format!("this is a bug, so please report it! you can do so by heading to this git repo: {repo}")
}

/// A stored or incoming group rule was malformed.
///
/// The store only ever writes the known rule and match types, so any of
/// these coming out of the database means the data was tampered with.
#[derive(Debug, Error, PartialEq)]
pub enum RuleError {
    #[error("Unknown rule type `{_0}`. Expected `include` or `exclude`.")]
    UnknownRuleType(String),

    #[error("Unknown match type `{_0}`. Expected `tags`, `names`, or `urls`.")]
    UnknownMatchType(String),

    #[error("Block index `{_0}` is negative.")]
    NegativeBlockIndex(i64),

    #[error("A rule in block `{block_index}` had an empty or untrimmed match value: `{value}`")]
    BadMatchValue { block_index: u32, value: String },

    #[error("A group had `{count}` rules, but at most `{max}` are allowed.")]
    TooManyRules { count: usize, max: usize },
}

/// User input that can't be stored.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("A link must have a non-empty URL.")]
    EmptyUrl,

    #[error("A group must have a non-empty name.")]
    EmptyGroupName,

    #[error("The link at `{url}` has `{count}` tags, but at most `{max}` are allowed.")]
    TooManyTags { url: String, count: usize, max: usize },

    #[error("The tag `{tag}` is longer than `{max}` characters.")]
    TagTooLong { tag: String, max: usize },

    #[error("The name `{name}` is longer than `{max}` characters.")]
    NameTooLong { name: String, max: usize },

    #[error("The group `{_0}` has an invalid rule. See: `{_1}`")]
    BadGroupRules(String, RuleError),

    /// An empty exclude block would hide every link, and it can't be stored.
    #[error("The group `{group}` has an exclude block without any values.")]
    EmptyExcludeBlock { group: String },
}

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Failed to connect to the database. See: {_0}")]
    ConnectionError(String),

    #[error("Database connection succeeded, but migrating it failed. See: {_0}")]
    MigrationFailed(String),

    #[error("Failed to complete database query. See: {_0}")]
    QueryFailed(#[from] sqlx::Error),

    #[error("Couldn't find where the database lives. See: {_0}")]
    ConfigUnavailable(#[from] ConfigError),

    #[error("Failed to build a database statement. See: {_0}")]
    StatementBuildFailed(String),

    #[error("The database holds corrupt group rules. See: {_0}")]
    CorruptRules(#[from] RuleError),

    #[error("Refused to store invalid input. See: {_0}")]
    Invalid(#[from] ValidationError),

    #[error("The database holds corrupt JSON for user `{user}`. See: {err}")]
    CorruptJson { user: String, err: serde_json::Error },

    #[error("No group named `{name}` exists.")]
    GroupNotFound { name: String },

    #[error("A group named `{name}` already exists.")]
    GroupNameTaken { name: String },

    #[error("Saved the link at `{url}`, but its tags couldn't be found to attach.")]
    TagsNotLinked { url: String },
}

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("Failed to read or write bundle JSON. See: `{_0}`")]
    Json(#[from] serde_json::Error),

    #[error("The database failed while moving bundle contents. See: `{_0}`")]
    Database(#[from] DatabaseError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    /// during fs read from disk
    #[error("Failed to read config file. See: `{_0}`")]
    ReadFailed(#[from] tokio::io::Error),

    /// parsing
    #[error("Failed to parse config file. See: `{_0}`")]
    ParseFailed(#[from] toml::de::Error),

    /// when we read from disk, the paths should be equal
    #[error("The config file had a data directory that didn't match the given one.")]
    PathMismatch,

    #[error("The config was used before being initialized.")]
    Uninitialized,
}
