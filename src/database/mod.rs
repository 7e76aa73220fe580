//! Helps to connect to the database.
//!
//! Everything is kept in one SQLite file inside the data directory. Each
//! row is scoped to a [`UserId`](crate::models::UserId).

use core::str::FromStr as _;

use camino::Utf8Path;
use sea_query::Iden;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};

use crate::{
    config::{Config, Limits},
    error::DatabaseError,
};

pub mod groups;
pub mod links;
pub mod user_config;

pub const DB_FILE_NAME: &str = "tabinator.sqlite";

/// the links table
#[derive(Iden)]
pub enum Links {
    Table,
    Id,
    UserId,
    Name,
    Url,
    CreatedAt,
    UpdatedAt,
}

/// the tags table
#[derive(Iden)]
pub enum Tags {
    Table,
    Id,
    UserId,
    Name,
}

/// joins links to their tags
#[derive(Iden)]
pub enum LinkTags {
    Table,
    LinkId,
    TagId,
}

/// the groups table
#[derive(Iden)]
pub enum LinkGroups {
    Table,
    Id,
    UserId,
    Name,
}

/// flat rule tuples for each group
#[derive(Iden)]
pub enum GroupRules {
    Table,
    Id,
    GroupId,
    RuleType,
    MatchType,
    MatchValue,
    BlockIndex,
}

/// one opaque json blob per user
#[derive(Iden)]
pub enum UserConfig {
    Table,
    UserId,
    Config,
}

/// A handle to the link database.
///
/// It's cheap to clone, since the pool inside is shared.
#[derive(Clone, Debug)]
pub struct LinkStore {
    pool: Pool<Sqlite>,
    limits: Limits,
}

impl LinkStore {
    /// Opens (or creates) the database inside `db_folder`, then migrates it.
    #[tracing::instrument]
    pub async fn connect(db_folder: &Utf8Path, limits: Limits) -> Result<Self, DatabaseError> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite://{db_folder}/{DB_FILE_NAME}"))
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .inspect_err(|e| tracing::error!("Failed to connect to link database. err: {e}"))
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        // we'll also run migrations here real quick
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .inspect_err(|e| {
                tracing::error!(
                    "Database connection succeeded, but migrating the database failed! err: {e}"
                )
            })
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

        tracing::debug!("Link database is ready.");
        Ok(Self { pool, limits })
    }

    /// Connects using the global [`Config`].
    pub async fn from_config() -> Result<Self, DatabaseError> {
        let (data_dir, limits) = {
            let conf = Config::read().await?;
            (conf.data_dir.clone(), conf.limits)
        };

        Self::connect(&data_dir, limits).await
    }

    /// The limits this store checks input against.
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// The underlying connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Closes every connection in the pool.
    pub async fn close(&self) {
        self.pool.close().await
    }
}

/// `sea_query` only fails to build when a statement is malformed.
pub(crate) fn build_failed(e: sea_query::error::Error) -> DatabaseError {
    tracing::error!("Failed to build a statement! err: {e}");
    DatabaseError::StatementBuildFailed(e.to_string())
}
