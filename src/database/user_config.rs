//! Per-user settings, kept as an opaque JSON blob.
//!
//! The store doesn't look inside. It just hands back what it was given.

use sea_query::{Expr, OnConflict, Query, SqliteQueryBuilder};
use sea_query_binder::SqlxBinder as _;
use sqlx::SqliteConnection;

use crate::{error::DatabaseError, models::UserId};

use super::{build_failed, LinkStore, UserConfig};

#[derive(Clone, Debug, sqlx::FromRow)]
struct ConfigRow {
    config: String,
}

impl LinkStore {
    /// The user's settings, or `null` if they've never saved any.
    #[tracing::instrument(skip(self))]
    pub async fn user_config(&self, user: UserId) -> Result<serde_json::Value, DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        read_user_config(&mut conn, user).await
    }

    /// Replaces the user's settings.
    #[tracing::instrument(skip(self, config))]
    pub async fn set_user_config(
        &self,
        user: UserId,
        config: &serde_json::Value,
    ) -> Result<(), DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        write_user_config(&mut conn, user, config).await
    }
}

pub(crate) async fn read_user_config(
    conn: &mut SqliteConnection,
    user: UserId,
) -> Result<serde_json::Value, DatabaseError> {
    let (select, values) = Query::select()
        .column(UserConfig::Config)
        .from(UserConfig::Table)
        .and_where(Expr::col(UserConfig::UserId).eq(user.to_string()))
        .build_sqlx(SqliteQueryBuilder);

    let Some(row) = sqlx::query_as_with::<_, ConfigRow, _>(&select, values)
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Ok(serde_json::Value::Null);
    };

    serde_json::from_str(&row.config)
        .inspect_err(|e| tracing::error!("Stored user config isn't JSON! err: {e}"))
        .map_err(|err| DatabaseError::CorruptJson {
            user: user.to_string(),
            err,
        })
}

pub(crate) async fn write_user_config(
    conn: &mut SqliteConnection,
    user: UserId,
    config: &serde_json::Value,
) -> Result<(), DatabaseError> {
    let (insert, values) = Query::insert()
        .into_table(UserConfig::Table)
        .columns([UserConfig::UserId, UserConfig::Config])
        .values([user.to_string().into(), config.to_string().into()])
        .map_err(build_failed)?
        .on_conflict(
            OnConflict::column(UserConfig::UserId)
                .update_column(UserConfig::Config)
                .to_owned(),
        )
        .build_sqlx(SqliteQueryBuilder);

    sqlx::query_with(&insert, values)
        .execute(&mut *conn)
        .await
        .inspect_err(|e| tracing::warn!("Failed to save user config! err: {e}"))?;

    Ok(())
}
