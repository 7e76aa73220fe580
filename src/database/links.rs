//! Links and their tags.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use sea_query::{Expr, OnConflict, Order, Query, SqliteQueryBuilder};
use sea_query_binder::SqlxBinder as _;
use sqlx::SqliteConnection;

use crate::{
    error::{bug_msg, DatabaseError},
    models::{
        link::{Link, NewLink},
        tags::Tag,
        UserId,
    },
};

use super::{build_failed, LinkStore, LinkTags, Links, Tags};

#[derive(Clone, Debug, sqlx::FromRow)]
struct LinkRow {
    id: i64,
    name: String,
    url: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl LinkRow {
    fn into_link(self, tags: BTreeSet<String>) -> Link {
        Link {
            name: self.name,
            url: self.url,
            tags,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Clone, Debug, sqlx::FromRow)]
struct LinkTagRow {
    link_id: i64,
    name: String,
}

#[derive(Clone, Debug, sqlx::FromRow)]
struct IdRow {
    id: i64,
}

impl LinkStore {
    /// Saves a link, or updates the one with the same URL.
    ///
    /// The link's tags are replaced wholesale. Any tags the user doesn't have
    /// yet are created.
    #[tracing::instrument(skip(self))]
    pub async fn upsert_link(&self, user: UserId, link: NewLink) -> Result<Link, DatabaseError> {
        let link = link.normalized(&self.limits)?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;
        let link = write_link(
            &mut tx,
            user,
            Link {
                name: link.name,
                url: link.url,
                tags: link.tags.into_iter().collect(),
                created_at: now,
                updated_at: now,
            },
            CreatedAt::Keep,
        )
        .await?;
        tx.commit().await?;

        tracing::debug!("Saved link `{}` with {} tags.", link.url, link.tags.len());
        Ok(link)
    }

    /// Grabs one link by its URL.
    #[tracing::instrument(skip(self))]
    pub async fn get_link(&self, user: UserId, url: &str) -> Result<Option<Link>, DatabaseError> {
        let mut conn = self.pool.acquire().await?;

        let (select, values) = Query::select()
            .columns([
                Links::Id,
                Links::Name,
                Links::Url,
                Links::CreatedAt,
                Links::UpdatedAt,
            ])
            .from(Links::Table)
            .and_where(Expr::col(Links::UserId).eq(user.to_string()))
            .and_where(Expr::col(Links::Url).eq(url.trim()))
            .build_sqlx(SqliteQueryBuilder);

        let Some(row) = sqlx::query_as_with::<_, LinkRow, _>(&select, values)
            .fetch_optional(&mut *conn)
            .await?
        else {
            return Ok(None);
        };

        let (select, values) = tag_names_query(user)
            .and_where(Expr::col((LinkTags::Table, LinkTags::LinkId)).eq(row.id))
            .build_sqlx(SqliteQueryBuilder);

        let tags = sqlx::query_as_with::<_, LinkTagRow, _>(&select, values)
            .fetch_all(&mut *conn)
            .await?
            .into_iter()
            .map(|r| r.name)
            .collect();

        Ok(Some(row.into_link(tags)))
    }

    /// Every link the user has, in the order they were first saved.
    #[tracing::instrument(skip(self))]
    pub async fn list_links(&self, user: UserId) -> Result<Vec<Link>, DatabaseError> {
        // links and tags come from the same snapshot
        let mut tx = self.pool.begin().await?;
        let links = read_links(&mut tx, user).await?;
        tx.commit().await?;
        Ok(links)
    }

    /// Removes a link. Returns whether there was one to remove.
    ///
    /// Its tags stay around, even if nothing else uses them.
    #[tracing::instrument(skip(self))]
    pub async fn delete_link(&self, user: UserId, url: &str) -> Result<bool, DatabaseError> {
        let (delete, values) = Query::delete()
            .from_table(Links::Table)
            .and_where(Expr::col(Links::UserId).eq(user.to_string()))
            .and_where(Expr::col(Links::Url).eq(url.trim()))
            .build_sqlx(SqliteQueryBuilder);

        let res = sqlx::query_with(&delete, values)
            .execute(&self.pool)
            .await
            .inspect_err(|e| tracing::warn!("Link deletion failed! err: {e}"))?;

        Ok(res.rows_affected() > 0)
    }

    /// All of the user's tags, sorted by name.
    #[tracing::instrument(skip(self))]
    pub async fn list_tags(&self, user: UserId) -> Result<Vec<Tag>, DatabaseError> {
        let (select, values) = Query::select()
            .column(Tags::Name)
            .from(Tags::Table)
            .and_where(Expr::col(Tags::UserId).eq(user.to_string()))
            .order_by(Tags::Name, Order::Asc)
            .build_sqlx(SqliteQueryBuilder);

        Ok(sqlx::query_as_with::<_, Tag, _>(&select, values)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Removes tags that no link uses anymore. Returns how many went away.
    #[tracing::instrument(skip(self))]
    pub async fn delete_unused_tags(&self, user: UserId) -> Result<u64, DatabaseError> {
        let (delete, values) = Query::delete()
            .from_table(Tags::Table)
            .and_where(Expr::col(Tags::UserId).eq(user.to_string()))
            .and_where(
                Expr::col(Tags::Id).not_in_subquery(
                    Query::select()
                        .column(LinkTags::TagId)
                        .from(LinkTags::Table)
                        .to_owned(),
                ),
            )
            .build_sqlx(SqliteQueryBuilder);

        let res = sqlx::query_with(&delete, values).execute(&self.pool).await?;
        tracing::debug!("Pruned {} unused tags.", res.rows_affected());
        Ok(res.rows_affected())
    }
}

/// `link_id, name` for each of the user's tagged links.
fn tag_names_query(user: UserId) -> sea_query::SelectStatement {
    Query::select()
        .column((LinkTags::Table, LinkTags::LinkId))
        .column((Tags::Table, Tags::Name))
        .from(LinkTags::Table)
        .inner_join(
            Tags::Table,
            Expr::col((Tags::Table, Tags::Id)).equals((LinkTags::Table, LinkTags::TagId)),
        )
        .and_where(Expr::col((Tags::Table, Tags::UserId)).eq(user.to_string()))
        .order_by((Tags::Table, Tags::Name), Order::Asc)
        .to_owned()
}

/// Reads every link the user has, along with their tags.
///
/// Run this inside a transaction so both reads see the same data.
pub(crate) async fn read_links(
    conn: &mut SqliteConnection,
    user: UserId,
) -> Result<Vec<Link>, DatabaseError> {
    let (link_select, link_values) = Query::select()
        .columns([
            Links::Id,
            Links::Name,
            Links::Url,
            Links::CreatedAt,
            Links::UpdatedAt,
        ])
        .from(Links::Table)
        .and_where(Expr::col(Links::UserId).eq(user.to_string()))
        .order_by(Links::Id, Order::Asc)
        .build_sqlx(SqliteQueryBuilder);

    let rows = sqlx::query_as_with::<_, LinkRow, _>(&link_select, link_values)
        .fetch_all(&mut *conn)
        .await
        .inspect_err(|e| tracing::warn!("Failed to list links! err: {e}"))?;

    let (tag_select, tag_values) = tag_names_query(user).build_sqlx(SqliteQueryBuilder);
    let tag_rows = sqlx::query_as_with::<_, LinkTagRow, _>(&tag_select, tag_values)
        .fetch_all(&mut *conn)
        .await
        .inspect_err(|e| tracing::warn!("Failed to list link tags! err: {e}"))?;

    let mut tags_by_link: HashMap<i64, BTreeSet<String>> = HashMap::new();
    for tag_row in tag_rows {
        tags_by_link
            .entry(tag_row.link_id)
            .or_default()
            .insert(tag_row.name);
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let tags = tags_by_link.remove(&row.id).unwrap_or_default();
            row.into_link(tags)
        })
        .collect())
}

/// What happens to `created_at` when the URL is already stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CreatedAt {
    /// Keep the stored date. Re-saving a link doesn't make it new.
    Keep,
    /// Take the incoming date, like when restoring a bundle.
    Replace,
}

/// Upserts a link and replaces its tags.
///
/// On conflict, `created_at` follows `created`, and everything else is taken
/// from `link`. The caller must have already normalized it.
pub(crate) async fn write_link(
    conn: &mut SqliteConnection,
    user: UserId,
    link: Link,
    created: CreatedAt,
) -> Result<Link, DatabaseError> {
    let updated_columns = match created {
        CreatedAt::Keep => vec![Links::Name, Links::UpdatedAt],
        CreatedAt::Replace => vec![Links::Name, Links::CreatedAt, Links::UpdatedAt],
    };

    let (insert, values) = Query::insert()
        .into_table(Links::Table)
        .columns([
            Links::UserId,
            Links::Name,
            Links::Url,
            Links::CreatedAt,
            Links::UpdatedAt,
        ])
        .values([
            user.to_string().into(),
            link.name.as_str().into(),
            link.url.as_str().into(),
            link.created_at.into(),
            link.updated_at.into(),
        ])
        .map_err(build_failed)?
        .on_conflict(
            OnConflict::columns([Links::UserId, Links::Url])
                .update_columns(updated_columns)
                .to_owned(),
        )
        .returning(Query::returning().columns([
            Links::Id,
            Links::Name,
            Links::Url,
            Links::CreatedAt,
            Links::UpdatedAt,
        ]))
        .build_sqlx(SqliteQueryBuilder);

    let row = sqlx::query_as_with::<_, LinkRow, _>(&insert, values)
        .fetch_one(&mut *conn)
        .await
        .inspect_err(|e| tracing::warn!("Link insertion failed! err: {e}"))?;

    // out with the old tags...
    let (delete, values) = Query::delete()
        .from_table(LinkTags::Table)
        .and_where(Expr::col(LinkTags::LinkId).eq(row.id))
        .build_sqlx(SqliteQueryBuilder);
    sqlx::query_with(&delete, values).execute(&mut *conn).await?;

    // ...and in with the new
    if !link.tags.is_empty() {
        let mut insert = Query::insert();
        insert
            .into_table(Tags::Table)
            .columns([Tags::UserId, Tags::Name])
            .on_conflict(
                OnConflict::columns([Tags::UserId, Tags::Name])
                    .do_nothing()
                    .to_owned(),
            );
        for tag in &link.tags {
            insert
                .values([user.to_string().into(), tag.as_str().into()])
                .map_err(build_failed)?;
        }
        let (insert, values) = insert.build_sqlx(SqliteQueryBuilder);
        sqlx::query_with(&insert, values).execute(&mut *conn).await?;

        let (select, values) = Query::select()
            .column(Tags::Id)
            .from(Tags::Table)
            .and_where(Expr::col(Tags::UserId).eq(user.to_string()))
            .and_where(Expr::col(Tags::Name).is_in(link.tags.iter().map(String::as_str)))
            .build_sqlx(SqliteQueryBuilder);
        let tag_ids = sqlx::query_as_with::<_, IdRow, _>(&select, values)
            .fetch_all(&mut *conn)
            .await?;

        if tag_ids.is_empty() {
            tracing::error!("Tags were inserted, but none came back! {}", bug_msg().await);
            return Err(DatabaseError::TagsNotLinked { url: row.url });
        }

        let mut insert = Query::insert();
        insert
            .into_table(LinkTags::Table)
            .columns([LinkTags::LinkId, LinkTags::TagId]);
        for tag_id in tag_ids {
            insert
                .values([row.id.into(), tag_id.id.into()])
                .map_err(build_failed)?;
        }
        let (insert, values) = insert.build_sqlx(SqliteQueryBuilder);
        sqlx::query_with(&insert, values).execute(&mut *conn).await?;
    }

    Ok(row.into_link(link.tags))
}
