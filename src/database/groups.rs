//! Groups, stored as flat rule tuples.
//!
//! A group's rules are never patched. Saving a group deletes every rule it
//! had and inserts the new set, all in one transaction, so readers can't
//! catch it half-written.

use std::collections::BTreeMap;

use sea_query::{Expr, OnConflict, Order, Query, SqliteQueryBuilder};
use sea_query_binder::SqlxBinder as _;
use sqlx::SqliteConnection;

use crate::{
    error::{DatabaseError, ValidationError},
    grouping::{
        assemble::{assemble_rows, flatten},
        filter_links,
    },
    models::{
        group::Group,
        link::Link,
        rule::{GroupRule, GroupRuleRow},
        UserId,
    },
    validate::check_name,
};

use super::{build_failed, GroupRules, LinkGroups, LinkStore};

/// SQLite caps bound parameters per statement, so big rule sets go in batches.
const RULES_PER_INSERT: usize = 200;

#[derive(Clone, Debug, sqlx::FromRow)]
struct GroupRow {
    id: i64,
    name: String,
}

#[derive(Clone, Debug, sqlx::FromRow)]
struct OwnedRuleRow {
    group_id: i64,
    #[sqlx(flatten)]
    rule: GroupRuleRow,
}

impl LinkStore {
    /// Creates or replaces the group with the same name.
    ///
    /// Returns the group as it was stored (trimmed, without empty blocks).
    #[tracing::instrument(skip(self))]
    pub async fn save_group(&self, user: UserId, group: Group) -> Result<Group, DatabaseError> {
        let group = group.normalized(&self.limits)?;

        let mut tx = self.pool.begin().await?;
        write_group(&mut tx, user, &group).await?;
        tx.commit().await?;

        tracing::debug!(
            "Saved group `{}` with {} rules.",
            group.name,
            group.rule_count()
        );
        Ok(group)
    }

    /// Grabs one group by name.
    #[tracing::instrument(skip(self))]
    pub async fn get_group(&self, user: UserId, name: &str) -> Result<Option<Group>, DatabaseError> {
        let mut conn = self.pool.acquire().await?;

        let Some(row) = find_group(&mut conn, user, name.trim()).await? else {
            return Ok(None);
        };

        let (select, values) = rules_query()
            .and_where(Expr::col(GroupRules::GroupId).eq(row.id))
            .build_sqlx(SqliteQueryBuilder);

        let rows = sqlx::query_as_with::<_, OwnedRuleRow, _>(&select, values)
            .fetch_all(&mut *conn)
            .await?
            .into_iter()
            .map(|owned| owned.rule)
            .collect();

        let blocks = assemble_rows(rows, self.limits.max_rules_per_group)?;
        Ok(Some(blocks.into_group(row.name)))
    }

    /// Every group the user has, in the order they were created.
    #[tracing::instrument(skip(self))]
    pub async fn list_groups(&self, user: UserId) -> Result<Vec<Group>, DatabaseError> {
        // groups and their rules come from the same snapshot
        let mut tx = self.pool.begin().await?;
        let groups = read_groups(&mut tx, user, self.limits.max_rules_per_group).await?;
        tx.commit().await?;
        Ok(groups)
    }

    /// Gives a group a new name. Its rules stay as they are.
    #[tracing::instrument(skip(self))]
    pub async fn rename_group(
        &self,
        user: UserId,
        old_name: &str,
        new_name: &str,
    ) -> Result<(), DatabaseError> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(ValidationError::EmptyGroupName.into());
        }
        check_name(new_name, &self.limits)?;

        let mut tx = self.pool.begin().await?;

        let Some(row) = find_group(&mut tx, user, old_name.trim()).await? else {
            return Err(DatabaseError::GroupNotFound {
                name: old_name.to_string(),
            });
        };

        if row.name == new_name {
            return Ok(());
        }

        if find_group(&mut tx, user, new_name).await?.is_some() {
            return Err(DatabaseError::GroupNameTaken {
                name: new_name.to_string(),
            });
        }

        let (update, values) = Query::update()
            .table(LinkGroups::Table)
            .value(LinkGroups::Name, new_name)
            .and_where(Expr::col(LinkGroups::Id).eq(row.id))
            .build_sqlx(SqliteQueryBuilder);
        sqlx::query_with(&update, values).execute(&mut *tx).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Removes a group and all of its rules. Returns whether it existed.
    #[tracing::instrument(skip(self))]
    pub async fn delete_group(&self, user: UserId, name: &str) -> Result<bool, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let Some(row) = find_group(&mut tx, user, name.trim()).await? else {
            return Ok(false);
        };

        // the foreign key cascades too, but don't lean on the pragma
        delete_rules(&mut tx, row.id).await?;

        let (delete, values) = Query::delete()
            .from_table(LinkGroups::Table)
            .and_where(Expr::col(LinkGroups::Id).eq(row.id))
            .build_sqlx(SqliteQueryBuilder);
        sqlx::query_with(&delete, values).execute(&mut *tx).await?;

        tx.commit().await?;
        Ok(true)
    }

    /// The user's links that belong in the named group, in saved order.
    #[tracing::instrument(skip(self))]
    pub async fn group_links(&self, user: UserId, name: &str) -> Result<Vec<Link>, DatabaseError> {
        let group = self
            .get_group(user, name)
            .await?
            .ok_or_else(|| DatabaseError::GroupNotFound {
                name: name.to_string(),
            })?;

        let links = self.list_links(user).await?;
        let total = links.len();
        let kept = filter_links(links, &group);

        tracing::debug!("Group `{}` kept {}/{total} links.", group.name, kept.len());
        Ok(kept)
    }
}

/// `group_id` plus the rule columns, in block order.
fn rules_query() -> sea_query::SelectStatement {
    Query::select()
        .columns([
            (GroupRules::Table, GroupRules::GroupId),
            (GroupRules::Table, GroupRules::RuleType),
            (GroupRules::Table, GroupRules::MatchType),
            (GroupRules::Table, GroupRules::MatchValue),
            (GroupRules::Table, GroupRules::BlockIndex),
        ])
        .from(GroupRules::Table)
        .order_by((GroupRules::Table, GroupRules::BlockIndex), Order::Asc)
        .order_by((GroupRules::Table, GroupRules::Id), Order::Asc)
        .to_owned()
}

/// Reads every group the user has, rules and all.
///
/// Run this inside a transaction so both reads see the same data.
pub(crate) async fn read_groups(
    conn: &mut SqliteConnection,
    user: UserId,
    max_rules: usize,
) -> Result<Vec<Group>, DatabaseError> {
    let (group_select, group_values) = Query::select()
        .columns([LinkGroups::Id, LinkGroups::Name])
        .from(LinkGroups::Table)
        .and_where(Expr::col(LinkGroups::UserId).eq(user.to_string()))
        .order_by(LinkGroups::Id, Order::Asc)
        .build_sqlx(SqliteQueryBuilder);

    let groups = sqlx::query_as_with::<_, GroupRow, _>(&group_select, group_values)
        .fetch_all(&mut *conn)
        .await
        .inspect_err(|e| tracing::warn!("Failed to list groups! err: {e}"))?;

    let (rule_select, rule_values) = rules_query()
        .inner_join(
            LinkGroups::Table,
            Expr::col((LinkGroups::Table, LinkGroups::Id))
                .equals((GroupRules::Table, GroupRules::GroupId)),
        )
        .and_where(Expr::col((LinkGroups::Table, LinkGroups::UserId)).eq(user.to_string()))
        .build_sqlx(SqliteQueryBuilder);

    let rules = sqlx::query_as_with::<_, OwnedRuleRow, _>(&rule_select, rule_values)
        .fetch_all(&mut *conn)
        .await
        .inspect_err(|e| tracing::warn!("Failed to list group rules! err: {e}"))?;

    let mut rules_by_group: BTreeMap<i64, Vec<GroupRuleRow>> = BTreeMap::new();
    for owned in rules {
        rules_by_group
            .entry(owned.group_id)
            .or_default()
            .push(owned.rule);
    }

    groups
        .into_iter()
        .map(|row| -> Result<Group, DatabaseError> {
            let rows = rules_by_group.remove(&row.id).unwrap_or_default();
            let blocks = assemble_rows(rows, max_rules)
                .inspect_err(|e| tracing::error!("Group `{}` is corrupt! err: {e}", row.name))?;
            Ok(blocks.into_group(row.name))
        })
        .collect()
}

async fn find_group(
    conn: &mut SqliteConnection,
    user: UserId,
    name: &str,
) -> Result<Option<GroupRow>, DatabaseError> {
    let (select, values) = Query::select()
        .columns([LinkGroups::Id, LinkGroups::Name])
        .from(LinkGroups::Table)
        .and_where(Expr::col(LinkGroups::UserId).eq(user.to_string()))
        .and_where(Expr::col(LinkGroups::Name).eq(name))
        .build_sqlx(SqliteQueryBuilder);

    Ok(sqlx::query_as_with::<_, GroupRow, _>(&select, values)
        .fetch_optional(&mut *conn)
        .await?)
}

async fn delete_rules(conn: &mut SqliteConnection, group_id: i64) -> Result<u64, DatabaseError> {
    let (delete, values) = Query::delete()
        .from_table(GroupRules::Table)
        .and_where(Expr::col(GroupRules::GroupId).eq(group_id))
        .build_sqlx(SqliteQueryBuilder);

    Ok(sqlx::query_with(&delete, values)
        .execute(&mut *conn)
        .await?
        .rows_affected())
}

/// Upserts the group row, then swaps out all of its rules.
///
/// Run this inside a transaction. The group must already be normalized.
pub(crate) async fn write_group(
    conn: &mut SqliteConnection,
    user: UserId,
    group: &Group,
) -> Result<i64, DatabaseError> {
    let (insert, values) = Query::insert()
        .into_table(LinkGroups::Table)
        .columns([LinkGroups::UserId, LinkGroups::Name])
        .values([user.to_string().into(), group.name.as_str().into()])
        .map_err(build_failed)?
        .on_conflict(
            OnConflict::columns([LinkGroups::UserId, LinkGroups::Name])
                .update_column(LinkGroups::Name)
                .to_owned(),
        )
        .returning(Query::returning().columns([LinkGroups::Id, LinkGroups::Name]))
        .build_sqlx(SqliteQueryBuilder);

    let row = sqlx::query_as_with::<_, GroupRow, _>(&insert, values)
        .fetch_one(&mut *conn)
        .await
        .inspect_err(|e| tracing::warn!("Group insertion failed! err: {e}"))?;

    let removed = delete_rules(conn, row.id).await?;
    let rules = flatten(group);
    tracing::debug!("Replacing {removed} rules with {}.", rules.len());

    for batch in rules.chunks(RULES_PER_INSERT) {
        insert_rules(conn, row.id, batch).await?;
    }

    Ok(row.id)
}

async fn insert_rules(
    conn: &mut SqliteConnection,
    group_id: i64,
    rules: &[GroupRule],
) -> Result<(), DatabaseError> {
    let mut insert = Query::insert();
    insert.into_table(GroupRules::Table).columns([
        GroupRules::GroupId,
        GroupRules::RuleType,
        GroupRules::MatchType,
        GroupRules::MatchValue,
        GroupRules::BlockIndex,
    ]);

    for rule in rules {
        insert
            .values([
                group_id.into(),
                rule.rule_type.as_str().into(),
                rule.match_type.as_str().into(),
                rule.match_value.as_str().into(),
                i64::from(rule.block_index).into(),
            ])
            .map_err(build_failed)?;
    }

    let (insert, values) = insert.build_sqlx(SqliteQueryBuilder);
    sqlx::query_with(&insert, values)
        .execute(&mut *conn)
        .await
        .inspect_err(|e| tracing::warn!("Rule insertion failed! err: {e}"))?;

    Ok(())
}
