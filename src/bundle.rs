//! The JSON export/import bundle.
//!
//! A bundle holds everything a user has: their settings blob, their groups,
//! and their links. Groups keep the same nested shape the API hands out.
//!
//! ```json
//! {
//!   "config": {},
//!   "groups": [{ "name": "work", "include": [{ "tags": ["work"], "names": [], "urls": [] }], "exclude": [] }],
//!   "links": [{ "name": "Doc", "url": "https://docs.example.com", "tags": ["work"], "createdAt": "...", "updatedAt": "..." }]
//! }
//! ```

use crate::{
    database::{
        groups::{read_groups, write_group},
        links::{read_links, write_link, CreatedAt},
        user_config::{read_user_config, write_user_config},
        LinkStore,
    },
    error::{BundleError, DatabaseError},
    models::{
        group::Group,
        link::{Link, NewLink},
        UserId,
    },
};

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Bundle {
    /// The user's settings. `null` means there aren't any.
    #[serde(default)]
    pub config: serde_json::Value,

    #[serde(default)]
    pub groups: Vec<Group>,

    #[serde(default)]
    pub links: Vec<Link>,
}

impl Bundle {
    pub fn to_json(&self) -> Result<String, BundleError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(s: &str) -> Result<Self, BundleError> {
        serde_json::from_str(s)
            .inspect_err(|e| tracing::warn!("Couldn't parse bundle. err: {e}"))
            .map_err(BundleError::Json)
    }
}

/// What an import actually wrote.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub links: usize,
    pub groups: usize,
    pub config: bool,
}

impl LinkStore {
    /// Gathers everything the user has into a bundle.
    #[tracing::instrument(skip(self))]
    pub async fn export_bundle(&self, user: UserId) -> Result<Bundle, BundleError> {
        // everything comes from one snapshot
        let mut tx = self.pool().begin().await.map_err(DatabaseError::from)?;
        let config = read_user_config(&mut tx, user).await?;
        let groups = read_groups(&mut tx, user, self.limits().max_rules_per_group).await?;
        let links = read_links(&mut tx, user).await?;
        tx.commit().await.map_err(DatabaseError::from)?;

        tracing::info!(
            "Exported {} links and {} groups.",
            links.len(),
            groups.len()
        );
        Ok(Bundle {
            config,
            groups,
            links,
        })
    }

    /// Merges a bundle into the user's data.
    ///
    /// Links are upserted by URL and take the bundle's timestamps, even over
    /// a link that's already stored. Groups are
    /// upserted by name, replacing their rules. A `null` config leaves the
    /// current one alone. Either everything lands or nothing does.
    #[tracing::instrument(skip(self, bundle))]
    pub async fn import_bundle(
        &self,
        user: UserId,
        bundle: Bundle,
    ) -> Result<ImportSummary, BundleError> {
        let mut summary = ImportSummary::default();
        let mut tx = self.pool().begin().await.map_err(DatabaseError::from)?;

        for link in bundle.links {
            let (created_at, updated_at) = (link.created_at, link.updated_at);
            let new = NewLink::from(link).normalized(self.limits()).map_err(DatabaseError::from)?;

            write_link(
                &mut tx,
                user,
                Link {
                    name: new.name,
                    url: new.url,
                    tags: new.tags.into_iter().collect(),
                    created_at,
                    updated_at,
                },
                CreatedAt::Replace,
            )
            .await?;
            summary.links += 1;
        }

        for group in bundle.groups {
            let group = group.normalized(self.limits()).map_err(DatabaseError::from)?;
            write_group(&mut tx, user, &group).await?;
            summary.groups += 1;
        }

        if !bundle.config.is_null() {
            write_user_config(&mut tx, user, &bundle.config).await?;
            summary.config = true;
        }

        tx.commit().await.map_err(DatabaseError::from)?;

        tracing::info!("Imported bundle: {summary:?}");
        Ok(summary)
    }
}
