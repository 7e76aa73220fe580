//! Tests storing links and their tags.

mod common;

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use tabinator::{
        config::Limits,
        error::{DatabaseError, ValidationError},
        models::{link::NewLink, tags::Tag, UserId},
    };

    use crate::common::{setup, setup_with_limits};

    #[tokio::test]
    async fn upsert_then_get() {
        let store = setup().await;
        let user = UserId::new();

        let saved = store
            .upsert_link(
                user,
                NewLink::new(" Doc ", "https://docs.example.com")
                    .tag("work")
                    .tag("ref")
                    .tag("work"),
            )
            .await
            .expect("save link");

        assert_eq!(saved.name, "Doc");
        assert_eq!(saved.tags.len(), 2);

        let got = store
            .get_link(user, "https://docs.example.com")
            .await
            .unwrap()
            .expect("link should be stored");
        assert_eq!(got, saved);
    }

    #[tokio::test]
    async fn saving_the_same_url_updates_in_place() {
        let store = setup().await;
        let user = UserId::new();

        let first = store
            .upsert_link(user, NewLink::new("Old", "https://x.com").tag("a").tag("b"))
            .await
            .unwrap();
        let second = store
            .upsert_link(user, NewLink::new("New", "https://x.com").tag("c"))
            .await
            .unwrap();

        // same link, so the creation date sticks
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= first.updated_at);

        let links = store.list_links(user).await.unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].name, "New");
        assert_eq!(links[0].tags, BTreeSet::from(["c".to_string()]));

        // the old tags are still around, just unused
        let tags = store.list_tags(user).await.unwrap();
        assert_eq!(tags, vec![Tag::new("a"), Tag::new("b"), Tag::new("c")]);
    }

    #[tokio::test]
    async fn links_list_in_saved_order() {
        let store = setup().await;
        let user = UserId::new();

        for url in ["https://c.com", "https://a.com", "https://b.com"] {
            store
                .upsert_link(user, NewLink::new("", url).tag("t"))
                .await
                .unwrap();
        }

        let urls: Vec<_> = store
            .list_links(user)
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.url)
            .collect();
        assert_eq!(urls, ["https://c.com", "https://a.com", "https://b.com"]);
    }

    #[tokio::test]
    async fn users_only_see_their_own_links() {
        let store = setup().await;
        let (alice, bob) = (UserId::new(), UserId::new());

        store
            .upsert_link(alice, NewLink::new("A", "https://x.com").tag("mine"))
            .await
            .unwrap();
        store
            .upsert_link(bob, NewLink::new("B", "https://x.com").tag("mine"))
            .await
            .unwrap();

        let alices = store.list_links(alice).await.unwrap();
        assert_eq!(alices.len(), 1);
        assert_eq!(alices[0].name, "A");

        assert_eq!(store.list_tags(bob).await.unwrap(), vec![Tag::new("mine")]);
        assert!(store.list_links(UserId::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleting_links_keeps_tags_until_pruned() {
        let store = setup().await;
        let user = UserId::new();

        store
            .upsert_link(user, NewLink::new("A", "https://a.com").tag("shared").tag("solo"))
            .await
            .unwrap();
        store
            .upsert_link(user, NewLink::new("B", "https://b.com").tag("shared"))
            .await
            .unwrap();

        assert!(store.delete_link(user, "https://a.com").await.unwrap());
        assert!(!store.delete_link(user, "https://a.com").await.unwrap());
        assert!(store.get_link(user, "https://a.com").await.unwrap().is_none());

        assert_eq!(store.list_tags(user).await.unwrap().len(), 2);
        assert_eq!(store.delete_unused_tags(user).await.unwrap(), 1);
        assert_eq!(
            store.list_tags(user).await.unwrap(),
            vec![Tag::new("shared")]
        );
    }

    #[tokio::test]
    async fn unattached_tags_fail_the_save() {
        let store = setup().await;
        let user = UserId::new();

        // make every tag insert vanish without an error
        sqlx::query("CREATE TRIGGER swallow_tags BEFORE INSERT ON tags BEGIN SELECT RAISE(IGNORE); END")
            .execute(store.pool())
            .await
            .unwrap();

        let err = store
            .upsert_link(user, NewLink::new("Doc", "https://docs.example.com").tag("work"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DatabaseError::TagsNotLinked { ref url } if url == "https://docs.example.com"
        ));

        // nothing was kept from the failed save
        assert!(store
            .get_link(user, "https://docs.example.com")
            .await
            .unwrap()
            .is_none());

        // links without tags never look for any
        store
            .upsert_link(user, NewLink::new("Bare", "https://bare.com"))
            .await
            .unwrap();
        assert_eq!(store.list_links(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn bad_links_are_refused() {
        let store = setup_with_limits(Limits {
            max_tags_per_link: 1,
            ..Limits::default()
        })
        .await;
        let user = UserId::new();

        let err = store
            .upsert_link(user, NewLink::new("Doc", "   "))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DatabaseError::Invalid(ValidationError::EmptyUrl)
        ));

        let err = store
            .upsert_link(user, NewLink::new("Doc", "https://x.com").tag("a").tag("b"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DatabaseError::Invalid(ValidationError::TooManyTags { count: 2, max: 1, .. })
        ));

        assert!(store.list_links(user).await.unwrap().is_empty());
    }
}
