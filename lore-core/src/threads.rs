use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use anyhow::Context;
use lore_api::{
    Comment, CommentId, CommentStore, EntityType, Reason, ThreadPage, ThreadQuery, User, UserId,
    UserStore, ValidationErrors,
};

use crate::{build_tree, Error};

/// Read side of the comments: pages of threads, and whole threads
#[derive(Clone)]
pub struct ThreadPaginator {
    comments: Arc<dyn CommentStore>,
    users: Arc<dyn UserStore>,
}

impl ThreadPaginator {
    pub fn new(comments: Arc<dyn CommentStore>, users: Arc<dyn UserStore>) -> ThreadPaginator {
        ThreadPaginator { comments, users }
    }

    /// Lists one page of top-level comments, each with its author attached
    ///
    /// `has_more` is set as soon as the page is full, so a caller reading exactly up to the last
    /// thread will get one extra empty page.
    pub async fn get_threads(&self, q: &ThreadQuery) -> Result<ThreadPage, Error> {
        let q = q.validate()?;
        let mut threads = self
            .comments
            .get_thread_list(q.entity_type, q.entity_id, q.page_size, q.page_index)
            .await
            .with_context(|| {
                format!(
                    "listing threads of {} {} (page {} of size {})",
                    q.entity_type, q.entity_id, q.page_index, q.page_size
                )
            })?;
        let has_more = threads.len() == q.page_size as usize;
        self.attach_users(threads.iter_mut()).await?;
        Ok(ThreadPage { threads, has_more })
    }

    /// Fetches a whole thread and nests it, attaching the authors of every comment in it
    ///
    /// `thread_id` must name a top-level comment; anything else is `CommentNotFound`.
    pub async fn thread(
        &self,
        entity_type: &str,
        entity_id: i64,
        thread_id: i64,
    ) -> Result<Vec<Comment>, Error> {
        let parsed = entity_type.parse::<EntityType>().ok();
        let mut errs = ValidationErrors::new();
        errs.check("entity_type", parsed.is_some(), Reason::InvalidValue)
            .check("entity_id", entity_id >= 0, Reason::InvalidValue)
            .check("thread_id", thread_id > 0, Reason::InvalidValue);
        let entity_type = match (parsed, errs.is_empty()) {
            (Some(t), true) => t,
            _ => return Err(Error::Api(lore_api::Error::Validation(errs))),
        };

        let thread_id = CommentId(thread_id);
        let mut flat = self
            .comments
            .get_thread(entity_type, entity_id, thread_id)
            .await
            .with_context(|| format!("fetching thread {thread_id} of {entity_type} {entity_id}"))?;
        // a reply's id would otherwise fetch just that reply
        if !flat.iter().any(|c| c.id == thread_id && c.is_top_level()) {
            return Err(Error::comment_not_found(thread_id));
        }
        self.attach_users(flat.iter_mut()).await?;
        Ok(build_tree(flat))
    }

    async fn attach_users<'a>(
        &self,
        comments: impl Iterator<Item = &'a mut Comment>,
    ) -> Result<(), Error> {
        let comments = comments.collect::<Vec<_>>();
        if comments.is_empty() {
            return Ok(());
        }
        let ids = comments
            .iter()
            .map(|c| c.user_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();
        let users = self
            .users
            .get_list(&ids)
            .await
            .with_context(|| format!("fetching {} comment authors", ids.len()))?
            .into_iter()
            .map(|u| (u.id, u))
            .collect::<BTreeMap<UserId, User>>();
        for c in comments {
            match users.get(&c.user_id) {
                Some(u) => c.user = Some(u.clone()),
                None => tracing::warn!(comment = %c.id, user = %c.user_id, "comment author not found"),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use lore_api::{Error as ApiError, NewCommentRow};
    use lore_mock_store::MockStore;

    use super::*;

    fn user(id: i64) -> User {
        User {
            id: UserId(id),
            name: format!("user{id}"),
            email: String::new(),
            img: String::new(),
            rights: 0,
        }
    }

    async fn add(store: &MockStore, parent: Option<&Comment>, author: i64) -> Comment {
        CommentStore::add(
            store,
            NewCommentRow {
                entity_type: EntityType::Plan,
                entity_id: 1,
                thread_id: parent.map(|p| p.thread_for_replies()),
                parent_id: parent.map(|p| p.id),
                user_id: UserId(author),
                text: String::from("text"),
                title: String::from(if parent.is_none() { "title" } else { "" }),
                date: Utc::now(),
            },
        )
        .await
        .unwrap()
    }

    fn setup() -> (Arc<MockStore>, ThreadPaginator) {
        let store = Arc::new(MockStore::new());
        store.add_user(user(1));
        store.add_user(user(2));
        let paginator = ThreadPaginator::new(store.clone(), store.clone());
        (store, paginator)
    }

    fn page(page_size: i64, page_index: i64) -> ThreadQuery {
        ThreadQuery {
            entity_type: String::from("plan"),
            entity_id: 1,
            page_size,
            page_index,
        }
    }

    #[tokio::test]
    async fn has_more_iff_page_is_full() {
        let (store, p) = setup();
        let a = add(&store, None, 1).await;
        add(&store, Some(&a), 2).await;
        let b = add(&store, None, 2).await;
        let c = add(&store, None, 1).await;

        let first = p.get_threads(&page(2, 0)).await.unwrap();
        assert!(first.has_more);
        assert_eq!(
            first.threads.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![a.id, b.id]
        );

        let second = p.get_threads(&page(2, 1)).await.unwrap();
        assert!(!second.has_more);
        assert_eq!(
            second.threads.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![c.id]
        );

        let third = p.get_threads(&page(2, 2)).await.unwrap();
        assert!(!third.has_more);
        assert!(third.threads.is_empty());
    }

    #[tokio::test]
    async fn users_are_fetched_in_one_batch() {
        let (store, p) = setup();
        for author in [1, 2, 1, 3] {
            add(&store, None, author).await;
        }
        let before = store.user_list_calls();
        let res = p.get_threads(&page(10, 0)).await.unwrap();
        assert_eq!(store.user_list_calls(), before + 1);
        assert_eq!(res.threads.len(), 4);
        assert_eq!(res.threads[0].user, Some(user(1)));
        assert_eq!(res.threads[1].user, Some(user(2)));
        // unknown authors are left unset rather than failing the page
        assert_eq!(res.threads[3].user, None);
    }

    #[tokio::test]
    async fn invalid_queries_are_rejected() {
        let (_, p) = setup();
        let mut q = page(0, -1);
        q.entity_type = String::from("nope");
        match p.get_threads(&q).await {
            Err(Error::Api(ApiError::Validation(errs))) => {
                assert_eq!(errs.get("page_size"), Some(Reason::InvalidCount));
                assert_eq!(errs.get("page_index"), Some(Reason::InvalidValue));
                assert_eq!(errs.get("entity_type"), Some(Reason::InvalidValue));
            }
            r => panic!("expected validation error, got {r:?}"),
        }
    }

    #[tokio::test]
    async fn whole_thread_is_nested() {
        let (store, p) = setup();
        let a = add(&store, None, 1).await;
        let b = add(&store, Some(&a), 2).await;
        let c = add(&store, Some(&b), 1).await;
        let d = add(&store, Some(&a), 1).await;
        add(&store, None, 2).await;

        let before = store.user_list_calls();
        let tree = p.thread("plan", 1, a.id.0).await.unwrap();
        assert_eq!(store.user_list_calls(), before + 1);
        assert_eq!(tree.len(), 1);
        let root = &tree[0];
        assert_eq!(root.id, a.id);
        assert_eq!(
            root.children.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![b.id, d.id]
        );
        assert_eq!(root.children[0].children[0].id, c.id);
        assert!(root.flatten().iter().all(|c| c.user.is_some()));

        assert!(matches!(
            p.thread("plan", 1, 999).await,
            Err(Error::Api(ApiError::CommentNotFound(CommentId(999))))
        ));
        assert!(matches!(
            p.thread("plan", 1, 0).await,
            Err(Error::Api(ApiError::Validation(_)))
        ));
    }

    #[tokio::test]
    async fn replies_do_not_name_threads() {
        let (store, p) = setup();
        let a = add(&store, None, 1).await;
        let b = add(&store, Some(&a), 2).await;
        add(&store, Some(&b), 1).await;

        let before = store.user_list_calls();
        assert!(matches!(
            p.thread("plan", 1, b.id.0).await,
            Err(Error::Api(ApiError::CommentNotFound(id))) if id == b.id
        ));
        assert_eq!(store.user_list_calls(), before);
        assert_eq!(p.thread("plan", 1, a.id.0).await.unwrap()[0].flatten().len(), 3);
    }
}
