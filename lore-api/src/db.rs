use async_trait::async_trait;

use crate::{
    AuthToken, ChangeLogRecord, Comment, CommentId, EntityType, NewChangeLogRecord, NewCommentRow,
    User, UserId,
};

// Collaborators of the core. Failures are infrastructure failures only: "not found" and friends
// are expressed in the Ok value. Implementations must not block: dropping the returned future is
// how callers cancel an in-flight call.

#[async_trait]
pub trait CommentStore: Send + Sync {
    /// Persists a new comment, assigning its id
    async fn add(&self, c: NewCommentRow) -> anyhow::Result<Comment>;

    /// Returns whether a comment was updated
    async fn update(&self, id: CommentId, text: &str, title: &str) -> anyhow::Result<bool>;

    /// Sets the soft-delete flag, returning whether a comment was found
    async fn delete(&self, id: CommentId) -> anyhow::Result<bool>;

    async fn get(&self, id: CommentId) -> anyhow::Result<Option<Comment>>;

    /// Top-level comments of an entity, by ascending id, `count` per page
    async fn get_thread_list(
        &self,
        entity_type: EntityType,
        entity_id: i64,
        count: u32,
        page: u32,
    ) -> anyhow::Result<Vec<Comment>>;

    /// The root `thread_id` and every comment whose thread is `thread_id`, flat
    async fn get_thread(
        &self,
        entity_type: EntityType,
        entity_id: i64,
        thread_id: CommentId,
    ) -> anyhow::Result<Vec<Comment>>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Unknown ids are silently skipped
    async fn get_list(&self, ids: &[UserId]) -> anyhow::Result<Vec<User>>;
}

#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Returns whether the record was stored
    async fn add(&self, r: NewChangeLogRecord) -> anyhow::Result<bool>;

    /// The audit trail of one entity, oldest first
    async fn list_for(
        &self,
        entity_type: EntityType,
        entity_id: i64,
    ) -> anyhow::Result<Vec<ChangeLogRecord>>;
}

#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn exists(&self, entity_type: EntityType, entity_id: i64) -> anyhow::Result<bool>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn resolve_session(&self, token: AuthToken) -> anyhow::Result<Option<UserId>>;
}
