use std::{collections::HashMap, sync::Arc};

use anyhow::Context;
use chrono::Utc;
use lore_api::{
    Comment, CommentEdit, CommentId, CommentStore, EntityStore, EntityType, NewComment,
    NewCommentRow, Reason, UserId, ValidationErrors, MAX_REPLY_DEPTH,
};

use crate::{
    diff::{Change, Revision},
    ChangeRecorder, Error,
};

/// Creation, edition and soft deletion of comments
#[derive(Clone)]
pub struct CommentLifecycle {
    comments: Arc<dyn CommentStore>,
    entities: Arc<dyn EntityStore>,
    recorder: ChangeRecorder,
}

impl CommentLifecycle {
    pub fn new(
        comments: Arc<dyn CommentStore>,
        entities: Arc<dyn EntityStore>,
        recorder: ChangeRecorder,
    ) -> CommentLifecycle {
        CommentLifecycle {
            comments,
            entities,
            recorder,
        }
    }

    pub async fn add_comment(&self, c: NewComment, user: UserId) -> Result<Comment, Error> {
        let entity_type = c.entity_type.parse::<EntityType>().ok();
        let mut errs = ValidationErrors::new();
        errs.check(
            "entity_type",
            entity_type.map_or(false, |t| t.accepts_comments()),
            Reason::InvalidValue,
        )
        .check("entity_id", c.entity_id >= 0, Reason::InvalidValue)
        .check("parent_id", c.parent_id >= 0, Reason::InvalidValue)
        .check("text", lore_api::validate_text(&c.text), Reason::InvalidFormat)
        .check("title", lore_api::validate_title(&c.title), Reason::InvalidFormat)
        .check(
            "title",
            (c.parent_id == 0) != c.title.is_empty(),
            Reason::InvalidValue,
        );
        let entity_type = match (entity_type, errs.is_empty()) {
            (Some(t), true) => t,
            _ => return Err(Error::Api(lore_api::Error::Validation(errs))),
        };

        if !self
            .entities
            .exists(entity_type, c.entity_id)
            .await
            .with_context(|| format!("checking existence of {entity_type} {}", c.entity_id))?
        {
            return Err(Error::entity_not_found(entity_type, c.entity_id));
        }

        let (thread_id, parent_id) = match CommentId::from_raw(c.parent_id) {
            None => (None, None),
            Some(parent_id) => {
                let parent = self
                    .comments
                    .get(parent_id)
                    .await
                    .with_context(|| format!("fetching parent comment {parent_id}"))?
                    .filter(|p| !p.deleted)
                    .ok_or_else(|| Error::comment_not_found(parent_id))?;
                if parent.entity_type != entity_type || parent.entity_id != c.entity_id {
                    return Err(Error::invalid("parent_id", Reason::InvalidValue));
                }
                if self.depth_of(&parent).await? >= MAX_REPLY_DEPTH {
                    return Err(Error::invalid("parent_id", Reason::InvalidCount));
                }
                (Some(parent.thread_for_replies()), Some(parent_id))
            }
        };

        let comment = self
            .comments
            .add(NewCommentRow {
                entity_type,
                entity_id: c.entity_id,
                thread_id,
                parent_id,
                user_id: user,
                text: c.text,
                title: c.title,
                date: Utc::now(),
            })
            .await
            .context("inserting comment")?;
        tracing::debug!(id = %comment.id, thread = ?comment.thread_id, %user, "added comment");

        self.recorder
            .added(EntityType::Comment, comment.id.0, user)
            .await;
        Ok(comment)
    }

    pub async fn edit_comment(
        &self,
        id: CommentId,
        edit: CommentEdit,
        user: UserId,
    ) -> Result<bool, Error> {
        let mut errs = ValidationErrors::new();
        errs.check("id", id.0 > 0, Reason::InvalidValue)
            .check("text", lore_api::validate_text(&edit.text), Reason::InvalidFormat)
            .check("title", lore_api::validate_title(&edit.title), Reason::InvalidFormat);
        errs.into_result()?;

        let before = self
            .comments
            .get(id)
            .await
            .with_context(|| format!("fetching comment {id}"))?
            .filter(|c| !c.deleted)
            .ok_or_else(|| Error::comment_not_found(id))?;
        if before.user_id != user {
            return Err(Error::permission_denied());
        }
        if before.is_top_level() == edit.title.is_empty() {
            return Err(Error::invalid("title", Reason::InvalidValue));
        }

        let updated = self
            .comments
            .update(id, &edit.text, &edit.title)
            .await
            .with_context(|| format!("updating comment {id}"))?;
        if updated {
            let after = Comment {
                text: edit.text,
                title: edit.title,
                ..before.clone()
            };
            self.recorder
                .edited(
                    EntityType::Comment,
                    id.0,
                    user,
                    Revision::Comment(Change { before, after }),
                )
                .await;
        }
        Ok(updated)
    }

    /// Number of ancestors of `c` in its thread
    async fn depth_of(&self, c: &Comment) -> Result<usize, Error> {
        let thread_id = match c.thread_id {
            None => return Ok(0),
            Some(t) => t,
        };
        let parents = self
            .comments
            .get_thread(c.entity_type, c.entity_id, thread_id)
            .await
            .with_context(|| format!("fetching thread {thread_id} to measure reply depth"))?
            .into_iter()
            .map(|r| (r.id, r.parent_id))
            .collect::<HashMap<_, _>>();
        let mut depth = 0;
        let mut cur = c.parent_id;
        // bounded by the thread size in case of a parent cycle
        while let Some(p) = cur.filter(|_| depth <= parents.len()) {
            depth += 1;
            cur = parents.get(&p).copied().flatten();
        }
        Ok(depth)
    }

    /// Absent and foreign comments both give `PermissionDenied`, so that the existence of a
    /// comment one cannot delete is not disclosed. Deleting an already deleted comment of one's
    /// own succeeds without touching the store or the audit trail.
    pub async fn delete_comment(&self, id: CommentId, user: UserId) -> Result<bool, Error> {
        if id.0 <= 0 {
            return Err(Error::permission_denied());
        }

        let already_deleted = match self
            .comments
            .get(id)
            .await
            .with_context(|| format!("fetching comment {id}"))?
        {
            Some(c) if c.user_id == user => c.deleted,
            _ => return Err(Error::permission_denied()),
        };
        if already_deleted {
            tracing::debug!(%id, %user, "comment was already deleted");
            return Ok(true);
        }

        let deleted = self
            .comments
            .delete(id)
            .await
            .with_context(|| format!("soft-deleting comment {id}"))?;
        if deleted {
            self.recorder
                .deleted(EntityType::Comment, id.0, user)
                .await;
        }
        Ok(deleted)
    }
}
