use std::fmt;

use crate::{EntityType, Time, User, UserId};

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct CommentId(pub i64);

impl CommentId {
    /// Storage encodes "no comment" as id 0
    pub fn from_raw(id: i64) -> Option<CommentId> {
        (id != 0).then_some(CommentId(id))
    }

    pub fn raw(id: Option<CommentId>) -> i64 {
        id.map(|c| c.0).unwrap_or(0)
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Comment {
    pub id: CommentId,
    pub entity_type: EntityType,
    pub entity_id: i64,

    /// Root of the conversation, `None` for the root itself
    pub thread_id: Option<CommentId>,

    /// Immediate parent, `None` for top-level comments
    pub parent_id: Option<CommentId>,

    pub user_id: UserId,
    pub text: String,

    /// Set on top-level comments, always empty on replies
    pub title: String,

    pub date: Time,
    pub deleted: bool,

    // Everything below is attached by the use-cases and never persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Comment>,
}

impl Comment {
    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }

    /// The thread a reply to this comment belongs to
    pub fn thread_for_replies(&self) -> CommentId {
        self.thread_id.unwrap_or(self.id)
    }

    /// Pre-order traversal of this comment and all its descendants
    pub fn flatten(&self) -> Vec<&Comment> {
        let mut res = Vec::new();
        let mut stack = vec![self];
        while let Some(c) = stack.pop() {
            res.push(c);
            stack.extend(c.children.iter().rev());
        }
        res
    }
}

/// Request body of the "add comment" use-case
///
/// Kept with raw fields, so that every malformed input can be reported against its field name.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewComment {
    pub entity_type: String,
    pub entity_id: i64,
    /// 0 for a new thread
    #[serde(default)]
    pub parent_id: i64,
    pub text: String,
    #[serde(default)]
    pub title: String,
}

/// Request body of the "edit comment" use-case
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CommentEdit {
    pub text: String,
    #[serde(default)]
    pub title: String,
}

/// A validated comment, ready to be handed to a `CommentStore` which assigns its id
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewCommentRow {
    pub entity_type: EntityType,
    pub entity_id: i64,
    pub thread_id: Option<CommentId>,
    pub parent_id: Option<CommentId>,
    pub user_id: UserId,
    pub text: String,
    pub title: String,
    pub date: Time,
}

impl NewCommentRow {
    pub fn into_comment(self, id: CommentId) -> Comment {
        Comment {
            id,
            entity_type: self.entity_type,
            entity_id: self.entity_id,
            thread_id: self.thread_id,
            parent_id: self.parent_id,
            user_id: self.user_id,
            text: self.text,
            title: self.title,
            date: self.date,
            deleted: false,
            points: None,
            user: None,
            children: Vec::new(),
        }
    }
}
