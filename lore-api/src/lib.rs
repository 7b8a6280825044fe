use chrono::Utc;

pub use uuid::{uuid, Uuid};
pub type Time = chrono::DateTime<Utc>;

mod audit;
pub use audit::{ChangeLogRecord, NewChangeLogRecord};

mod auth;
pub use auth::AuthToken;

mod comment;
pub use comment::{Comment, CommentEdit, CommentId, NewComment, NewCommentRow};

mod db;
pub use db::{AuditStore, CommentStore, EntityStore, SessionStore, UserStore};

mod entity;
pub use entity::{ChangeAction, ChangeKind, EntityType};

mod error;
pub use error::{Error, Reason, ValidationErrors};

mod plan;
pub use plan::{Plan, PlanStep, StepKind};

mod thread;
pub use thread::{ThreadPage, ThreadQuery, ValidThreadQuery};

mod topic;
pub use topic::{Topic, TopicTag};

mod user;
pub use user::{User, UserId};

pub const MAX_TEXT_LEN: usize = 10_000;
pub const MAX_TITLE_LEN: usize = 200;
/// Replies nest at most this many levels below their thread root
pub const MAX_REPLY_DEPTH: usize = 50;

// The validate_* functions are format predicates only: they never look at the store, so that
// callers can run them before any mutation happens.

/// Comment bodies: non-blank, bounded, no null bytes (postgres rejects them)
pub fn validate_text(s: &str) -> bool {
    !s.trim().is_empty() && s.chars().count() <= MAX_TEXT_LEN && !s.contains('\0')
}

/// Titles may be empty (replies have none), otherwise same rules as text with a lower bound
pub fn validate_title(s: &str) -> bool {
    s.chars().count() <= MAX_TITLE_LEN && !s.contains('\0') && (s.is_empty() || !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_predicate() {
        assert!(validate_text("hello"));
        assert!(!validate_text(""));
        assert!(!validate_text("   \n"));
        assert!(!validate_text("nul\0byte"));
        assert!(validate_text(&"a".repeat(MAX_TEXT_LEN)));
        assert!(!validate_text(&"a".repeat(MAX_TEXT_LEN + 1)));
    }

    #[test]
    fn title_predicate() {
        assert!(validate_title(""));
        assert!(validate_title("A title"));
        assert!(!validate_title("  "));
        assert!(!validate_title(&"é".repeat(MAX_TITLE_LEN + 1)));
    }
}
