pub mod diff;

mod error;
pub use error::Error;

mod lifecycle;
pub use lifecycle::CommentLifecycle;

mod recorder;
pub use recorder::{AuditFailure, ChangeRecorder};

mod threads;
pub use threads::ThreadPaginator;

mod tree;
pub use tree::build_tree;

pub mod api {
    pub use lore_api::*;
}
