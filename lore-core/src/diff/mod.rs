mod entity;
pub use entity::{Change, CommentDiff, Diffable, PlanDiff, Revision, TopicDiff, UserDiff};

mod list;
pub use list::{diff_list, Element, ElementChange, ElementChangeKind};

mod text;
pub use text::{diff_text, diff_value};
