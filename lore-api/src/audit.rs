use crate::{ChangeAction, EntityType, Time, UserId};

/// One line of the audit trail. These are only ever inserted.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ChangeLogRecord {
    pub id: i64,
    pub date: Time,
    pub action: ChangeAction,
    pub user_id: UserId,
    pub entity_type: EntityType,
    pub entity_id: i64,

    /// Serialized diff, empty unless `action` is an edit
    pub diff: String,

    /// Reserved, always 0 at creation
    pub points: i64,
}

/// What the recorder hands to an `AuditStore`; id and date are assigned at insertion
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewChangeLogRecord {
    pub action: ChangeAction,
    pub user_id: UserId,
    pub entity_type: EntityType,
    pub entity_id: i64,
    pub diff: String,
}

impl NewChangeLogRecord {
    pub fn into_record(self, id: i64, date: Time) -> ChangeLogRecord {
        ChangeLogRecord {
            id,
            date,
            action: self.action,
            user_id: self.user_id,
            entity_type: self.entity_type,
            entity_id: self.entity_id,
            diff: self.diff,
            points: 0,
        }
    }
}
