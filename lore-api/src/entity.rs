use std::{fmt, str::FromStr};

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Plan,
    Topic,
    Project,
    Resource,
    Comment,
    User,
}

impl EntityType {
    pub const ALL: [EntityType; 6] = [
        EntityType::Plan,
        EntityType::Topic,
        EntityType::Project,
        EntityType::Resource,
        EntityType::Comment,
        EntityType::User,
    ];

    pub fn code(&self) -> i16 {
        match self {
            EntityType::Plan => 1,
            EntityType::Topic => 2,
            EntityType::Project => 3,
            EntityType::Resource => 4,
            EntityType::Comment => 5,
            EntityType::User => 6,
        }
    }

    pub fn from_code(code: i16) -> Option<EntityType> {
        EntityType::ALL.into_iter().find(|t| t.code() == code)
    }

    pub fn name(&self) -> &'static str {
        match self {
            EntityType::Plan => "plan",
            EntityType::Topic => "topic",
            EntityType::Project => "project",
            EntityType::Resource => "resource",
            EntityType::Comment => "comment",
            EntityType::User => "user",
        }
    }

    /// Only plans can currently be commented on
    pub fn accepts_comments(&self) -> bool {
        matches!(self, EntityType::Plan)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EntityType {
    type Err = ();

    /// Accepts either the name (case-insensitive) or the numeric code
    fn from_str(s: &str) -> Result<EntityType, ()> {
        if let Ok(code) = s.parse::<i16>() {
            return EntityType::from_code(code).ok_or(());
        }
        EntityType::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Add,
    Edit,
    Delete,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum ChangeAction {
    AddPlan,
    EditPlan,
    DeletePlan,
    AddTopic,
    EditTopic,
    DeleteTopic,
    AddProject,
    EditProject,
    DeleteProject,
    AddResource,
    EditResource,
    DeleteResource,
    AddComment,
    EditComment,
    DeleteComment,
    AddUser,
    EditUser,
    DeleteUser,
}

use ChangeAction::*;
use ChangeKind::{Add, Delete, Edit};

static ACTIONS: [(EntityType, ChangeKind, ChangeAction, i16); 18] = [
    (EntityType::Plan, Add, AddPlan, 1),
    (EntityType::Plan, Edit, EditPlan, 2),
    (EntityType::Plan, Delete, DeletePlan, 3),
    (EntityType::Topic, Add, AddTopic, 4),
    (EntityType::Topic, Edit, EditTopic, 5),
    (EntityType::Topic, Delete, DeleteTopic, 6),
    (EntityType::Project, Add, AddProject, 7),
    (EntityType::Project, Edit, EditProject, 8),
    (EntityType::Project, Delete, DeleteProject, 9),
    (EntityType::Resource, Add, AddResource, 10),
    (EntityType::Resource, Edit, EditResource, 11),
    (EntityType::Resource, Delete, DeleteResource, 12),
    (EntityType::Comment, Add, AddComment, 13),
    (EntityType::Comment, Edit, EditComment, 14),
    (EntityType::Comment, Delete, DeleteComment, 15),
    (EntityType::User, Add, AddUser, 16),
    (EntityType::User, Edit, EditUser, 17),
    (EntityType::User, Delete, DeleteUser, 18),
];

impl ChangeAction {
    pub fn resolve(entity_type: EntityType, kind: ChangeKind) -> Option<ChangeAction> {
        ACTIONS
            .iter()
            .find(|(t, k, _, _)| *t == entity_type && *k == kind)
            .map(|(_, _, a, _)| *a)
    }

    fn row(&self) -> &'static (EntityType, ChangeKind, ChangeAction, i16) {
        ACTIONS
            .iter()
            .find(|(_, _, a, _)| a == self)
            .expect("every action is listed in ACTIONS")
    }

    pub fn entity_type(&self) -> EntityType {
        self.row().0
    }

    pub fn kind(&self) -> ChangeKind {
        self.row().1
    }

    pub fn code(&self) -> i16 {
        self.row().3
    }

    pub fn from_code(code: i16) -> Option<ChangeAction> {
        ACTIONS
            .iter()
            .find(|(_, _, _, c)| *c == code)
            .map(|(_, _, a, _)| *a)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn every_combination_resolves_to_a_distinct_action() {
        let mut seen = HashSet::new();
        for t in EntityType::ALL {
            for k in [Add, Edit, Delete] {
                let a = ChangeAction::resolve(t, k).expect("all combinations are mapped");
                assert_eq!(a.entity_type(), t);
                assert_eq!(a.kind(), k);
                assert_eq!(ChangeAction::from_code(a.code()), Some(a));
                assert!(seen.insert(a.code()), "duplicate code for {a:?}");
            }
        }
        assert_eq!(seen.len(), 18);
    }

    #[test]
    fn entity_type_parsing() {
        assert_eq!("plan".parse(), Ok(EntityType::Plan));
        assert_eq!("Topic".parse(), Ok(EntityType::Topic));
        assert_eq!("6".parse(), Ok(EntityType::User));
        assert_eq!("task".parse::<EntityType>(), Err(()));
        assert_eq!("0".parse::<EntityType>(), Err(()));
        for t in EntityType::ALL {
            assert_eq!(EntityType::from_code(t.code()), Some(t));
        }
    }
}
