use anyhow::Context;
use lore_api::{Comment, EntityType, Plan, PlanStep, Topic, TopicTag, User};

use super::{diff_list, diff_text, diff_value, Element, ElementChange};

/// An entity kind whose revisions can be audited
pub trait Diffable {
    type Diff: serde::Serialize;

    const ENTITY_TYPE: EntityType;

    fn diff(before: &Self, after: &Self) -> Self::Diff;
}

/// Before and after state of one edit
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Change<T> {
    pub before: T,
    pub after: T,
}

/// An edit of any auditable entity kind
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Revision {
    Plan(Change<Plan>),
    Topic(Change<Topic>),
    Comment(Change<Comment>),
    User(Change<User>),
}

impl Revision {
    pub fn entity_type(&self) -> EntityType {
        match self {
            Revision::Plan(_) => Plan::ENTITY_TYPE,
            Revision::Topic(_) => Topic::ENTITY_TYPE,
            Revision::Comment(_) => Comment::ENTITY_TYPE,
            Revision::User(_) => User::ENTITY_TYPE,
        }
    }

    /// Computes the diff and serializes it for storage in the audit trail
    pub fn serialized_diff(&self) -> anyhow::Result<String> {
        fn ser<T: Diffable>(c: &Change<T>) -> anyhow::Result<String> {
            serde_json::to_string(&T::diff(&c.before, &c.after))
                .with_context(|| format!("serializing {} diff", T::ENTITY_TYPE))
        }
        match self {
            Revision::Plan(c) => ser(c),
            Revision::Topic(c) => ser(c),
            Revision::Comment(c) => ser(c),
            Revision::User(c) => ser(c),
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct PlanDiff {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub owner: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<ElementChange>,
}

impl Element for PlanStep {
    // position is what the steps get sorted on, so it is not an attribute
    fn attributes(&self) -> Vec<(&'static str, String)> {
        vec![
            ("kind", self.kind.to_string()),
            ("reference_id", self.reference_id.to_string()),
        ]
    }
}

fn sorted_steps(p: &Plan) -> Vec<PlanStep> {
    let mut steps = p.steps.clone();
    steps.sort_by_key(|s| s.position);
    steps
}

impl Diffable for Plan {
    type Diff = PlanDiff;

    const ENTITY_TYPE: EntityType = EntityType::Plan;

    fn diff(before: &Plan, after: &Plan) -> PlanDiff {
        PlanDiff {
            title: diff_text(&before.title, &after.title),
            owner: diff_text(&before.owner.to_string(), &after.owner.to_string()),
            steps: diff_list(&sorted_steps(before), &sorted_steps(after)),
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct TopicDiff {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub creator: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub is_tag: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<ElementChange>,
}

impl Element for TopicTag {
    fn attributes(&self) -> Vec<(&'static str, String)> {
        vec![("name", self.name.clone()), ("id", self.id.to_string())]
    }
}

fn sorted_tags(t: &Topic) -> Vec<TopicTag> {
    let mut tags = t.tags.clone();
    tags.sort_by(|a, b| a.name.cmp(&b.name));
    tags
}

impl Diffable for Topic {
    type Diff = TopicDiff;

    const ENTITY_TYPE: EntityType = EntityType::Topic;

    fn diff(before: &Topic, after: &Topic) -> TopicDiff {
        TopicDiff {
            name: diff_text(&before.name, &after.name),
            title: diff_text(&before.title, &after.title),
            description: diff_text(&before.description, &after.description),
            creator: diff_text(&before.creator.to_string(), &after.creator.to_string()),
            is_tag: diff_value(&before.is_tag, &after.is_tag),
            tags: diff_list(&sorted_tags(before), &sorted_tags(after)),
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CommentDiff {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub deleted: String,
}

impl Diffable for Comment {
    type Diff = CommentDiff;

    const ENTITY_TYPE: EntityType = EntityType::Comment;

    fn diff(before: &Comment, after: &Comment) -> CommentDiff {
        CommentDiff {
            text: diff_text(&before.text, &after.text),
            title: diff_text(&before.title, &after.title),
            deleted: diff_value(&before.deleted, &after.deleted),
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct UserDiff {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub img: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub rights: String,
}

impl Diffable for User {
    type Diff = UserDiff;

    const ENTITY_TYPE: EntityType = EntityType::User;

    fn diff(before: &User, after: &User) -> UserDiff {
        UserDiff {
            name: diff_text(&before.name, &after.name),
            email: diff_text(&before.email, &after.email),
            img: diff_text(&before.img, &after.img),
            rights: diff_value(&before.rights, &after.rights),
        }
    }
}
