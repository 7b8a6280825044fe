use crate::UserId;

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Topic {
    pub id: i64,
    pub name: String,
    pub title: String,
    pub description: String,
    pub creator: UserId,

    /// Whether this topic can itself be used as a tag on other topics
    pub is_tag: bool,
    pub tags: Vec<TopicTag>,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct TopicTag {
    pub id: i64,
    pub name: String,
}
