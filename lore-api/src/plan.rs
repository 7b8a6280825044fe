use std::fmt;

use crate::UserId;

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Plan {
    pub id: i64,
    pub title: String,
    pub owner: UserId,
    pub steps: Vec<PlanStep>,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Topic,
    Source,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StepKind::Topic => "topic",
            StepKind::Source => "source",
        })
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct PlanStep {
    pub position: i64,
    pub kind: StepKind,
    /// Id of the topic or source this step points to
    pub reference_id: i64,
}
