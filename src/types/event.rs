use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a plan step, unique within one turn.
///
/// The backend sends integers; string ids are accepted so a service that
/// switches to opaque ids keeps working.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepId {
    Number(i64),
    Text(String),
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepId::Number(n) => write!(f, "{n}"),
            StepId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for StepId {
    fn from(value: i64) -> Self {
        StepId::Number(value)
    }
}

impl From<i32> for StepId {
    fn from(value: i32) -> Self {
        StepId::Number(i64::from(value))
    }
}

impl From<&str> for StepId {
    fn from(value: &str) -> Self {
        StepId::Text(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    Pending,
    Running,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub id: StepId,
    pub description: String,
    pub state: StepState,
}

impl Step {
    pub fn pending(id: impl Into<StepId>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            state: StepState::Pending,
        }
    }
}

/// Application-level event reconstructed from the response stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// Informational progress notice.
    Status { message: String },
    /// The assistant's plan for this turn; every step starts `Pending`.
    PlanAnnounced { intent: String, steps: Vec<Step> },
    /// State change of a previously announced step.
    StepUpdate { step_id: StepId, state: StepState },
    /// A finished assistant utterance.
    Reply { content: String },
    /// Terminal marker; nothing follows for this turn.
    StreamEnd,
}
