use super::event::{ChatEvent, Step, StepId, StepState};
use serde::{Deserialize, Serialize};

/// Body of `POST /chat/stream`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
}

/// One `data:` record as the backend serialises it.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireRecord {
    Status {
        message: String,
    },
    TodoList {
        #[serde(default)]
        user_intent: String,
        todos: Vec<WireTodo>,
    },
    TodoUpdate {
        id: StepId,
        status: StepState,
    },
    Reply {
        content: String,
    },
    Done,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireTodo {
    pub id: StepId,
    pub task: String,
}

impl WireRecord {
    /// `None` for record types this client does not know about.
    pub fn into_event(self) -> Option<ChatEvent> {
        let event = match self {
            WireRecord::Status { message } => ChatEvent::Status { message },
            WireRecord::TodoList { user_intent, todos } => ChatEvent::PlanAnnounced {
                intent: user_intent,
                steps: todos
                    .into_iter()
                    .map(|todo| Step::pending(todo.id, todo.task))
                    .collect(),
            },
            WireRecord::TodoUpdate { id, status } => ChatEvent::StepUpdate {
                step_id: id,
                state: status,
            },
            WireRecord::Reply { content } => ChatEvent::Reply { content },
            WireRecord::Done => ChatEvent::StreamEnd,
            WireRecord::Unknown => return None,
        };
        Some(event)
    }
}
