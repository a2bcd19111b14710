use super::super::renderer::Renderer;
use crate::api::ChatClient;
use crate::error::TransportError;
use crate::types::{ChatEvent, Step};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Output of the stream pump task, tagged with the turn it belongs to.
#[derive(Debug)]
pub struct TurnUpdate {
    pub turn_id: u64,
    pub kind: TurnUpdateKind,
}

#[derive(Debug)]
pub enum TurnUpdateKind {
    Event(ChatEvent),
    Failed(TransportError),
    /// The body ended cleanly without a `done` record.
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Idle,
    Awaiting,
    PlanVisible,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub intent: String,
    pub steps: Vec<Step>,
}

/// One request/response cycle.
#[derive(Debug, Clone)]
pub struct Turn {
    pub id: u64,
    pub user_message: String,
    pub plan: Option<Plan>,
    /// Progress notice currently on screen, if any.
    pub status: Option<String>,
    pub finished: bool,
}

impl Turn {
    pub(super) fn new(id: u64, user_message: String) -> Self {
        Self {
            id,
            user_message,
            plan: None,
            status: None,
            finished: false,
        }
    }

    pub fn status_visible(&self) -> bool {
        self.status.is_some()
    }

    pub fn steps(&self) -> &[Step] {
        self.plan.as_ref().map_or(&[], |plan| plan.steps.as_slice())
    }
}

pub struct ConversationController<R: Renderer> {
    pub(super) client: Arc<ChatClient>,
    pub(super) renderer: R,
    pub(super) turn: Option<Turn>,
    pub(super) next_turn_id: u64,
    pub(super) update_tx: mpsc::UnboundedSender<TurnUpdate>,
    pub(super) cancel_token: Option<CancellationToken>,
    pub(super) pump_task: Option<JoinHandle<()>>,
}

impl<R: Renderer> ConversationController<R> {
    /// The receiver carries pump output; feed it back through `handle_update`.
    pub fn new(client: ChatClient, renderer: R) -> (Self, mpsc::UnboundedReceiver<TurnUpdate>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let controller = Self {
            client: Arc::new(client),
            renderer,
            turn: None,
            next_turn_id: 0,
            update_tx,
            cancel_token: None,
            pump_task: None,
        };
        (controller, update_rx)
    }

    pub fn is_busy(&self) -> bool {
        self.turn.as_ref().is_some_and(|turn| !turn.finished)
    }

    pub fn phase(&self) -> TurnPhase {
        match &self.turn {
            Some(turn) if !turn.finished => {
                if turn.plan.is_some() && turn.status.is_none() {
                    TurnPhase::PlanVisible
                } else {
                    TurnPhase::Awaiting
                }
            }
            _ => TurnPhase::Idle,
        }
    }

    /// The active turn, or the last finished one until the next `submit`.
    pub fn turn(&self) -> Option<&Turn> {
        self.turn.as_ref()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub(super) fn is_active_turn(&self, turn_id: u64) -> bool {
        self.turn
            .as_ref()
            .is_some_and(|turn| turn.id == turn_id && !turn.finished)
    }
}
