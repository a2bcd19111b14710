use super::super::renderer::Renderer;
use super::{ConversationController, Plan};
use crate::error::TransportError;
use crate::types::{ChatEvent, Step, StepState};

impl<R: Renderer> ConversationController<R> {
    /// Apply one decoded event to the active turn. Ignored when idle.
    pub fn apply_event(&mut self, event: ChatEvent) {
        let Some(turn) = self.turn.as_mut().filter(|turn| !turn.finished) else {
            tracing::debug!(?event, "no active turn; ignoring event");
            return;
        };

        match event {
            ChatEvent::Status { message } => {
                if turn.status.is_some() {
                    self.renderer.clear_status();
                }
                self.renderer.show_status(&message);
                turn.status = Some(message);
            }
            ChatEvent::PlanAnnounced { intent, steps } => {
                if turn.status.take().is_some() {
                    self.renderer.clear_status();
                }
                if turn.plan.is_some() {
                    tracing::debug!(turn_id = turn.id, "plan announced twice; replacing");
                }
                let steps: Vec<Step> = steps
                    .into_iter()
                    .map(|step| Step {
                        state: StepState::Pending,
                        ..step
                    })
                    .collect();
                self.renderer.show_plan(&intent, &steps);
                turn.plan = Some(Plan { intent, steps });
            }
            ChatEvent::StepUpdate { step_id, state } => {
                let step = turn
                    .plan
                    .as_mut()
                    .and_then(|plan| plan.steps.iter_mut().find(|step| step.id == step_id));
                match step {
                    Some(step) => {
                        step.state = state;
                        self.renderer.update_step(&step_id, state);
                    }
                    None => tracing::debug!(%step_id, "update for unknown step ignored"),
                }
            }
            ChatEvent::Reply { content } => {
                self.renderer.show_assistant_message(&content);
            }
            ChatEvent::StreamEnd => self.finish_turn(),
        }
    }

    /// Terminal transport failure: retire the status, post the fixed notice,
    /// return to idle.
    pub fn on_transport_failure(&mut self, error: &TransportError) {
        let Some(turn) = self.turn.as_mut().filter(|turn| !turn.finished) else {
            return;
        };
        tracing::warn!(turn_id = turn.id, %error, "turn failed");
        if turn.status.take().is_some() {
            self.renderer.clear_status();
        }
        self.renderer.show_failure_notice();
        self.finish_turn();
    }
}
