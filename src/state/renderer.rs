use crate::types::{Step, StepId, StepState};

/// Fixed text appended to the transcript when a turn's transport fails.
pub const FAILURE_NOTICE: &str =
    "Sorry, the connection to the server failed. Please make sure the backend service is running.";

/// Presentation collaborator notified by the controller after every change.
pub trait Renderer {
    fn show_user_message(&mut self, text: &str);
    /// Show (or replace) the single progress notice.
    fn show_status(&mut self, text: &str);
    fn clear_status(&mut self);
    fn show_plan(&mut self, intent: &str, steps: &[Step]);
    fn update_step(&mut self, id: &StepId, state: StepState);
    fn show_assistant_message(&mut self, text: &str);
    fn show_failure_notice(&mut self);
    /// A new turn is starting; drop any plan shown for the previous one.
    fn clear_plan(&mut self) {}
    /// The turn is over; stop any spinner still running.
    fn turn_finished(&mut self) {}
}
