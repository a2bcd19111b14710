pub mod conversation;
pub mod renderer;

pub use conversation::{
    ConversationController, Plan, Turn, TurnPhase, TurnUpdate, TurnUpdateKind,
};
pub use renderer::{Renderer, FAILURE_NOTICE};
