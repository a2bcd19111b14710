mod core;
mod events;
mod state;


pub use state::{ConversationController, Plan, Turn, TurnPhase, TurnUpdate, TurnUpdateKind};
