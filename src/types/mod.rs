pub mod event;
pub mod wire;

pub use event::{ChatEvent, Step, StepId, StepState};
pub use wire::{ChatRequest, WireRecord, WireTodo};
