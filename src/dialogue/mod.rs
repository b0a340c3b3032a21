//! The `/add_marks` conversation: a linear five-step form whose sessions are
//! kept per chat until the entry is stored or cancelled.

pub mod controller;
pub mod state;

pub use controller::{DialogueController, Reply};
pub use state::{DialogueStep, MarksState, Transition};
