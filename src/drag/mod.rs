pub mod controller;

pub use controller::{DragController, DragError, DragPhase, DragSession, DropOutcome, DropResult};
