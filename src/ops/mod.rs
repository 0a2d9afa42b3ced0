pub mod check;
pub mod preview;
pub mod reorder;
pub mod resolve;
