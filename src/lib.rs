//! Drag-and-drop reordering for workout plans.
//!
//! A plan is a flat list of exercises plus a list of groups; grouped
//! exercises are ordered inside their group, everything else shares one
//! top-level sequence with the groups themselves. [`ops::resolve`] turns a
//! pointer position into a drop target, [`ops::reorder`] applies it, and
//! [`drag::DragController`] ties both to a gesture's start, moves and drop.

pub mod cli;
pub mod drag;
pub mod io;
pub mod model;
pub mod ops;
