//! Core types: task declarations, frames, expansion and call-graph planning.

pub mod dag;
pub mod expand;
pub mod frame;
pub mod task;
pub mod types;
