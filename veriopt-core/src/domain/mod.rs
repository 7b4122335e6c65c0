//! Domain types for the optimizer job lifecycle

pub mod job;
pub mod result;
pub mod spec;
