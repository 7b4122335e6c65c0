//! Data Transfer Objects
//!
//! Bodies exchanged between the front end, the backend and workers.
//! DTOs stay close to the wire format; domain invariants live in `domain`.

pub mod job;
pub mod llm;
