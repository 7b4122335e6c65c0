//! Service Module
//!
//! Business logic layer for the backend.
//! Services sit between the HTTP handlers and the job store and hold the
//! lifecycle rules.

pub mod job;
pub mod llm;

// Re-export for convenience
pub use job as job_service;
pub use llm as llm_service;
