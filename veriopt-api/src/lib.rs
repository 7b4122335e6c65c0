//! Veriopt API
//!
//! Backend for the RTL optimizer demo. It accepts optimization jobs from the
//! front end, hands them to workers through an atomic queue claim, folds
//! worker callbacks into job state and relays agent prompts to an LLM.
//!
//! Layers:
//! - `api`: axum handlers and routing
//! - `service`: lifecycle rules and the LLM relay
//! - `repository`: job storage (Postgres or in-memory)

pub mod api;
pub mod config;
pub mod db;
pub mod repository;
pub mod service;
pub mod state;

pub use api::create_router;
pub use config::ApiConfig;
pub use state::AppState;
