//! Veriopt Core
//!
//! Core types shared by the optimizer backend, its client library and the CLI.
//!
//! This crate contains:
//! - Domain types: the optimization job, its spec and result views
//! - DTOs: request/response bodies exchanged over HTTP
//! - JSON merge-patch used to fold worker updates into job records

pub mod domain;
pub mod dto;
pub mod merge;
