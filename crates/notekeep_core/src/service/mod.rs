//! Use-case services.
//!
//! # Responsibility
//! - Orchestrate repository, lock manager and editor into edit sessions.
//! - Keep the CLI layer free of locking and temp-file details.

pub mod edit_service;
