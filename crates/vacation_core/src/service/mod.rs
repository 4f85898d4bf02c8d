//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls and commit boundaries into use-case APIs.
//! - Keep CLI/web layers decoupled from persistence details.

pub mod user_service;
