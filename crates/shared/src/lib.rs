//! Shared utilities and common types for the Group Trek backend.
//!
//! This crate provides functionality used across all other crates:
//! - Join code generation and format checks
//! - Common validation logic for request payloads

pub mod codes;
pub mod validation;
