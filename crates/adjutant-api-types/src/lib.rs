//! Shared API response types for auto-tundra services.
//!
//! This crate provides common type definitions used across multiple services
//! to ensure consistency in API responses and reduce code duplication.

