//! Core library for adjutant — foundational types, configuration, the
//! SQLite connection helper shared by the store crates, atomic JSON
//! file persistence, and the daemon lockfile.

pub mod cache;
pub mod config;
pub mod event_bus;
pub mod json_store;
pub mod lockfile;
pub mod types;
