//! # huddle-core
//!
//! Core crate for the Huddle presence subsystem. Contains configuration
//! schemas, tracing initialization, and the unified error system.
//!
//! This crate has **no** internal dependencies on other Huddle crates.

pub mod config;
pub mod error;
pub mod result;
pub mod telemetry;

pub use error::AppError;
pub use result::AppResult;
