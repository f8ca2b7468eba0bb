//! # huddle-entity
//!
//! Domain entity models for the Huddle presence subsystem. Every struct in
//! this crate represents a database table row, a broker payload, or a wire
//! message. All entities derive `Debug`, `Clone`, `Serialize`,
//! `Deserialize`, and database entities additionally derive `sqlx::FromRow`.

pub mod presence;
pub mod session;
pub mod socket;
pub mod user;
