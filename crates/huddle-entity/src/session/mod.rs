//! Session domain entities.

pub mod token;

pub use token::{AccessTokenResponse, TokenPair};
