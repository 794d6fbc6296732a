//! Shared error helpers used across the relay crates.

pub mod error;

pub use error::FromMessage;
