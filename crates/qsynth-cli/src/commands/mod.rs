//! CLI command implementations.

pub mod common;
pub mod compile;
pub mod prepare;
pub mod verify;
pub mod version;
