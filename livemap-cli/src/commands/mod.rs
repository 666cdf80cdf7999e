//! Command implementations for the `livemap` binary.

pub mod catalog;
mod common;
pub mod replay;
