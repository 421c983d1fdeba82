//! Common types and utilities shared across ArborDB.
//!
//! This module contains fundamental primitives used throughout the codebase:
//! - Configuration constants and [`DatabaseConfig`]
//! - Error types
//! - Identifiers ([`NodeId`])

pub mod config;
pub mod error;
mod node_id;

pub use config::DatabaseConfig;
pub use error::{Error, Result};
pub use node_id::NodeId;
