//! # Copydesk Common Library
//!
//! Shared code for the copydesk services:
//! - Error types
//! - Event types (CopydeskEvent enum) and the broadcast EventBus
//! - Configuration loading and data directory resolution

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
