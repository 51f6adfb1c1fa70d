//! # SonicShare Common Library
//!
//! Shared code for the SonicShare crates:
//! - Error type
//! - Configuration loading and root folder resolution
//! - Logging bootstrap
//! - Timestamp utilities

pub mod config;
pub mod error;
pub mod logging;
pub mod time;

pub use error::{Error, Result};
