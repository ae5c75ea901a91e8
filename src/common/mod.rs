//! Common utilities shared across the tiapp commands

pub mod error;
pub mod logging;

pub use error::{Error, Result};
