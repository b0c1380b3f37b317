//! Shared types for the swim analyzer: domain models, configuration,
//! timestamp handling, number formatting and the error type.

pub mod error;
pub mod formatting;
pub mod healthkit;
pub mod models;
pub mod settings;
pub mod time_utils;

pub use error::{Result, SwimError};
