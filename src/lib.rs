//! crossport: scans React Native projects for iOS-specific code and
//! suggests Android equivalents.

pub mod config;
pub mod core;
pub mod error;

pub use crate::core::{Engine, ScanRequest};
pub use error::{CrossportError, Result};
