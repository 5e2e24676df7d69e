//! odegen Core
//!
//! Core types and interfaces for the odegen binding generator: the
//! intermediate representation produced by the header parser, the shared
//! error type and the generator configuration.

pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, Dialect, OutputConfig};
pub use error::{Error, Result};
pub use types::*;
