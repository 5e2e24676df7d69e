//! odegen Parser
//!
//! Pattern-driven parsing of annotated C API headers into a flat list of
//! namespace-annotated entities.
//!
//! ## Modules
//!
//! - `sanitize` - Line continuations, comment-aware splitting, doc comments
//! - `declarator` - Declarator, argument and literal helpers
//! - `grammar` - Ordered declaration rules compiled for a dialect
//! - `header` - Top-level and struct-body parsing
//! - `pointer_usage` - Types used behind pointers in the API
//! - `direction` - Argument direction classification
//! - `enum_prefix` - Shortened enum value names
//! - `parallel` - Parallel multi-header parsing using rayon

pub mod cursor;
pub mod declarator;
pub mod direction;
pub mod enum_prefix;
pub mod grammar;
pub mod header;
pub mod parallel;
pub mod pointer_usage;
pub mod sanitize;

pub use direction::{ArgDirection, ArgumentType, DirectionClassifier};
pub use enum_prefix::{common_enum_prefix_len, stripped_value_name};
pub use header::HeaderParser;
pub use parallel::ParallelParser;
pub use pointer_usage::PointerUsage;

use odegen_core::Entity;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Entities extracted from one header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedHeader {
    pub path: PathBuf,
    pub entities: Vec<Entity>,
    /// Types used behind pointers in this header's functions
    pub pointer_usage: PointerUsage,
}

impl ParsedHeader {
    /// File name without extension, e.g. `logic-api`
    pub fn stem(&self) -> &str {
        header_stem(&self.path)
    }
}

/// File name of a path without extension
pub fn header_stem(path: &Path) -> &str {
    path.file_stem().and_then(|s| s.to_str()).unwrap_or("header")
}

/// Pointer usage across several headers
pub fn combined_pointer_usage(headers: &[ParsedHeader]) -> PointerUsage {
    let mut usage = PointerUsage::default();
    for header in headers {
        usage.extend(&header.pointer_usage);
    }
    usage
}
