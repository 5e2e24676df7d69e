//! Parallel header parsing using rayon
//!
//! Parses many headers at once while keeping results in input order, and
//! expands header directories into their `.h` files.

use crate::header::HeaderParser;
use crate::ParsedHeader;
use odegen_core::{Error, Result};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Progress callback type
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

/// Progress event for tracking parsing progress
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub phase: ProgressPhase,
    pub current: usize,
    pub total: usize,
    pub message: String,
}

/// Parsing phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressPhase {
    Scanning,
    Parsing,
    Complete,
}

/// Parses headers in parallel with a shared parser
pub struct ParallelParser {
    parser: Arc<HeaderParser>,
    progress_callback: Option<Arc<ProgressCallback>>,
}

impl ParallelParser {
    /// Create a new parallel parser
    pub fn new(parser: HeaderParser) -> Self {
        Self {
            parser: Arc::new(parser),
            progress_callback: None,
        }
    }

    /// Set progress callback
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressEvent) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(Box::new(callback)));
        self
    }

    /// Parse multiple headers in parallel. Results keep the order of `paths`.
    pub fn parse_files(&self, paths: &[PathBuf]) -> Vec<(PathBuf, Result<ParsedHeader>)> {
        let total = paths.len();
        let processed = AtomicUsize::new(0);

        self.emit_progress(ProgressPhase::Parsing, 0, total, "Starting parallel parse...");

        let results: Vec<_> = paths
            .par_iter()
            .map(|path| {
                debug!("Parsing {:?}", path);
                let result = self.parser.parse_file(path);

                let current = processed.fetch_add(1, Ordering::SeqCst) + 1;
                self.emit_progress(
                    ProgressPhase::Parsing,
                    current,
                    total,
                    format!("Parsed {}/{} headers", current, total),
                );

                (path.clone(), result)
            })
            .collect();

        self.emit_progress(ProgressPhase::Complete, total, total, "Parsing complete");
        results
    }

    /// Parse all headers, failing on the first header that cannot be read
    pub fn parse_all(&self, paths: &[PathBuf]) -> Result<Vec<ParsedHeader>> {
        self.parse_files(paths)
            .into_iter()
            .map(|(_, result)| result)
            .collect()
    }

    /// Expand inputs into header files.
    ///
    /// Files are taken as given; directories are walked recursively for
    /// `.h` files, which are added in sorted order.
    pub fn collect_headers(&self, inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
        self.emit_progress(ProgressPhase::Scanning, 0, 0, "Scanning inputs...");

        let mut headers = Vec::new();
        for input in inputs {
            if input.is_dir() {
                headers.extend(headers_in_directory(input));
            } else if input.is_file() {
                headers.push(input.clone());
            } else {
                return Err(Error::FileNotFound(input.display().to_string()));
            }
        }

        info!("Found {} headers", headers.len());
        self.emit_progress(
            ProgressPhase::Scanning,
            headers.len(),
            headers.len(),
            format!("Found {} headers", headers.len()),
        );
        Ok(headers)
    }

    fn emit_progress<S: Into<String>>(&self, phase: ProgressPhase, current: usize, total: usize, message: S) {
        if let Some(ref callback) = self.progress_callback {
            callback(ProgressEvent {
                phase,
                current,
                total,
                message: message.into(),
            });
        }
    }
}

fn headers_in_directory(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().and_then(|ext| ext.to_str()) == Some("h"))
        .map(|e| e.path().to_path_buf())
        .collect()
}
