//! Rendered output files
//!
//! Artifacts are rendered completely in memory and only then written.
//! Files whose contents are already up to date are left untouched so that
//! their modification times do not trigger rebuilds.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use odegen_core::Result;
use tracing::{debug, info};

/// A generated file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub contents: String,
}

impl Artifact {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }

    /// Whether the file on disk differs from the rendered contents
    pub fn is_stale(&self) -> Result<bool> {
        match std::fs::read(&self.path) {
            Ok(existing) => Ok(existing != self.contents.as_bytes()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(true),
            Err(e) => Err(e.into()),
        }
    }
}

/// Outcome of writing a set of artifacts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteReport {
    pub written: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
}

/// Write every stale artifact, creating parent directories as needed
pub fn write_artifacts(artifacts: &[Artifact]) -> Result<WriteReport> {
    let mut report = WriteReport::default();
    for artifact in artifacts {
        if !artifact.is_stale()? {
            debug!("Unchanged {}", artifact.path.display());
            report.unchanged.push(artifact.path.clone());
            continue;
        }
        create_parent(&artifact.path)?;
        std::fs::write(&artifact.path, &artifact.contents)?;
        debug!("Wrote {}", artifact.path.display());
        report.written.push(artifact.path.clone());
    }
    info!(
        "{} files written, {} unchanged",
        report.written.len(),
        report.unchanged.len()
    );
    Ok(report)
}

/// Paths of artifacts that would be rewritten
pub fn stale_artifacts(artifacts: &[Artifact]) -> Result<Vec<PathBuf>> {
    let mut stale = Vec::new();
    for artifact in artifacts {
        if artifact.is_stale()? {
            stale.push(artifact.path.clone());
        }
    }
    Ok(stale)
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_if_changed() {
        let dir = TempDir::new().unwrap();
        let artifacts = vec![
            Artifact::new(dir.path().join("ts").join("api-base.d.ts"), "export {};\n"),
            Artifact::new(dir.path().join("gen.h"), "#pragma once\n"),
        ];

        let first = write_artifacts(&artifacts).unwrap();
        assert_eq!(first.written.len(), 2);
        assert!(first.unchanged.is_empty());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("ts").join("api-base.d.ts")).unwrap(),
            "export {};\n"
        );

        let second = write_artifacts(&artifacts).unwrap();
        assert!(second.written.is_empty());
        assert_eq!(second.unchanged.len(), 2);
    }

    #[test]
    fn test_stale_artifacts() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gen.h");
        std::fs::write(&path, "old").unwrap();

        let current = Artifact::new(&path, "old");
        let changed = Artifact::new(&path, "new");
        let missing = Artifact::new(dir.path().join("missing.h"), "");
        assert!(stale_artifacts(&[current]).unwrap().is_empty());
        assert_eq!(stale_artifacts(&[changed, missing.clone()]).unwrap().len(), 2);

        // Checking never writes
        assert!(!missing.path.exists());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "old");
    }
}
