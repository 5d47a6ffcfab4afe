//! Diagnostic report files.
//!
//! When `<project>/.claude/diagnostic_mode` exists, pipeline stages write
//! free-text reports to `<project>/.claude/diagnostic/`. Write failures are
//! logged and otherwise ignored.

use std::fs;
use std::path::{Path, PathBuf};

/// Name of the flag file enabling diagnostic mode.
pub const DIAGNOSTIC_FLAG_FILE: &str = "diagnostic_mode";

/// Name of the directory receiving diagnostic reports.
pub const DIAGNOSTIC_DIR: &str = "diagnostic";

/// Writes timestamped diagnostic reports into one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticWriter {
    dir: PathBuf,
}

impl DiagnosticWriter {
    /// Creates a writer targeting `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns a writer if diagnostic mode is enabled for `claude_dir`.
    ///
    /// `claude_dir` is the project's `.claude` directory.
    #[must_use]
    pub fn from_claude_dir(claude_dir: &Path) -> Option<Self> {
        claude_dir
            .join(DIAGNOSTIC_FLAG_FILE)
            .exists()
            .then(|| Self::new(claude_dir.join(DIAGNOSTIC_DIR)))
    }

    /// Returns the output directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `content` to `<dir>/<YYYYmmdd_HHMMSS>_<name>.txt`.
    ///
    /// Returns the written path, or `None` if writing failed.
    pub fn write(&self, name: &str, content: &str) -> Option<PathBuf> {
        if let Err(e) = fs::create_dir_all(&self.dir) {
            tracing::warn!(dir = %self.dir.display(), error = %e, "Cannot create diagnostic directory");
            return None;
        }

        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let name = sanitize(name);
        let mut path = self.dir.join(format!("{stamp}_{name}.txt"));
        let mut attempt = 1;
        while path.exists() {
            attempt += 1;
            path = self.dir.join(format!("{stamp}_{name}_{attempt}.txt"));
        }

        match fs::write(&path, content) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "Wrote diagnostic report");
                Some(path)
            },
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Cannot write diagnostic report");
                None
            },
        }
    }
}

fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "report".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_disabled_without_flag() {
        let dir = TempDir::new().unwrap();
        assert!(DiagnosticWriter::from_claude_dir(dir.path()).is_none());
    }

    #[test]
    fn test_writes_timestamped_reports() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(DIAGNOSTIC_FLAG_FILE), "").unwrap();
        let writer = DiagnosticWriter::from_claude_dir(dir.path()).unwrap();
        assert_eq!(writer.dir(), dir.path().join(DIAGNOSTIC_DIR));

        let first = writer.write("curator batch", "one").unwrap();
        let second = writer.write("curator batch", "two").unwrap();
        assert_ne!(first, second);

        let file_name = first.file_name().unwrap().to_string_lossy().into_owned();
        assert!(file_name.ends_with("_curator_batch.txt"));
        assert_eq!(file_name.find('_'), Some(8));
        assert_eq!(fs::read_to_string(second).unwrap(), "two");
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("../etc/passwd"), "___etc_passwd");
        assert_eq!(sanitize(""), "report");
        assert_eq!(sanitize("dedup-merge"), "dedup-merge");
    }
}
