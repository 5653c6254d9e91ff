//! Workspace file access used by the project orchestration.

use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Text access relative to a project root.
pub trait Workspace {
    /// `Ok(None)` when the file does not exist.
    fn read_text(&self, path: &str) -> Result<Option<String>>;

    fn write_text(&self, path: &str, text: &str) -> Result<()>;

    /// Files matching `pattern`, relative to the root, `/`-separated and sorted.
    fn glob_files(&self, pattern: &str) -> Result<Vec<String>>;
}

pub struct FsWorkspace {
    root: PathBuf,
}

impl FsWorkspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsWorkspace { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }
}

impl Workspace for FsWorkspace {
    fn read_text(&self, path: &str) -> Result<Option<String>> {
        let full = self.root.join(path);
        match fs::read_to_string(&full) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", full.display())),
        }
    }

    fn write_text(&self, path: &str, text: &str) -> Result<()> {
        let full = self.root.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&full, text).with_context(|| format!("Failed to write {}", full.display()))
    }

    fn glob_files(&self, pattern: &str) -> Result<Vec<String>> {
        let root = glob::Pattern::escape(&self.root.to_string_lossy());
        let full_pattern = format!("{}/{}", root.trim_end_matches(['/', '\\']), pattern);
        let mut files = Vec::new();
        for entry in glob::glob(&full_pattern)
            .with_context(|| format!("Invalid glob pattern {pattern}"))?
        {
            let path = entry?;
            if path.is_file() {
                files.push(self.relative(&path));
            }
        }
        files.sort();
        files.dedup();
        Ok(files)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_read_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let ws = FsWorkspace::new(dir.path());
        assert_eq!(ws.read_text("Makefile").unwrap(), None);
    }

    #[test]
    fn test_write_creates_parents_and_reads_back() {
        let dir = TempDir::new().unwrap();
        let ws = FsWorkspace::new(dir.path());
        ws.write_text("build/out/STM32Make.make", "TARGET = x\n").unwrap();
        assert_eq!(
            ws.read_text("build/out/STM32Make.make").unwrap().as_deref(),
            Some("TARGET = x\n")
        );
    }

    #[test]
    fn test_glob_files_relative_and_sorted() {
        let dir = TempDir::new().unwrap();
        let ws = FsWorkspace::new(dir.path());
        ws.write_text("Core/Src/main.c", "").unwrap();
        ws.write_text("Core/Src/gpio.c", "").unwrap();
        ws.write_text("Core/Inc/main.h", "").unwrap();
        fs::create_dir_all(dir.path().join("Core/Src/empty.c")).unwrap();

        let files = ws.glob_files("Core/**/*.c").unwrap();
        assert_eq!(files, vec!["Core/Src/gpio.c", "Core/Src/main.c"]);
        assert_eq!(ws.glob_files("Core/**/*").unwrap().len(), 3);
    }

    #[test]
    fn test_invalid_glob_pattern() {
        let dir = TempDir::new().unwrap();
        let ws = FsWorkspace::new(dir.path());
        assert!(ws.glob_files("Core/***/[").is_err());
    }
}
