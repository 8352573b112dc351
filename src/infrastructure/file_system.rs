use crate::utils::{FuzzkitError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Recursive, order-stable listing of project files.
pub struct ProjectFiles;

impl ProjectFiles {
    /// All files under `root` accepted by `filter`, sorted by path. Hidden
    /// directories (including the build and log directory) are skipped.
    pub fn find(root: &Path, filter: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>> {
        let mut found = Vec::new();
        Self::walk(root, &filter, &mut found)?;
        found.sort();
        Ok(found)
    }

    /// Files under `root` whose file name equals `name`.
    pub fn find_named(root: &Path, name: &str) -> Result<Vec<PathBuf>> {
        Self::find(root, |path| path.file_name().and_then(|n| n.to_str()) == Some(name))
    }

    fn walk(dir: &Path, filter: &impl Fn(&Path) -> bool, found: &mut Vec<PathBuf>) -> Result<()> {
        let entries = fs::read_dir(dir).map_err(|e| {
            FuzzkitError::Internal(anyhow::Error::new(e).context(format!("Failed to read directory {}", dir.display())))
        })?;

        for entry in entries {
            let entry = entry.map_err(FuzzkitError::Io)?;
            let path = entry.path();
            let file_type = entry.file_type().map_err(FuzzkitError::Io)?;

            if file_type.is_dir() {
                if is_hidden(&path) {
                    continue;
                }
                Self::walk(&path, filter, found)?;
            } else if filter(&path) {
                found.push(path);
            }
        }

        Ok(())
    }

    /// `path` relative to `root`, with forward slashes.
    pub fn relative(root: &Path, path: &Path) -> String {
        let relative = path.strip_prefix(root).unwrap_or(path);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}
