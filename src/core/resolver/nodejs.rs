use super::unique_match;
use crate::core::interfaces::ResolveStrategy;
use crate::core::models::FuzzTestId;
use crate::infrastructure::ProjectFiles;
use crate::utils::{FuzzkitError, Result};
use std::path::Path;

const FUZZ_TEST_SUFFIXES: &[&str] = &[".fuzz.js", ".fuzz.ts"];

fn fuzz_test_stem(file_name: &str) -> Option<&str> {
    FUZZ_TEST_SUFFIXES
        .iter()
        .find_map(|suffix| file_name.strip_suffix(suffix))
}

/// Project-relative paths of `*.fuzz.js` / `*.fuzz.ts` files.
pub fn list_fuzz_test_files(project_dir: &Path) -> Result<Vec<String>> {
    let files = ProjectFiles::find(project_dir, |path| {
        let in_node_modules = path.components().any(|c| c.as_os_str() == "node_modules");
        let is_fuzz_test = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(fuzz_test_stem)
            .is_some();
        is_fuzz_test && !in_node_modules
    })?;

    Ok(files
        .iter()
        .map(|path| ProjectFiles::relative(project_dir, path))
        .collect())
}

pub struct NodeJsStrategy;

impl ResolveStrategy for NodeJsStrategy {
    fn list_all(&self, project_dir: &Path) -> Result<Vec<FuzzTestId>> {
        Ok(list_fuzz_test_files(project_dir)?
            .into_iter()
            .map(FuzzTestId::new)
            .collect())
    }

    fn resolve(&self, tokens: &[String], project_dir: &Path) -> Result<Vec<FuzzTestId>> {
        if tokens.is_empty() {
            return self.list_all(project_dir);
        }

        let files = list_fuzz_test_files(project_dir)?;
        tokens
            .iter()
            .map(|token| -> Result<FuzzTestId> {
                let wanted = ProjectFiles::relative(project_dir, &project_dir.join(token));
                let matched = if files.contains(&wanted) {
                    unique_match(token, files.iter().filter(|f| **f == wanted), String::clone)?
                } else {
                    unique_match(
                        token,
                        files.iter().filter(|f| {
                            let file_name = f.rsplit('/').next().unwrap_or(f);
                            fuzz_test_stem(file_name) == Some(token.as_str())
                        }),
                        String::clone,
                    )?
                };
                Ok(FuzzTestId::new(matched.clone()))
            })
            .collect()
    }

    fn resolve_source_files(&self, _files: &[String], _project_dir: &Path) -> Result<Vec<FuzzTestId>> {
        Err(FuzzkitError::invalid_option(
            "--resolve is not supported for NodeJS projects, pass the fuzz test file instead",
        ))
    }
}
