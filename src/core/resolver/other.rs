use crate::core::interfaces::ResolveStrategy;
use crate::core::models::FuzzTestId;
use crate::infrastructure::ProjectFiles;
use crate::utils::{FuzzkitError, Logger, Result};
use std::path::Path;

/// Build systems driven by a user-supplied build command. Fuzz tests are
/// executables, named by path or by basename.
pub struct OtherStrategy;

fn is_path_like(token: &str) -> bool {
    token.contains('/') || token.contains(std::path::MAIN_SEPARATOR) || Path::new(token).is_absolute()
}

impl ResolveStrategy for OtherStrategy {
    /// There is no declaration to enumerate: the executables only exist
    /// once the build command ran.
    fn list_all(&self, _project_dir: &Path) -> Result<Vec<FuzzTestId>> {
        Ok(Vec::new())
    }

    fn resolve(&self, tokens: &[String], project_dir: &Path) -> Result<Vec<FuzzTestId>> {
        if tokens.is_empty() {
            return Err(FuzzkitError::MissingFuzzTest(
                "No fuzz test specified. For build systems of type \"other\" every fuzz test \
                 executable to bundle must be named, by path or by basename."
                    .to_string(),
            ));
        }

        tokens
            .iter()
            .map(|token| -> Result<FuzzTestId> {
                if is_path_like(token) {
                    return Ok(FuzzTestId::new(token.clone()));
                }

                let found = ProjectFiles::find_named(project_dir, token)?;
                if found.len() > 1 {
                    return Err(FuzzkitError::AmbiguousFuzzTest {
                        token: token.clone(),
                        candidates: found
                            .iter()
                            .map(|path| ProjectFiles::relative(project_dir, path))
                            .collect(),
                    });
                }
                if found.is_empty() {
                    Logger::debug(&format!("No executable named {} yet, expecting the build command to create it", token));
                }
                Ok(FuzzTestId::new(token.clone()))
            })
            .collect()
    }

    fn resolve_source_files(&self, _files: &[String], _project_dir: &Path) -> Result<Vec<FuzzTestId>> {
        Err(FuzzkitError::invalid_option(
            "--resolve is not supported for build systems of type \"other\"",
        ))
    }
}
