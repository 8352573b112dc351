use super::{call_arguments, strip_hash_comments, unique_match};
use crate::core::interfaces::ResolveStrategy;
use crate::core::models::FuzzTestId;
use crate::infrastructure::ProjectFiles;
use crate::utils::{FuzzkitError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static ADD_FUZZ_TEST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\badd_fuzz_test\s*\(").expect("valid add_fuzz_test pattern"));

/// One `add_fuzz_test(<name> <sources>...)` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct CMakeFuzzTest {
    pub name: String,
    /// Source files, relative to the project root
    pub sources: Vec<String>,
}

/// Fuzz tests declared in CMakeLists.txt files, ordered by file then position.
pub fn declared_fuzz_tests(project_dir: &Path) -> Result<Vec<CMakeFuzzTest>> {
    let mut declared = Vec::new();

    for lists_file in ProjectFiles::find_named(project_dir, "CMakeLists.txt")? {
        let content = std::fs::read_to_string(&lists_file).map_err(FuzzkitError::Io)?;
        let content = strip_hash_comments(&content);
        let lists_dir = lists_file.parent().unwrap_or(project_dir);

        for args in call_arguments(&content, &ADD_FUZZ_TEST) {
            let mut words = args
                .split_whitespace()
                .map(|w| w.trim_matches('"'))
                .filter(|w| !w.is_empty());
            let Some(name) = words.next() else { continue };

            // Sources end at the first keyword argument such as TEST_LINK_LIBRARIES.
            let sources = words
                .take_while(|w| !is_keyword(w))
                .filter(|w| !w.starts_with("${"))
                .map(|w| ProjectFiles::relative(project_dir, &lists_dir.join(w)))
                .collect();

            declared.push(CMakeFuzzTest {
                name: name.to_string(),
                sources,
            });
        }
    }

    Ok(declared)
}

fn is_keyword(word: &str) -> bool {
    word.chars().any(|c| c.is_ascii_uppercase()) && word.chars().all(|c| c.is_ascii_uppercase() || c == '_')
}

pub struct CMakeStrategy;

impl ResolveStrategy for CMakeStrategy {
    fn list_all(&self, project_dir: &Path) -> Result<Vec<FuzzTestId>> {
        Ok(declared_fuzz_tests(project_dir)?
            .into_iter()
            .map(|t| FuzzTestId::new(t.name))
            .collect())
    }

    fn resolve(&self, tokens: &[String], project_dir: &Path) -> Result<Vec<FuzzTestId>> {
        if tokens.is_empty() {
            return self.list_all(project_dir);
        }

        let declared = declared_fuzz_tests(project_dir)?;
        tokens
            .iter()
            .map(|token| {
                declared
                    .iter()
                    .find(|t| &t.name == token)
                    .map(|t| FuzzTestId::new(t.name.clone()))
                    .ok_or_else(|| FuzzkitError::NoSuchFuzzTest(token.clone()))
            })
            .collect()
    }

    fn resolve_source_files(&self, files: &[String], project_dir: &Path) -> Result<Vec<FuzzTestId>> {
        let declared = declared_fuzz_tests(project_dir)?;
        files
            .iter()
            .map(|file| {
                let wanted = ProjectFiles::relative(project_dir, &project_dir.join(file));
                unique_match(
                    file,
                    declared.iter().filter(|t| t.sources.contains(&wanted)),
                    |t| t.name.clone(),
                )
                .map(|t| FuzzTestId::new(t.name.clone()))
            })
            .collect()
    }
}
