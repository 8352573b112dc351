use super::unique_match;
use crate::core::interfaces::ResolveStrategy;
use crate::core::models::FuzzTestId;
use crate::infrastructure::ProjectFiles;
use crate::utils::{FuzzkitError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

const TEST_SOURCE_ROOTS: &[&str] = &["src/test/java", "src/test/kotlin"];
const LEGACY_ENTRY_POINT: &str = "fuzzerTestOneInput";

static FUZZ_TEST_METHOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"@FuzzTest(?:\s*\([^)]*\))?\s+(?:@\w+(?:\s*\([^)]*\))?\s+)*(?:(?:public|protected|private|internal|static|final|open)\s+)*(?:void\s+|fun\s+)(\w+)\s*\(",
    )
    .expect("valid fuzz test method pattern")
});

/// A JVM fuzz test class and the file declaring it.
#[derive(Debug, Clone, PartialEq)]
pub struct JvmFuzzTest {
    pub class_name: String,
    pub path: PathBuf,
}

impl JvmFuzzTest {
    fn simple_name(&self) -> &str {
        self.class_name.rsplit('.').next().unwrap_or(&self.class_name)
    }
}

fn is_jvm_source(path: &Path) -> bool {
    matches!(path.extension().and_then(|e| e.to_str()), Some("java") | Some("kt"))
}

/// Fully-qualified class name of a test source file, if it lies under one
/// of the test source roots.
fn class_name_for(project_dir: &Path, path: &Path) -> Option<String> {
    TEST_SOURCE_ROOTS.iter().find_map(|root| {
        let relative = path.strip_prefix(project_dir.join(root)).ok()?;
        let without_ext = relative.with_extension("");
        let parts: Vec<String> = without_ext
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(parts.join("."))
    })
}

fn is_fuzz_test_source(content: &str) -> bool {
    content.contains("@FuzzTest") || content.contains(LEGACY_ENTRY_POINT)
}

/// Fuzz test classes under src/test/{java,kotlin}, sorted by class name.
pub fn list_jvm_fuzz_tests(project_dir: &Path) -> Result<Vec<JvmFuzzTest>> {
    let mut tests = Vec::new();

    for root in TEST_SOURCE_ROOTS {
        let root_dir = project_dir.join(root);
        if !root_dir.is_dir() {
            continue;
        }
        for path in ProjectFiles::find(&root_dir, is_jvm_source)? {
            let content = std::fs::read_to_string(&path).map_err(FuzzkitError::Io)?;
            if !is_fuzz_test_source(&content) {
                continue;
            }
            if let Some(class_name) = class_name_for(project_dir, &path) {
                tests.push(JvmFuzzTest { class_name, path });
            }
        }
    }

    tests.sort_by(|a, b| a.class_name.cmp(&b.class_name));
    Ok(tests)
}

/// Like [`list_jvm_fuzz_tests`], restricted to classes in `package_prefix`.
pub fn list_jvm_fuzz_tests_with_filter(project_dir: &Path, package_prefix: &str) -> Result<Vec<JvmFuzzTest>> {
    Ok(list_jvm_fuzz_tests(project_dir)?
        .into_iter()
        .filter(|t| t.class_name.starts_with(package_prefix))
        .collect())
}

/// Names of the fuzz test methods in a JVM source file.
pub fn target_methods(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(FuzzkitError::Io)?;

    let methods: Vec<String> = FUZZ_TEST_METHOD
        .captures_iter(&content)
        .map(|c| c[1].to_string())
        .collect();
    if !methods.is_empty() {
        return Ok(methods);
    }

    if content.contains(LEGACY_ENTRY_POINT) {
        return Ok(vec![LEGACY_ENTRY_POINT.to_string()]);
    }
    Ok(Vec::new())
}

/// Maven and Gradle projects
pub struct JvmStrategy;

impl ResolveStrategy for JvmStrategy {
    fn list_all(&self, project_dir: &Path) -> Result<Vec<FuzzTestId>> {
        Ok(list_jvm_fuzz_tests(project_dir)?
            .into_iter()
            .map(|t| FuzzTestId::new(t.class_name))
            .collect())
    }

    fn resolve(&self, tokens: &[String], project_dir: &Path) -> Result<Vec<FuzzTestId>> {
        if tokens.is_empty() {
            return self.list_all(project_dir);
        }

        let tests = list_jvm_fuzz_tests(project_dir)?;
        tokens
            .iter()
            .map(|token| -> Result<FuzzTestId> {
                let (class_part, method) = match token.split_once("::") {
                    Some((class_part, method)) => (class_part, Some(method)),
                    None => (token.as_str(), None),
                };

                let test = if class_part.contains('.') {
                    unique_match(token, tests.iter().filter(|t| t.class_name == class_part), |t| t.class_name.clone())?
                } else {
                    unique_match(token, tests.iter().filter(|t| t.simple_name() == class_part), |t| {
                        t.class_name.clone()
                    })?
                };

                match method {
                    None => Ok(FuzzTestId::new(test.class_name.clone())),
                    Some(method) => {
                        if !target_methods(&test.path)?.iter().any(|m| m == method) {
                            return Err(FuzzkitError::NoSuchFuzzTest(token.clone()));
                        }
                        Ok(FuzzTestId::new(format!("{}::{}", test.class_name, method)))
                    }
                }
            })
            .collect()
    }

    fn resolve_source_files(&self, files: &[String], project_dir: &Path) -> Result<Vec<FuzzTestId>> {
        let tests = list_jvm_fuzz_tests(project_dir)?;
        files
            .iter()
            .map(|file| {
                let path = project_dir.join(file);
                tests
                    .iter()
                    .find(|t| t.path == path)
                    .map(|t| FuzzTestId::new(t.class_name.clone()))
                    .ok_or_else(|| FuzzkitError::NoSuchFuzzTest(file.clone()))
            })
            .collect()
    }
}
