//! Fuzz test reference resolution.
//!
//! Every build system names fuzz tests differently: CMake target names,
//! Bazel labels, JVM class names, NodeJS test files, or plain executables.
//! Each dialect is one [`ResolveStrategy`], picked by [`strategy_for`].

pub mod bazel;
pub mod cmake;
pub mod jvm;
pub mod nodejs;
pub mod other;

pub use bazel::BazelStrategy;
pub use cmake::CMakeStrategy;
pub use jvm::JvmStrategy;
pub use nodejs::NodeJsStrategy;
pub use other::OtherStrategy;

use crate::core::interfaces::ResolveStrategy;
use crate::core::models::*;
use crate::utils::{FuzzkitError, Logger, Result};
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;

pub fn strategy_for(kind: BuildSystemKind) -> Box<dyn ResolveStrategy> {
    match kind {
        BuildSystemKind::CMake => Box::new(CMakeStrategy),
        BuildSystemKind::Bazel => Box::new(BazelStrategy),
        BuildSystemKind::Maven | BuildSystemKind::Gradle => Box::new(JvmStrategy),
        BuildSystemKind::NodeJS => Box::new(NodeJsStrategy),
        BuildSystemKind::Other => Box::new(OtherStrategy),
    }
}

/// Turn the user's tokens into an ordered, duplicate-free list of fuzz tests.
pub fn resolve_fuzz_tests(
    kind: BuildSystemKind,
    tokens: &[String],
    project_dir: &Path,
    source_files: bool,
) -> Result<Vec<FuzzTestId>> {
    let strategy = strategy_for(kind);
    let resolved = if source_files {
        strategy.resolve_source_files(tokens, project_dir)?
    } else {
        strategy.resolve(tokens, project_dir)?
    };

    let fuzz_tests = dedup(resolved);
    Logger::debug(&format!(
        "Resolved {} fuzz test(s): {}",
        fuzz_tests.len(),
        fuzz_tests.iter().map(FuzzTestId::as_str).collect::<Vec<_>>().join(", ")
    ));
    Ok(fuzz_tests)
}

/// Remove duplicates, keeping the first occurrence.
pub(crate) fn dedup(ids: Vec<FuzzTestId>) -> Vec<FuzzTestId> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

/// Pick the single candidate matching `token`.
pub(crate) fn unique_match<'a, T>(
    token: &str,
    candidates: impl IntoIterator<Item = &'a T>,
    describe: impl Fn(&T) -> String,
) -> Result<&'a T>
where
    T: 'a,
{
    let matches: Vec<&T> = candidates.into_iter().collect();
    match matches.len() {
        0 => Err(FuzzkitError::NoSuchFuzzTest(token.to_string())),
        1 => Ok(matches[0]),
        _ => Err(FuzzkitError::AmbiguousFuzzTest {
            token: token.to_string(),
            candidates: matches.iter().map(|m| describe(m)).collect(),
        }),
    }
}

/// Argument text of every call matched by `call` (a pattern ending in the
/// opening parenthesis), honoring nested parentheses.
pub(crate) fn call_arguments<'a>(content: &'a str, call: &Regex) -> Vec<&'a str> {
    let mut calls = Vec::new();
    for m in call.find_iter(content) {
        let start = m.end();
        let mut depth = 1usize;
        for (offset, ch) in content[start..].char_indices() {
            match ch {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        calls.push(&content[start..start + offset]);
                        break;
                    }
                }
                _ => {}
            }
        }
    }
    calls
}

/// Drop `#` comments.
pub(crate) fn strip_hash_comments(content: &str) -> String {
    content
        .lines()
        .map(|line| match line.find('#') {
            Some(idx) => &line[..idx],
            None => line,
        })
        .collect::<Vec<_>>()
        .join("\n")
}
