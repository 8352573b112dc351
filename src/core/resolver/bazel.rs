use super::{call_arguments, strip_hash_comments, unique_match};
use crate::core::interfaces::ResolveStrategy;
use crate::core::models::FuzzTestId;
use crate::infrastructure::ProjectFiles;
use crate::utils::{FuzzkitError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static CC_FUZZ_TEST: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bcc_fuzz_test\s*\(").expect("valid rule pattern"));
static NAME_ATTR: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\bname\s*=\s*"([^"]+)""#).expect("valid name pattern"));
static SRCS_ATTR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bsrcs\s*=\s*\[([^\]]*)\]").expect("valid srcs pattern"));
static STRING_LITERAL: Lazy<Regex> = Lazy::new(|| Regex::new(r#""([^"]*)""#).expect("valid string pattern"));

#[derive(Debug, Clone, PartialEq)]
pub struct BazelTarget {
    pub package: String,
    pub name: String,
    /// Source files, relative to the workspace root
    pub srcs: Vec<String>,
}

impl BazelTarget {
    pub fn label(&self) -> String {
        format!("//{}:{}", self.package, self.name)
    }
}

/// `cc_fuzz_test` rules in BUILD and BUILD.bazel files.
pub fn declared_targets(project_dir: &Path) -> Result<Vec<BazelTarget>> {
    let build_files = ProjectFiles::find(project_dir, |path| {
        matches!(path.file_name().and_then(|n| n.to_str()), Some("BUILD") | Some("BUILD.bazel"))
    })?;

    let mut targets = Vec::new();
    for build_file in build_files {
        let package_dir = build_file.parent().unwrap_or(project_dir);
        let package = ProjectFiles::relative(project_dir, package_dir);
        let content = strip_hash_comments(&std::fs::read_to_string(&build_file).map_err(FuzzkitError::Io)?);

        for args in call_arguments(&content, &CC_FUZZ_TEST) {
            let Some(name) = NAME_ATTR.captures(args).map(|c| c[1].to_string()) else {
                continue;
            };
            let srcs = SRCS_ATTR
                .captures(args)
                .map(|c| {
                    STRING_LITERAL
                        .captures_iter(&c[1])
                        .map(|s| ProjectFiles::relative(project_dir, &package_dir.join(&s[1])))
                        .collect()
                })
                .unwrap_or_default();

            targets.push(BazelTarget {
                package: package.clone(),
                name,
                srcs,
            });
        }
    }

    Ok(targets)
}

/// Expand `//pkg`, `pkg:name` and `:name` into absolute labels. Bare names
/// are returned as `None`.
pub fn canonical_label(token: &str) -> Option<String> {
    if let Some(rest) = token.strip_prefix("//") {
        if rest.contains(':') {
            return Some(token.to_string());
        }
        let name = rest.rsplit('/').next().unwrap_or(rest);
        return Some(format!("//{}:{}", rest, name));
    }
    if token.starts_with('@') {
        return Some(token.to_string());
    }
    if let Some(name) = token.strip_prefix(':') {
        return Some(format!("//:{}", name));
    }
    if token.contains(':') {
        return Some(format!("//{}", token));
    }
    None
}

pub struct BazelStrategy;

impl ResolveStrategy for BazelStrategy {
    fn list_all(&self, project_dir: &Path) -> Result<Vec<FuzzTestId>> {
        Ok(declared_targets(project_dir)?
            .iter()
            .map(|t| FuzzTestId::new(t.label()))
            .collect())
    }

    fn resolve(&self, tokens: &[String], project_dir: &Path) -> Result<Vec<FuzzTestId>> {
        if tokens.is_empty() {
            return self.list_all(project_dir);
        }

        let targets = declared_targets(project_dir)?;
        tokens
            .iter()
            .map(|token| -> Result<FuzzTestId> {
                let target = match canonical_label(token) {
                    Some(label) => unique_match(token, targets.iter().filter(|t| t.label() == label), BazelTarget::label)?,
                    None => unique_match(token, targets.iter().filter(|t| &t.name == token), BazelTarget::label)?,
                };
                Ok(FuzzTestId::new(target.label()))
            })
            .collect()
    }

    fn resolve_source_files(&self, files: &[String], project_dir: &Path) -> Result<Vec<FuzzTestId>> {
        let targets = declared_targets(project_dir)?;
        files
            .iter()
            .map(|file| {
                let wanted = ProjectFiles::relative(project_dir, &project_dir.join(file));
                unique_match(file, targets.iter().filter(|t| t.srcs.contains(&wanted)), BazelTarget::label)
                    .map(|t| FuzzTestId::new(t.label()))
            })
            .collect()
    }
}
