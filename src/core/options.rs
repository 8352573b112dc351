//! Options of the bundle command, independent of the argument parser.
//!
//! `BundleArgs` is what the user typed, `BundleOptions` is that merged with
//! the project configuration, and a `BundleRequest` only comes out of
//! [`BundleOptions::into_request`] once every rule has been checked.

use crate::core::models::*;
use crate::utils::{FuzzkitError, Logger, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_OUTPUT: &str = "fuzz_tests.tar.gz";

/// Raw command-line input of the bundle command.
#[derive(Debug, Clone, Default)]
pub struct BundleArgs {
    pub project_dir: Option<PathBuf>,
    pub fuzz_tests: Vec<String>,
    /// Everything after `--`, passed verbatim to the build tool
    pub build_system_args: Vec<String>,
    pub resolve_source_files: bool,
    pub build_command: Option<String>,
    pub clean_command: Option<String>,
    pub docker_image: Option<String>,
    pub env: Vec<String>,
    pub seed_corpus_dirs: Vec<PathBuf>,
    pub additional_files: Vec<String>,
    pub dict: Option<PathBuf>,
    pub engine_args: Vec<String>,
    pub timeout: Option<String>,
    pub build_jobs: Option<usize>,
    pub output: Option<PathBuf>,
    pub branch: Option<String>,
    pub commit: Option<String>,
}

/// Command-line input merged with fuzzkit.json, not yet validated.
#[derive(Debug, Clone)]
pub struct BundleOptions {
    pub project_dir: PathBuf,
    pub build_system: Option<String>,
    pub fuzz_tests: Vec<String>,
    pub build_system_args: Vec<String>,
    pub resolve_source_files: bool,
    pub build_command: Option<String>,
    pub clean_command: Option<String>,
    pub docker_image: Option<String>,
    pub env: Vec<String>,
    pub seed_corpus_dirs: Vec<PathBuf>,
    pub additional_files: Vec<String>,
    pub dict: Option<PathBuf>,
    pub engine_args: Vec<String>,
    pub timeout: Option<String>,
    pub build_jobs: Option<usize>,
    pub output: Option<PathBuf>,
    pub branch: Option<String>,
    pub commit: Option<String>,
    pub assembler: Option<String>,
}

impl BundleOptions {
    /// Validate the options and fill in defaults.
    pub fn into_request(self, kind: BuildSystemKind, fuzz_tests: Vec<FuzzTestId>) -> Result<BundleRequest> {
        let build_command = non_empty(self.build_command);
        if kind == BuildSystemKind::Other && build_command.is_none() {
            return Err(FuzzkitError::invalid_option(
                "Flag \"build-command\" must be set when using build system type \"other\"",
            ));
        }
        if kind.has_native_build() && build_command.is_some() {
            Logger::warn(&format!("The build command is ignored for {} projects", kind));
        }

        let timeout = self.timeout.as_deref().map(parse_duration).transpose()?;
        if timeout == Some(Duration::ZERO) {
            return Err(FuzzkitError::invalid_option("timeout must be greater than zero"));
        }

        let build_jobs = self.build_jobs.unwrap_or_else(num_cpus::get);
        if build_jobs == 0 {
            return Err(FuzzkitError::invalid_option("number of build jobs must be at least 1"));
        }

        let project_dir = self.project_dir;

        let mut seed_corpus_dirs = Vec::with_capacity(self.seed_corpus_dirs.len());
        for dir in self.seed_corpus_dirs {
            let dir = resolve_path(&project_dir, &dir);
            if !dir.is_dir() {
                return Err(FuzzkitError::invalid_option(format!(
                    "seed corpus directory {} does not exist",
                    dir.display()
                )));
            }
            seed_corpus_dirs.push(dir);
        }

        let dictionary = match self.dict {
            Some(dict) => {
                let dict = resolve_path(&project_dir, &dict);
                if !dict.is_file() {
                    return Err(FuzzkitError::invalid_option(format!(
                        "dictionary {} does not exist",
                        dict.display()
                    )));
                }
                Some(dict)
            }
            None => None,
        };

        let additional_files = self
            .additional_files
            .iter()
            .map(|entry| parse_additional_file(entry, &project_dir))
            .collect::<Result<Vec<_>>>()?;

        let mut env = Vec::with_capacity(self.env.len());
        for entry in &self.env {
            if let Some(overlay) = parse_env_overlay(entry)? {
                env.push(overlay);
            }
        }

        let output_path = resolve_path(
            &project_dir,
            self.output.as_deref().unwrap_or(Path::new(DEFAULT_OUTPUT)),
        );

        Ok(BundleRequest {
            build_system: kind,
            project_dir,
            raw_fuzz_tests: self.fuzz_tests,
            fuzz_tests,
            build_command,
            clean_command: non_empty(self.clean_command),
            docker_image: non_empty(self.docker_image)
                .unwrap_or_else(|| kind.default_docker_image().to_string()),
            env,
            seed_corpus_dirs,
            additional_files,
            dictionary,
            engine_args: self.engine_args,
            timeout,
            build_jobs,
            output_path,
            branch: non_empty(self.branch),
            commit: non_empty(self.commit),
            build_system_args: self.build_system_args,
            assembler: non_empty(self.assembler),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn resolve_path(project_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_dir.join(path)
    }
}

/// Parse `90`, `90s`, `5m` or `2h`.
pub fn parse_duration(value: &str) -> Result<Duration> {
    let value = value.trim();
    let invalid = || FuzzkitError::invalid_option(format!("invalid duration \"{}\"", value));

    let (digits, multiplier) = match value.char_indices().last() {
        Some((idx, 's')) => (&value[..idx], 1),
        Some((idx, 'm')) => (&value[..idx], 60),
        Some((idx, 'h')) => (&value[..idx], 3600),
        Some(_) => (value, 1),
        None => return Err(invalid()),
    };

    let amount: u64 = digits.trim().parse().map_err(|_| invalid())?;
    amount
        .checked_mul(multiplier)
        .map(Duration::from_secs)
        .ok_or_else(invalid)
}

fn parse_additional_file(entry: &str, project_dir: &Path) -> Result<AdditionalFile> {
    let (source, target) = match entry.split_once(';') {
        Some((source, target)) => (source.trim(), target.trim()),
        None => (entry.trim(), ""),
    };
    if source.is_empty() {
        return Err(FuzzkitError::invalid_option(format!("invalid additional file \"{}\"", entry)));
    }

    let source_path = resolve_path(project_dir, Path::new(source));
    if !source_path.exists() {
        return Err(FuzzkitError::invalid_option(format!(
            "additional file {} does not exist",
            source_path.display()
        )));
    }

    let target = if target.is_empty() {
        // Keep the path relative to the project where possible.
        Path::new(source)
            .strip_prefix(project_dir)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| {
                Path::new(source)
                    .file_name()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(source))
            })
    } else {
        PathBuf::from(target)
    };

    Ok(AdditionalFile {
        source: source_path,
        target,
    })
}

fn parse_env_overlay(entry: &str) -> Result<Option<EnvOverlay>> {
    let (key, value) = match entry.split_once('=') {
        Some((key, value)) => (key.trim(), Some(value.to_string())),
        None => (entry.trim(), None),
    };
    if key.is_empty() {
        return Err(FuzzkitError::invalid_option(format!(
            "invalid environment variable \"{}\", expected KEY=VALUE or KEY",
            entry
        )));
    }

    let value = match value {
        Some(value) => value,
        None => match std::env::var(key) {
            Ok(value) => value,
            Err(_) => {
                Logger::warn(&format!("Environment variable {} is not set, skipping it", key));
                return Ok(None);
            }
        },
    };

    Ok(Some(EnvOverlay {
        key: key.to_string(),
        value,
    }))
}
