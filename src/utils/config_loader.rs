use crate::core::options::{BundleArgs, BundleOptions};
use crate::utils::{FuzzkitError, Logger, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "fuzzkit.json";

/// Project configuration file format (fuzzkit.json)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProjectConfig {
    /// Build system of the project; detected from marker files when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_system: Option<String>,

    /// Command building one fuzz test, required for other build systems
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_command: Option<String>,

    /// Command run once before the fuzz tests are built
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clean_command: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_image: Option<String>,

    /// KEY=VALUE or KEY entries
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub seed_corpus_dirs: Vec<PathBuf>,

    /// source or source;target entries
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_files: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dict: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub engine_args: Vec<String>,

    /// Maximum run time of one fuzz test, e.g. "30m"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_jobs: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,

    /// Executable of the archive-assembly engine
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assembler: Option<String>,
}

/// Config loader that supports config files with CLI override
pub struct ConfigLoader;

impl ConfigLoader {
    /// Walk upwards from `start` to the first directory containing fuzzkit.json.
    pub fn find_project_dir(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .find(|dir| dir.join(CONFIG_FILE_NAME).is_file())
            .map(Path::to_path_buf)
    }

    /// Load the project configuration, `None` when the project has none.
    pub fn load(project_dir: &Path) -> Result<Option<ProjectConfig>> {
        let config_path = project_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            Logger::debug(&format!("No {} found in {}, using defaults", CONFIG_FILE_NAME, project_dir.display()));
            return Ok(None);
        }

        Logger::debug(&format!("Loading config from {}", config_path.display()));

        let content = std::fs::read_to_string(&config_path).map_err(|e| {
            FuzzkitError::config(format!("Failed to read {}: {}", config_path.display(), e))
        })?;

        let config: ProjectConfig = serde_json::from_str(&content).map_err(|e| {
            FuzzkitError::config(format!("Failed to parse {}: {}", config_path.display(), e))
        })?;

        Ok(Some(config))
    }

    /// Merge file config with CLI arguments (CLI takes precedence, lists are
    /// concatenated with the config entries first)
    pub fn merge_with_cli(file_config: Option<ProjectConfig>, args: BundleArgs, project_dir: PathBuf) -> BundleOptions {
        let base = file_config.unwrap_or_default();
        // Paths in fuzzkit.json are relative to the project.
        let output = args.output.or_else(|| base.output.map(|output| project_dir.join(output)));

        BundleOptions {
            project_dir,
            build_system: base.build_system,
            fuzz_tests: args.fuzz_tests,
            build_system_args: args.build_system_args,
            resolve_source_files: args.resolve_source_files,
            build_command: args.build_command.or(base.build_command),
            clean_command: args.clean_command.or(base.clean_command),
            docker_image: args.docker_image.or(base.docker_image),
            env: concat(base.env, args.env),
            seed_corpus_dirs: concat(base.seed_corpus_dirs, args.seed_corpus_dirs),
            additional_files: concat(base.additional_files, args.additional_files),
            dict: args.dict.or(base.dict),
            engine_args: concat(base.engine_args, args.engine_args),
            timeout: args.timeout.or(base.timeout),
            build_jobs: args.build_jobs.or(base.build_jobs),
            output,
            branch: args.branch.or(base.branch),
            commit: args.commit.or(base.commit),
            assembler: base.assembler,
        }
    }

    /// Starter config written by `fuzzkit init`
    pub fn generate_example(build_system: &str) -> String {
        let example = ProjectConfig {
            build_system: Some(build_system.to_string()),
            ..Default::default()
        };
        serde_json::to_string_pretty(&example)
            .unwrap_or_else(|_| format!("{{\n  \"buildSystem\": \"{}\"\n}}", build_system))
    }
}

fn concat<T>(mut first: Vec<T>, second: Vec<T>) -> Vec<T> {
    first.extend(second);
    first
}
