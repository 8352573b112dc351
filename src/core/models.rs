use crate::utils::{FuzzkitError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Environment switch that lifts platform and feature restrictions.
pub const ALLOW_UNSUPPORTED_PLATFORMS_ENV: &str = "FUZZKIT_ALLOW_UNSUPPORTED_PLATFORMS";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildSystemKind {
    CMake,
    Bazel,
    Maven,
    Gradle,
    NodeJS,
    Other,
}

impl BuildSystemKind {
    pub const ALL: [BuildSystemKind; 6] = [
        BuildSystemKind::CMake,
        BuildSystemKind::Bazel,
        BuildSystemKind::Maven,
        BuildSystemKind::Gradle,
        BuildSystemKind::NodeJS,
        BuildSystemKind::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BuildSystemKind::CMake => "cmake",
            BuildSystemKind::Bazel => "bazel",
            BuildSystemKind::Maven => "maven",
            BuildSystemKind::Gradle => "gradle",
            BuildSystemKind::NodeJS => "nodejs",
            BuildSystemKind::Other => "other",
        }
    }

    pub fn is_jvm(&self) -> bool {
        matches!(self, BuildSystemKind::Maven | BuildSystemKind::Gradle)
    }

    /// Whether the tool drives this build system itself, so that a user
    /// supplied build command has no effect.
    pub fn has_native_build(&self) -> bool {
        !matches!(self, BuildSystemKind::Other)
    }

    pub fn default_docker_image(&self) -> &'static str {
        match self {
            BuildSystemKind::Maven | BuildSystemKind::Gradle => "eclipse-temurin:20",
            BuildSystemKind::NodeJS => "node:18",
            _ => "ubuntu:rolling",
        }
    }

    pub fn supported_names() -> String {
        Self::ALL
            .iter()
            .map(|kind| kind.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for BuildSystemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildSystemKind::CMake => "CMake",
            BuildSystemKind::Bazel => "Bazel",
            BuildSystemKind::Maven => "Maven",
            BuildSystemKind::Gradle => "Gradle",
            BuildSystemKind::NodeJS => "NodeJS",
            BuildSystemKind::Other => "Other",
        };
        f.write_str(name)
    }
}

impl FromStr for BuildSystemKind {
    type Err = FuzzkitError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| FuzzkitError::UnsupportedBuildSystem {
                name: s.to_string(),
                supported: Self::supported_names(),
            })
    }
}

/// A resolved fuzz test. Only the resolver strategies construct these.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct FuzzTestId(String);

impl FuzzTestId {
    pub(crate) fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FuzzTestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FuzzTestId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Environment variable overlay for the build and the bundled run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvOverlay {
    pub key: String,
    pub value: String,
}

/// An extra file to place in the bundle, `source` or `source;target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdditionalFile {
    pub source: PathBuf,
    pub target: PathBuf,
}

/// Everything the assembly engine needs for one invocation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleRequest {
    pub build_system: BuildSystemKind,
    pub project_dir: PathBuf,
    pub raw_fuzz_tests: Vec<String>,
    pub fuzz_tests: Vec<FuzzTestId>,
    pub build_command: Option<String>,
    pub clean_command: Option<String>,
    pub docker_image: String,
    pub env: Vec<EnvOverlay>,
    pub seed_corpus_dirs: Vec<PathBuf>,
    pub additional_files: Vec<AdditionalFile>,
    pub dictionary: Option<PathBuf>,
    pub engine_args: Vec<String>,
    #[serde(with = "duration_secs")]
    pub timeout: Option<Duration>,
    pub build_jobs: usize,
    pub output_path: PathBuf,
    pub branch: Option<String>,
    pub commit: Option<String>,
    pub build_system_args: Vec<String>,
    /// Assembly engine executable from fuzzkit.json
    #[serde(skip)]
    pub assembler: Option<String>,
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_some(&duration.as_secs()),
            None => serializer.serialize_none(),
        }
    }
}

/// What the assembly engine reports back for the whole request.
#[derive(Debug)]
pub enum ExecutionOutcome {
    Success(PathBuf),
    /// User-caused, e.g. the build command exited non-zero.
    ExpectedFailure(FuzzkitError),
    UnexpectedFailure(anyhow::Error),
}

/// The host the pipeline runs on, plus the override switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPlatform {
    pub os: String,
    pub allow_unsupported: bool,
}

impl HostPlatform {
    pub fn new(os: impl Into<String>, allow_unsupported: bool) -> Self {
        Self {
            os: os.into(),
            allow_unsupported,
        }
    }

    pub fn current() -> Self {
        let allow_unsupported = std::env::var(ALLOW_UNSUPPORTED_PLATFORMS_ENV)
            .map(|value| env_flag_enabled(&value))
            .unwrap_or(false);
        Self::new(std::env::consts::OS, allow_unsupported)
    }

    pub fn is_linux(&self) -> bool {
        self.os == "linux"
    }
}

pub(crate) fn env_flag_enabled(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && value != "0" && !value.eq_ignore_ascii_case("false")
}
