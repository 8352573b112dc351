use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FuzzkitError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported build system \"{name}\". Supported build systems are: {supported}")]
    UnsupportedBuildSystem { name: String, supported: String },

    #[error("{feature} is not supported yet. Set {env_var}=1 to enable it anyway.")]
    FeatureNotEnabled { feature: String, env_var: String },

    #[error("Could not determine the build system of {dir}: {reason}")]
    IndeterminateBuildSystem { dir: PathBuf, reason: String },

    #[error("Command \"{command}\" is not supported on {platform} yet. Set {env_var}=1 to run it anyway.")]
    UnsupportedPlatform {
        command: String,
        platform: String,
        env_var: String,
    },

    #[error("No fuzz test named \"{0}\" found in the project")]
    NoSuchFuzzTest(String),

    #[error("Fuzz test \"{token}\" is ambiguous, it matches: {}", candidates.join(", "))]
    AmbiguousFuzzTest {
        token: String,
        candidates: Vec<String>,
    },

    #[error("{0}")]
    MissingFuzzTest(String),

    #[error("Invalid option: {0}")]
    InvalidOption(String),

    #[error("Failed to set up logging in {path}: {source}")]
    LogSetup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Command \"{command}\" {}", describe_exit(*code))]
    Exec { command: String, code: Option<i32> },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),

    /// Already reported to the user; outer layers must not print it again.
    #[error("{0}")]
    Silent(Box<FuzzkitError>),
}

impl FuzzkitError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn invalid_option(message: impl Into<String>) -> Self {
        Self::InvalidOption(message.into())
    }

    pub fn log_setup(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::LogSetup {
            path: path.into(),
            source,
        }
    }

    /// Wrap the error into the silent marker. Idempotent.
    pub fn silence(self) -> Self {
        match self {
            Self::Silent(_) => self,
            other => Self::Silent(Box::new(other)),
        }
    }

    pub fn is_silent(&self) -> bool {
        matches!(self, Self::Silent(_))
    }

    /// The reported error behind any silent marker.
    pub fn root(&self) -> &FuzzkitError {
        match self {
            Self::Silent(inner) => inner.root(),
            other => other,
        }
    }

    /// Failures caused by the user's configuration or environment, which are
    /// shown without internal detail.
    pub fn is_expected(&self) -> bool {
        !matches!(self.root(), Self::Internal(_) | Self::Io(_))
    }

    /// Format the error for the terminal. Only unexpected errors in verbose
    /// mode get the full cause chain.
    pub fn format_detailed(&self, verbose: bool) -> String {
        match self.root() {
            Self::Internal(err) if verbose => format!("{:?}", err),
            other => other.to_string(),
        }
    }
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with code {}", code),
        None => "was terminated by a signal".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, FuzzkitError>;

impl From<regex::Error> for FuzzkitError {
    fn from(err: regex::Error) -> Self {
        FuzzkitError::Internal(anyhow::Error::new(err).context("Invalid pattern"))
    }
}

impl From<serde_json::Error> for FuzzkitError {
    fn from(err: serde_json::Error) -> Self {
        FuzzkitError::Config(err.to_string())
    }
}
