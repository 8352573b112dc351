use crate::core::logs::LogDestination;
use crate::core::models::*;
use crate::utils::Result;
use std::path::Path;

/// Dialect-specific fuzz test resolution
pub trait ResolveStrategy: Send + Sync {
    /// Every fuzz test declared in the project, in a stable order.
    fn list_all(&self, project_dir: &Path) -> Result<Vec<FuzzTestId>>;

    /// Resolve the user's tokens. An empty token list means "all fuzz tests"
    /// unless the dialect says otherwise.
    fn resolve(&self, tokens: &[String], project_dir: &Path) -> Result<Vec<FuzzTestId>>;

    /// Map source files to the fuzz tests defined in them.
    fn resolve_source_files(&self, files: &[String], project_dir: &Path) -> Result<Vec<FuzzTestId>>;
}

/// The archive-assembly engine. May run for a long time and may invoke
/// build tools, writing their output to `logs`.
pub trait BundleAssembler {
    fn bundle(&self, request: &BundleRequest, logs: &LogDestination) -> ExecutionOutcome;
}

/// Access token persistence for the remote API.
pub trait TokenStore {
    /// The stored token for `server`, if any.
    fn get_token(&self, server: &str) -> Option<String>;

    fn location(&self) -> String;
}

/// The remote API, reduced to what the auth flow needs.
pub trait ApiClient {
    fn check_valid_token(&self, token: &str) -> anyhow::Result<()>;
}
