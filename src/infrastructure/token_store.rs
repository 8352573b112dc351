use crate::core::interfaces::TokenStore;
use crate::utils::{FuzzkitError, Logger, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const TOKEN_FILE_ENV: &str = "FUZZKIT_TOKEN_FILE";

/// Access tokens kept as a JSON map from server URL to token.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$FUZZKIT_TOKEN_FILE`, else `<config dir>/fuzzkit/access_tokens.json`.
    pub fn from_env() -> Self {
        let path = std::env::var_os(TOKEN_FILE_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::config_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("fuzzkit")
                    .join("access_tokens.json")
            });
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_tokens(&self) -> Result<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        serde_json::from_str(&content).map_err(|e| {
            FuzzkitError::config(format!("Failed to parse token file {}: {}", self.path.display(), e))
        })
    }
}

impl TokenStore for FileTokenStore {
    fn get_token(&self, server: &str) -> Option<String> {
        let tokens = match self.read_tokens() {
            Ok(tokens) => tokens,
            Err(e) => {
                Logger::debug(&e.to_string());
                return None;
            }
        };
        tokens
            .get(server)
            .or_else(|| tokens.get(server.trim_end_matches('/')))
            .cloned()
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
