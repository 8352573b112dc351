use crate::core::interfaces::{ApiClient, TokenStore};
use crate::utils::{FuzzkitError, Logger, Result};

/// Whether the user is authenticated with `server`. A missing token is not
/// an error; a token the server rejects is.
pub fn auth_status(server: &str, tokens: &dyn TokenStore, api: &dyn ApiClient) -> Result<bool> {
    let Some(token) = tokens.get_token(server).filter(|t| !t.is_empty()) else {
        Logger::debug(&format!("No access token stored for {}", server));
        return Ok(false);
    };

    if let Err(err) = api.check_valid_token(&token) {
        Logger::warn(&format!(
            "Failed to authenticate with the configured API access token.\n\
             It's possible that the token has been revoked. Please try again after\n\
             removing the token from {}.",
            tokens.location()
        ));
        return Err(FuzzkitError::Internal(err.context(format!("checking access token for {}", server))));
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapStore(HashMap<String, String>);

    impl TokenStore for MapStore {
        fn get_token(&self, server: &str) -> Option<String> {
            self.0.get(server).cloned()
        }

        fn location(&self) -> String {
            "/home/user/.config/fuzzkit/access_tokens.json".to_string()
        }
    }

    struct FakeApi {
        valid: &'static str,
    }

    impl ApiClient for FakeApi {
        fn check_valid_token(&self, token: &str) -> anyhow::Result<()> {
            if token == self.valid {
                Ok(())
            } else {
                anyhow::bail!("401 Unauthorized")
            }
        }
    }

    fn store(token: &str) -> MapStore {
        MapStore(HashMap::from([("https://app.example.com".to_string(), token.to_string())]))
    }

    #[test]
    fn test_no_token_is_unauthenticated() {
        let api = FakeApi { valid: "secret" };
        assert!(!auth_status("https://app.example.com", &MapStore(HashMap::new()), &api).unwrap());
        assert!(!auth_status("https://app.example.com", &store(""), &api).unwrap());
    }

    #[test]
    fn test_valid_and_revoked_tokens() {
        let api = FakeApi { valid: "secret" };
        assert!(auth_status("https://app.example.com", &store("secret"), &api).unwrap());

        let err = auth_status("https://app.example.com", &store("revoked"), &api).unwrap_err();
        assert!(!err.is_expected());
        assert!(err.format_detailed(true).contains("401 Unauthorized"));
    }
}
