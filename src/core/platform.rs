use crate::core::models::*;
use crate::utils::{FuzzkitError, Result};

/// Fail early if bundles built on this host can't be used. Creating the
/// bundle works everywhere, but the execution environment only runs Linux
/// bundles, except for JVM projects which are OS independent.
pub fn check_platform(command: &str, kind: BuildSystemKind, platform: &HostPlatform) -> Result<()> {
    if kind.is_jvm() || platform.is_linux() || platform.allow_unsupported {
        return Ok(());
    }

    Err(FuzzkitError::UnsupportedPlatform {
        command: command.to_string(),
        platform: platform.os.clone(),
        env_var: ALLOW_UNSUPPORTED_PLATFORMS_ENV.to_string(),
    })
}
