use crate::core::models::*;
use crate::utils::{FuzzkitError, Logger, Result};
use std::path::Path;

const BAZEL_MARKERS: &[&str] = &["MODULE.bazel", "WORKSPACE", "WORKSPACE.bazel"];
const CMAKE_MARKERS: &[&str] = &["CMakeLists.txt"];
const MAVEN_MARKERS: &[&str] = &["pom.xml"];
const GRADLE_MARKERS: &[&str] = &["build.gradle", "build.gradle.kts"];
const NODEJS_MARKERS: &[&str] = &["package.json"];

/// Probe `project_dir` for build-system marker files.
pub fn detect_build_system(project_dir: &Path) -> Result<BuildSystemKind> {
    let has_any = |markers: &[&str]| markers.iter().any(|m| project_dir.join(m).is_file());

    let is_maven = has_any(MAVEN_MARKERS);
    let is_gradle = has_any(GRADLE_MARKERS);
    if is_maven && is_gradle {
        return Err(FuzzkitError::IndeterminateBuildSystem {
            dir: project_dir.to_path_buf(),
            reason: "found both pom.xml and a Gradle build file".to_string(),
        });
    }

    let kind = if has_any(BAZEL_MARKERS) {
        BuildSystemKind::Bazel
    } else if has_any(CMAKE_MARKERS) {
        BuildSystemKind::CMake
    } else if is_maven {
        BuildSystemKind::Maven
    } else if is_gradle {
        BuildSystemKind::Gradle
    } else if has_any(NODEJS_MARKERS) {
        BuildSystemKind::NodeJS
    } else {
        BuildSystemKind::Other
    };

    Logger::debug(&format!("Detected build system {} in {}", kind, project_dir.display()));
    Ok(kind)
}

/// Determine the build system for a command run and check that it may be
/// used. `declared` comes from the project configuration.
pub fn classify(
    project_dir: &Path,
    declared: Option<&str>,
    command: &str,
    platform: &HostPlatform,
) -> Result<BuildSystemKind> {
    let kind = match declared {
        Some(name) if !name.trim().is_empty() => name.parse::<BuildSystemKind>()?,
        _ => detect_build_system(project_dir)?,
    };

    if kind == BuildSystemKind::NodeJS && !platform.allow_unsupported {
        return Err(FuzzkitError::FeatureNotEnabled {
            feature: format!("\"{}\" for {} projects", command, kind),
            env_var: ALLOW_UNSUPPORTED_PLATFORMS_ENV.to_string(),
        });
    }

    Ok(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), "").unwrap();
    }

    #[test]
    fn test_detect_markers() {
        let cases = [
            ("CMakeLists.txt", BuildSystemKind::CMake),
            ("WORKSPACE", BuildSystemKind::Bazel),
            ("MODULE.bazel", BuildSystemKind::Bazel),
            ("pom.xml", BuildSystemKind::Maven),
            ("build.gradle.kts", BuildSystemKind::Gradle),
            ("package.json", BuildSystemKind::NodeJS),
            ("Makefile", BuildSystemKind::Other),
        ];

        for (marker, expected) in cases {
            let dir = tempdir().unwrap();
            touch(dir.path(), marker);
            assert_eq!(detect_build_system(dir.path()).unwrap(), expected, "marker {}", marker);
        }
    }

    #[test]
    fn test_maven_and_gradle_is_indeterminate() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "pom.xml");
        touch(dir.path(), "build.gradle");

        let err = detect_build_system(dir.path()).unwrap_err();
        assert!(matches!(err, FuzzkitError::IndeterminateBuildSystem { .. }));
    }

    #[test]
    fn test_declared_build_system_wins() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "CMakeLists.txt");
        let platform = HostPlatform::new("linux", false);

        let kind = classify(dir.path(), Some("Other"), "bundle", &platform).unwrap();
        assert_eq!(kind, BuildSystemKind::Other);

        let err = classify(dir.path(), Some("scons"), "bundle", &platform).unwrap_err();
        assert!(matches!(err, FuzzkitError::UnsupportedBuildSystem { .. }));
    }

    #[test]
    fn test_nodejs_requires_override() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "package.json");

        let err = classify(dir.path(), None, "bundle", &HostPlatform::new("linux", false)).unwrap_err();
        assert!(matches!(err, FuzzkitError::FeatureNotEnabled { .. }));

        let kind = classify(dir.path(), None, "bundle", &HostPlatform::new("linux", true)).unwrap();
        assert_eq!(kind, BuildSystemKind::NodeJS);
    }
}
