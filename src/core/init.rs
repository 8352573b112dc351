//! `fuzzkit init`: set up a project with a starter fuzzkit.json.

use crate::core::classifier::detect_build_system;
use crate::core::models::*;
use crate::core::pipeline::report;
use crate::utils::{ConfigLoader, Console, FuzzkitError, Logger, Result, CONFIG_FILE_NAME};
use std::path::{Path, PathBuf};

pub const PRERELEASE_ENV: &str = "FUZZKIT_PRERELEASE";

pub const GRADLE_MULTI_PROJECT_WARNING: &str =
    "For multi-project builds, you should set up fuzzkit in the subprojects containing the fuzz tests.";

const CMAKE_INSTRUCTIONS: &str = r#"Enable fuzz testing in your CMake project by adding the following lines
to the top-level CMakeLists.txt, before any add_subdirectory(...),
add_library(...) or add_executable(...) calls:

    find_package(cifuzz NO_SYSTEM_ENVIRONMENT_PATH)
    enable_fuzz_testing()

Fuzz tests are declared with add_fuzz_test(<name> <sources>...)."#;

const BAZEL_INSTRUCTIONS: &str = r#"Add rules_fuzzing to your MODULE.bazel or WORKSPACE and declare fuzz
tests with the cc_fuzz_test rule:

    load("@rules_fuzzing//fuzzing:cc_defs.bzl", "cc_fuzz_test")

    cc_fuzz_test(
        name = "my_fuzz_test",
        srcs = ["my_fuzz_test.cpp"],
    )"#;

const MAVEN_INSTRUCTIONS: &str = r#"Add the Jazzer JUnit dependency to your pom.xml:

    <dependency>
      <groupId>com.code-intelligence</groupId>
      <artifactId>jazzer-junit</artifactId>
      <scope>test</scope>
    </dependency>

Fuzz tests are methods annotated with @FuzzTest below src/test/java."#;

const GRADLE_GROOVY_INSTRUCTIONS: &str = r#"Add the Jazzer JUnit dependency to your build.gradle:

    dependencies {
        testImplementation "com.code-intelligence:jazzer-junit"
    }

Fuzz tests are methods annotated with @FuzzTest below src/test/java."#;

const GRADLE_KOTLIN_INSTRUCTIONS: &str = r#"Add the Jazzer JUnit dependency to your build.gradle.kts:

    dependencies {
        testImplementation("com.code-intelligence:jazzer-junit")
    }

Fuzz tests are methods annotated with @FuzzTest below src/test/kotlin."#;

const NODEJS_INSTRUCTIONS: &str = r#"Add Jazzer.js to your development dependencies:

    npm install --save-dev @jazzer.js/jest-runner

Fuzz tests live in *.fuzz.js or *.fuzz.ts files."#;

const OTHER_INSTRUCTIONS: &str = r#"Set "buildCommand" in fuzzkit.json to the command building your fuzz
tests. It is run once per fuzz test with FUZZ_TEST set to the fuzz test's
name."#;

fn is_kotlin_gradle(dir: &Path) -> bool {
    dir.join("build.gradle.kts").is_file()
}

/// A Gradle build that includes subprojects in its settings file.
pub fn is_gradle_multi_project(dir: &Path) -> bool {
    ["settings.gradle", "settings.gradle.kts"].iter().any(|name| {
        std::fs::read_to_string(dir.join(name))
            .map(|content| content.lines().any(|line| line.trim_start().starts_with("include")))
            .unwrap_or(false)
    })
}

/// Setup instructions for a build system.
pub fn instructions(kind: BuildSystemKind, dir: &Path) -> &'static str {
    match kind {
        BuildSystemKind::CMake => CMAKE_INSTRUCTIONS,
        BuildSystemKind::Bazel => BAZEL_INSTRUCTIONS,
        BuildSystemKind::Maven => MAVEN_INSTRUCTIONS,
        BuildSystemKind::Gradle if is_kotlin_gradle(dir) => GRADLE_KOTLIN_INSTRUCTIONS,
        BuildSystemKind::Gradle => GRADLE_GROOVY_INSTRUCTIONS,
        BuildSystemKind::NodeJS => NODEJS_INSTRUCTIONS,
        BuildSystemKind::Other => OTHER_INSTRUCTIONS,
    }
}

/// Detect the build system of `dir`, print how to integrate with it and
/// write a starter config. Returns the config path.
pub fn init_project(dir: &Path, console: &Console, prerelease: bool) -> Result<PathBuf> {
    let kind = detect_build_system(dir).map_err(report)?;

    if kind == BuildSystemKind::NodeJS && !prerelease {
        return Err(report(FuzzkitError::FeatureNotEnabled {
            feature: "NodeJS projects".to_string(),
            env_var: PRERELEASE_ENV.to_string(),
        }));
    }

    if kind == BuildSystemKind::Gradle && is_gradle_multi_project(dir) {
        Logger::warn(GRADLE_MULTI_PROJECT_WARNING);
    }
    console.print(instructions(kind, dir));

    let config_path = dir.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        Logger::warn(&format!("Config already exists in {}", config_path.display()));
        return Err(FuzzkitError::config(format!("{} already exists", config_path.display())).silence());
    }

    Logger::debug(&format!("Creating config file in directory: {}", dir.display()));
    std::fs::write(&config_path, ConfigLoader::generate_example(kind.as_str()))?;

    console.success(&format!("Configuration saved in {}", config_path.display()));
    console.print("\nUse 'fuzzkit bundle' to build your fuzz tests and create a bundle.");
    Ok(config_path)
}
