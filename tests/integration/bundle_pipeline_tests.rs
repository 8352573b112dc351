use crate::support::*;
use fuzzkit::core::logs::{log_dir, BUILD_DIR};
use fuzzkit::core::{BuildSystemKind, HostPlatform};
use fuzzkit::utils::Console;
use fuzzkit::{BundleArgs, BundlePipeline, FuzzkitError, LogMode};
use std::fs;
use std::path::{Path, PathBuf};

fn file_mode_pipeline(
    assembler: RecordingAssembler,
    console: Console,
    project_dir: &Path,
    platform: HostPlatform,
) -> BundlePipeline<RecordingAssembler> {
    BundlePipeline::new(assembler, console)
        .with_platform(platform)
        .with_log_mode(LogMode::File)
        .with_working_dir(project_dir)
}

fn tokens(names: &[&str]) -> BundleArgs {
    BundleArgs {
        fuzz_tests: names.iter().map(|n| n.to_string()).collect(),
        ..Default::default()
    }
}

fn other_project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "fuzzkit.json",
        r#"{"buildSystem": "other", "buildCommand": "make $FUZZ_TEST"}"#,
    );
    dir
}

#[test]
fn test_non_linux_hosts_need_the_override() {
    let cmake = copy_fixture("cmake-project");
    let other = other_project();

    for (project, args) in [(cmake.path(), tokens(&[])), (other.path(), tokens(&["my_fuzz_test"]))] {
        for os in ["macos", "windows"] {
            let (console, _out, _err) = Console::captured();
            let pipeline = file_mode_pipeline(RecordingAssembler::succeeding(), console, project, HostPlatform::new(os, false));

            let err = pipeline.run(args.clone()).unwrap_err();
            assert!(err.is_silent());
            assert!(matches!(err.root(), FuzzkitError::UnsupportedPlatform { platform, .. } if platform == os));
            assert_eq!(pipeline.assembler().calls(), 0);
            assert!(!project.join(BUILD_DIR).exists(), "rejected requests must not leave logs behind");
        }

        let (console, _out, _err) = Console::captured();
        let pipeline = file_mode_pipeline(RecordingAssembler::succeeding(), console, project, HostPlatform::new("macos", true));
        pipeline.run(args).unwrap();
        assert_eq!(pipeline.assembler().calls(), 1);
    }
}

#[test]
fn test_jvm_projects_bundle_on_any_host() {
    let project = copy_fixture("maven-project");
    let (console, _out, _err) = Console::captured();
    let pipeline = file_mode_pipeline(
        RecordingAssembler::succeeding(),
        console,
        project.path(),
        HostPlatform::new("windows", false),
    );

    pipeline.run(tokens(&[])).unwrap();
    assert_eq!(pipeline.assembler().fuzz_tests(0), vec!["com.example.ParserFuzzTest"]);
    assert_eq!(pipeline.assembler().requests.lock()[0].docker_image, "eclipse-temurin:20");
}

#[test]
fn test_cmake_bundles_every_declared_fuzz_test() {
    let project = copy_fixture("cmake-project");
    let (console, _out, _err) = Console::captured();
    let pipeline = file_mode_pipeline(RecordingAssembler::succeeding(), console, project.path(), linux());

    pipeline.run(tokens(&[])).unwrap();
    pipeline.run(tokens(&[])).unwrap();

    let expected = vec!["parser_fuzz_test", "lexer_fuzz_test", "api_fuzz_test"];
    assert_eq!(pipeline.assembler().fuzz_tests(0), expected);
    assert_eq!(pipeline.assembler().fuzz_tests(1), expected);

    let request = pipeline.assembler().requests.lock()[0].clone();
    assert_eq!(request.build_system, BuildSystemKind::CMake);
    assert!(request.raw_fuzz_tests.is_empty());
}

#[test]
fn test_cmake_named_and_duplicated_tokens() {
    let project = copy_fixture("cmake-project");
    let (console, _out, _err) = Console::captured();
    let pipeline = file_mode_pipeline(RecordingAssembler::succeeding(), console, project.path(), linux());

    pipeline
        .run(tokens(&["lexer_fuzz_test", "parser_fuzz_test", "lexer_fuzz_test"]))
        .unwrap();
    assert_eq!(pipeline.assembler().fuzz_tests(0), vec!["lexer_fuzz_test", "parser_fuzz_test"]);

    let err = pipeline.run(tokens(&["disabled_fuzz_test"])).unwrap_err();
    assert!(err.is_silent());
    assert!(matches!(err.root(), FuzzkitError::NoSuchFuzzTest(name) if name == "disabled_fuzz_test"));
    assert_eq!(pipeline.assembler().calls(), 1);
}

#[test]
fn test_other_build_system_has_no_implicit_all() {
    let project = other_project();
    let (console, _out, _err) = Console::captured();
    let pipeline = file_mode_pipeline(RecordingAssembler::succeeding(), console, project.path(), linux());

    let err = pipeline.run(tokens(&[])).unwrap_err();
    assert!(err.is_silent());
    assert!(matches!(err.root(), FuzzkitError::MissingFuzzTest(_)));
    assert_eq!(pipeline.assembler().calls(), 0);
}

#[test]
fn test_other_basename_lookup() {
    let project = other_project();
    write_file(project.path(), "build/debug/my_fuzz_test", "");
    write_file(project.path(), "build/release/my_fuzz_test", "");
    write_file(project.path(), "build/release/other_fuzz_test", "");

    let (console, _out, _err) = Console::captured();
    let pipeline = file_mode_pipeline(RecordingAssembler::succeeding(), console, project.path(), linux());

    let err = pipeline.run(tokens(&["my_fuzz_test"])).unwrap_err();
    match err.root() {
        FuzzkitError::AmbiguousFuzzTest { token, candidates } => {
            assert_eq!(token, "my_fuzz_test");
            assert_eq!(candidates.len(), 2);
        }
        other => panic!("unexpected error: {other}"),
    }

    pipeline.run(tokens(&["other_fuzz_test"])).unwrap();
    assert_eq!(pipeline.assembler().fuzz_tests(0), vec!["other_fuzz_test"]);
    let request = pipeline.assembler().requests.lock()[0].clone();
    assert_eq!(request.build_command.as_deref(), Some("make $FUZZ_TEST"));
}

#[test]
fn test_log_names_follow_the_fuzz_test_list() {
    let project = copy_fixture("cmake-project");
    let (console, _out, _err) = Console::captured();
    let pipeline = file_mode_pipeline(RecordingAssembler::succeeding(), console, project.path(), linux());

    pipeline.run(tokens(&["parser_fuzz_test"])).unwrap();
    let after_first = log_files(project.path());
    assert_eq!(after_first.len(), 2);

    // Same list again overwrites.
    pipeline.run(tokens(&["parser_fuzz_test"])).unwrap();
    assert_eq!(log_files(project.path()), after_first);

    pipeline.run(tokens(&["lexer_fuzz_test"])).unwrap();
    assert_eq!(log_files(project.path()).len(), 4);
}

fn build_log(project_dir: &Path) -> PathBuf {
    let name = log_files(project_dir)
        .into_iter()
        .find(|name| name.starts_with("build-"))
        .unwrap();
    log_dir(project_dir).join(name)
}

#[test]
fn test_expected_failure_in_file_mode_is_reported_once() {
    let project = copy_fixture("cmake-project");
    let (console, out, _err) = Console::captured();
    let pipeline = file_mode_pipeline(RecordingAssembler::failing_build(), console, project.path(), linux());

    let err = pipeline.run(tokens(&[])).unwrap_err();
    assert!(err.is_silent());
    assert!(err.is_expected());
    assert!(matches!(err.root(), FuzzkitError::Exec { code: Some(2), .. }));

    let stdout = out.contents();
    assert!(stdout.contains(&build_log(project.path()).display().to_string()));
    // The build output is replayed for the user.
    assert!(stdout.contains("Building CXX object parser_fuzz_test.o"));
    assert!(stdout.contains("warning: unused variable"));
    assert!(!stdout.contains("Successfully created bundle"));
}

#[test]
fn test_success_in_file_mode_prints_log_and_archive() {
    let project = copy_fixture("cmake-project");
    let (console, out, _err) = Console::captured();
    let pipeline = file_mode_pipeline(RecordingAssembler::succeeding(), console, project.path(), linux());

    let args = BundleArgs {
        output: Some(PathBuf::from("out/parser_bundle.tar.gz")),
        ..Default::default()
    };
    let archive = pipeline.run(args).unwrap();
    assert_eq!(archive, project.path().join("out/parser_bundle.tar.gz"));

    let stdout = out.contents();
    assert!(stdout.contains(&build_log(project.path()).display().to_string()));
    assert!(stdout.contains(&format!("Successfully created bundle: {}", archive.display())));
    // Build output stays in the log file.
    assert!(!stdout.contains("Building CXX object"));

    let log = fs::read_to_string(build_log(project.path())).unwrap();
    assert!(log.contains("Building CXX object parser_fuzz_test.o"));
    assert!(log.contains("warning: unused variable"));
}

#[test]
fn test_interactive_mode_streams_build_output() {
    let project = copy_fixture("cmake-project");
    let (console, out, err) = Console::captured();
    let pipeline = BundlePipeline::new(RecordingAssembler::succeeding(), console)
        .with_platform(linux())
        .with_log_mode(LogMode::Interactive)
        .with_working_dir(project.path());

    pipeline.run(tokens(&["api_fuzz_test"])).unwrap();

    assert!(out.contents().contains("Building CXX object parser_fuzz_test.o"));
    let archive = project.path().join("fuzz_tests.tar.gz");
    assert!(out
        .contents()
        .contains(&format!("Successfully created bundle: {}", archive.display())));
    assert!(err.contents().contains("warning: unused variable"));

    let files = log_files(project.path());
    assert_eq!(files.len(), 1);
    assert!(files[0].starts_with("bundle-api_fuzz_test-"));

    let verbose_log = fs::read_to_string(log_dir(project.path()).join(&files[0])).unwrap();
    assert!(verbose_log.contains("Building CXX object parser_fuzz_test.o"));
    assert!(verbose_log.contains("Bundling 1 fuzz test(s) for CMake"));
}

#[test]
fn test_config_file_and_cli_are_merged() {
    let project = copy_fixture("cmake-project");
    write_file(
        project.path(),
        "fuzzkit.json",
        r#"{"dockerImage": "debian:12", "env": ["FROM_CONFIG=1"], "seedCorpusDirs": ["seeds"], "timeout": "10m"}"#,
    );
    fs::create_dir_all(project.path().join("seeds")).unwrap();
    let nested = project.path().join("fuzz");

    let (console, _out, _err) = Console::captured();
    let pipeline = file_mode_pipeline(RecordingAssembler::succeeding(), console, &nested, linux());

    let args = BundleArgs {
        env: vec!["FROM_CLI=1".to_string()],
        build_jobs: Some(4),
        build_system_args: vec!["--preset=fuzzing".to_string()],
        ..Default::default()
    };
    pipeline.run(args).unwrap();

    let request = pipeline.assembler().requests.lock()[0].clone();
    assert_eq!(request.project_dir, project.path());
    assert_eq!(request.docker_image, "debian:12");
    assert_eq!(
        request.env.iter().map(|e| e.key.as_str()).collect::<Vec<_>>(),
        vec!["FROM_CONFIG", "FROM_CLI"]
    );
    assert_eq!(request.seed_corpus_dirs, vec![project.path().join("seeds")]);
    assert_eq!(request.timeout.map(|t| t.as_secs()), Some(600));
    assert_eq!(request.build_jobs, 4);
    assert_eq!(request.build_system_args, vec!["--preset=fuzzing"]);
}

#[test]
fn test_build_system_errors_are_silenced() {
    let project = tempfile::tempdir().unwrap();
    write_file(project.path(), "fuzzkit.json", r#"{"buildSystem": "meson"}"#);
    let (console, _out, _err) = Console::captured();
    let pipeline = file_mode_pipeline(RecordingAssembler::succeeding(), console, project.path(), linux());

    let err = pipeline.run(tokens(&[])).unwrap_err();
    assert!(err.is_silent());
    assert!(matches!(err.root(), FuzzkitError::UnsupportedBuildSystem { name, .. } if name == "meson"));

    let node = tempfile::tempdir().unwrap();
    write_file(node.path(), "package.json", "{}");
    write_file(node.path(), "tests/parser.fuzz.js", "");
    let (console, _out, _err) = Console::captured();
    let pipeline = file_mode_pipeline(RecordingAssembler::succeeding(), console, node.path(), linux());

    let err = pipeline.run(tokens(&[])).unwrap_err();
    assert!(matches!(err.root(), FuzzkitError::FeatureNotEnabled { .. }));

    let pipeline = pipeline.with_platform(HostPlatform::new("linux", true));
    pipeline.run(tokens(&[])).unwrap();
    assert_eq!(pipeline.assembler().fuzz_tests(0), vec!["tests/parser.fuzz.js"]);
    assert_eq!(pipeline.assembler().requests.lock()[0].docker_image, "node:18");
}

#[test]
fn test_malformed_config_is_a_config_error() {
    let project = copy_fixture("cmake-project");
    write_file(project.path(), "fuzzkit.json", "{ \"buildSystem\": ");
    let (console, _out, _err) = Console::captured();
    let pipeline = file_mode_pipeline(RecordingAssembler::succeeding(), console, project.path(), linux());

    let err = pipeline.run(tokens(&[])).unwrap_err();
    assert!(err.is_silent());
    assert!(matches!(err.root(), FuzzkitError::Config(_)));
}

#[test]
fn test_output_path_is_relative_to_the_working_dir() {
    let project = copy_fixture("cmake-project");
    write_file(project.path(), "fuzzkit.json", r#"{"buildSystem": "cmake"}"#);
    let working_dir = project.path().join("fuzz");
    let (console, out, _err) = Console::captured();
    let pipeline = BundlePipeline::new(RecordingAssembler::succeeding(), console)
        .with_platform(linux())
        .with_log_mode(LogMode::File)
        .with_working_dir(&working_dir);

    let archive = pipeline
        .run(BundleArgs {
            output: Some(PathBuf::from("parser_bundle.tar.gz")),
            ..Default::default()
        })
        .unwrap();

    // The assembler runs in the project root, so it needs the absolute path.
    assert_eq!(archive, working_dir.join("parser_bundle.tar.gz"));
    let request = pipeline.assembler().requests.lock()[0].clone();
    assert_eq!(request.project_dir, project.path());
    assert_eq!(request.output_path, archive);
    assert!(out
        .contents()
        .contains(&format!("Successfully created bundle: {}", archive.display())));
}

#[test]
fn test_configured_output_path_is_relative_to_the_project() {
    let project = copy_fixture("cmake-project");
    write_file(project.path(), "fuzzkit.json", r#"{"output": "dist/bundle.tar.gz"}"#);
    let (console, _out, _err) = Console::captured();
    let pipeline = BundlePipeline::new(RecordingAssembler::succeeding(), console)
        .with_platform(linux())
        .with_log_mode(LogMode::File)
        .with_working_dir(project.path().join("fuzz"));

    let archive = pipeline.run(BundleArgs::default()).unwrap();
    assert_eq!(archive, project.path().join("dist/bundle.tar.gz"));
}
