use crate::support::*;
use fuzzkit::core::init::init_project;
use fuzzkit::utils::{ConfigLoader, Console, CONFIG_FILE_NAME};
use fuzzkit::{BundleArgs, BundlePipeline, LogMode};

#[test]
fn test_init_then_bundle() {
    let project = copy_fixture("cmake-project");
    let (console, out, _err) = Console::captured();

    let config_path = init_project(project.path(), &console, false).unwrap();
    assert_eq!(config_path, project.path().join(CONFIG_FILE_NAME));
    assert!(out.contents().contains("Configuration saved in"));

    let config = ConfigLoader::load(project.path()).unwrap().unwrap();
    assert_eq!(config.build_system.as_deref(), Some("cmake"));

    // The declared build system is used from now on.
    let pipeline = BundlePipeline::new(RecordingAssembler::succeeding(), console)
        .with_platform(linux())
        .with_log_mode(LogMode::Interactive)
        .with_working_dir(project.path().join("fuzz"));
    pipeline
        .run(BundleArgs {
            fuzz_tests: vec!["parser_fuzz_test".to_string()],
            ..Default::default()
        })
        .unwrap();
    assert_eq!(pipeline.assembler().fuzz_tests(0), vec!["parser_fuzz_test"]);
}

#[test]
fn test_init_refuses_to_overwrite() {
    let project = copy_fixture("maven-project");
    write_file(project.path(), CONFIG_FILE_NAME, r#"{"dockerImage": "custom:1"}"#);
    let (console, _out, _err) = Console::captured();

    let err = init_project(project.path(), &console, false).unwrap_err();
    assert!(err.is_silent());

    let config = ConfigLoader::load(project.path()).unwrap().unwrap();
    assert_eq!(config.docker_image.as_deref(), Some("custom:1"));
}
