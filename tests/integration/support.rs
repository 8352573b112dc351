use fuzzkit::core::{BundleAssembler, BundleRequest, ExecutionOutcome, HostPlatform, LogDestination};
use fuzzkit::FuzzkitError;
use parking_lot::Mutex;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Assembler double: records every request, writes a line of fake build
/// output and answers with a scripted outcome.
pub struct RecordingAssembler {
    outcome: fn(&BundleRequest) -> ExecutionOutcome,
    pub requests: Mutex<Vec<BundleRequest>>,
}

impl RecordingAssembler {
    pub fn succeeding() -> Self {
        Self::new(|request| ExecutionOutcome::Success(request.output_path.clone()))
    }

    pub fn failing_build() -> Self {
        Self::new(|_| {
            ExecutionOutcome::ExpectedFailure(FuzzkitError::Exec {
                command: "cmake --build .".to_string(),
                code: Some(2),
            })
        })
    }

    pub fn new(outcome: fn(&BundleRequest) -> ExecutionOutcome) -> Self {
        Self {
            outcome,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn fuzz_tests(&self, call: usize) -> Vec<String> {
        self.requests.lock()[call]
            .fuzz_tests
            .iter()
            .map(|id| id.as_str().to_string())
            .collect()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }
}

impl BundleAssembler for RecordingAssembler {
    fn bundle(&self, request: &BundleRequest, logs: &LogDestination) -> ExecutionOutcome {
        self.requests.lock().push(request.clone());
        let _ = writeln!(logs.stdout(), "[1/3] Building CXX object parser_fuzz_test.o");
        let _ = writeln!(logs.stderr(), "warning: unused variable 'len'");
        (self.outcome)(request)
    }
}

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

/// Copy a fixture project into a fresh temporary directory, so that runs
/// can write their logs into it.
pub fn copy_fixture(name: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    copy_dir(&fixture_path(name), dir.path());
    dir
}

fn copy_dir(from: &Path, to: &Path) {
    fs::create_dir_all(to).unwrap();
    for entry in fs::read_dir(from).unwrap() {
        let entry = entry.unwrap();
        let target = to.join(entry.file_name());
        if entry.file_type().unwrap().is_dir() {
            copy_dir(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), target).unwrap();
        }
    }
}

pub fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

pub fn linux() -> HostPlatform {
    HostPlatform::new("linux", false)
}

pub fn log_files(project_dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(fuzzkit::core::logs::log_dir(project_dir))
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
