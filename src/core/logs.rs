//! Log destinations for one bundle run.
//!
//! Every run gets a verbose log (all diagnostics, always) and, in file mode,
//! a build log that takes the build tools' output instead of the terminal.
//! Both file names derive from the fuzz test list so that re-running the
//! same set overwrites the previous logs.

use crate::core::models::FuzzTestId;
use crate::utils::{Console, FanOutWriter, FuzzkitError, Result, SharedSink};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const BUILD_DIR: &str = ".fuzzkit-build";
pub const LOG_DIR: &str = "logs";

const MAX_NAMED_TESTS: usize = 3;
const MAX_READABLE_LEN: usize = 80;

/// Where the build tools' output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    /// Build output goes to a log file, the terminal shows a spinner.
    File,
    /// Build output goes to the terminal.
    Interactive,
}

impl LogMode {
    /// File mode for interactive terminals unless the user asked for verbose output.
    pub fn detect(verbose: bool, console: &Console) -> Self {
        if !verbose && console.is_interactive() {
            LogMode::File
        } else {
            LogMode::Interactive
        }
    }
}

pub fn log_dir(project_dir: &Path) -> PathBuf {
    project_dir.join(BUILD_DIR).join(LOG_DIR)
}

/// Filesystem-safe log name suffix for a fuzz test list. Equal lists give
/// equal suffixes; the hash keeps different lists apart even when their
/// readable parts collide.
pub fn log_suffix(fuzz_tests: &[FuzzTestId]) -> String {
    let mut readable = if fuzz_tests.is_empty() {
        "all".to_string()
    } else {
        let named: Vec<String> = fuzz_tests
            .iter()
            .take(MAX_NAMED_TESTS)
            .map(|id| sanitize(id.as_str()))
            .collect();
        let mut readable = named.join("_");
        if fuzz_tests.len() > MAX_NAMED_TESTS {
            readable.push_str(&format!("_and_{}_more", fuzz_tests.len() - MAX_NAMED_TESTS));
        }
        readable
    };
    if readable.len() > MAX_READABLE_LEN {
        readable.truncate(MAX_READABLE_LEN);
    }

    let mut hasher = blake3::Hasher::new();
    for id in fuzz_tests {
        hasher.update(id.as_str().as_bytes());
        hasher.update(&[0]);
    }
    let hash = hasher.finalize().to_hex();

    format!("{}-{}", readable, &hash[..12])
}

fn sanitize(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
        .collect();
    sanitized.trim_matches('_').to_string()
}

/// Writers for the build tools plus the run's log files. Passed explicitly
/// through the pipeline; nothing here is process-global.
#[derive(Debug)]
pub struct LogDestination {
    mode: LogMode,
    stdout: FanOutWriter,
    stderr: FanOutWriter,
    verbose_log: SharedSink,
    verbose_log_path: PathBuf,
    build_log_path: Option<PathBuf>,
}

impl LogDestination {
    /// Create the log directory and open (truncating) the log files.
    pub fn open(project_dir: &Path, fuzz_tests: &[FuzzTestId], mode: LogMode, console: &Console) -> Result<Self> {
        let dir = log_dir(project_dir);
        fs::create_dir_all(&dir).map_err(|e| FuzzkitError::log_setup(&dir, e))?;

        let suffix = log_suffix(fuzz_tests);
        let verbose_log_path = dir.join(format!("bundle-{}.log", suffix));
        let verbose_log = SharedSink::new("verbose log", create_log_file(&verbose_log_path)?);

        match mode {
            LogMode::File => {
                let build_log_path = dir.join(format!("build-{}.log", suffix));
                let build_log = SharedSink::new("build log", create_log_file(&build_log_path)?);

                let stdout = FanOutWriter::new(vec![build_log, verbose_log.clone()]);
                let stderr = stdout.including(verbose_log.clone());
                Ok(Self {
                    mode,
                    stdout,
                    stderr,
                    verbose_log,
                    verbose_log_path,
                    build_log_path: Some(build_log_path),
                })
            }
            LogMode::Interactive => Ok(Self {
                mode,
                stdout: FanOutWriter::new(vec![console.out(), verbose_log.clone()]),
                stderr: FanOutWriter::new(vec![console.err(), verbose_log.clone()]),
                verbose_log,
                verbose_log_path,
                build_log_path: None,
            }),
        }
    }

    pub fn mode(&self) -> LogMode {
        self.mode
    }

    pub fn logs_to_file(&self) -> bool {
        self.mode == LogMode::File
    }

    /// Writer for build tool stdout.
    pub fn stdout(&self) -> FanOutWriter {
        self.stdout.clone()
    }

    /// Writer for build tool stderr.
    pub fn stderr(&self) -> FanOutWriter {
        self.stderr.clone()
    }

    pub fn verbose_log(&self) -> SharedSink {
        self.verbose_log.clone()
    }

    pub fn verbose_log_path(&self) -> &Path {
        &self.verbose_log_path
    }

    pub fn build_log_path(&self) -> Option<&Path> {
        self.build_log_path.as_deref()
    }

    pub fn build_log_message(&self) -> Option<String> {
        self.build_log_path
            .as_ref()
            .map(|path| format!("Details of the build process can be found in {}", path.display()))
    }

    /// Copy the build log's content to `out`.
    pub fn replay_build_log(&self, out: &mut impl Write) -> io::Result<()> {
        let Some(path) = &self.build_log_path else {
            return Ok(());
        };
        let mut stdout = self.stdout();
        stdout.flush()?;
        let mut file = File::open(path)?;
        io::copy(&mut file, out)?;
        Ok(())
    }
}

fn create_log_file(path: &Path) -> Result<File> {
    File::create(path).map_err(|e| FuzzkitError::log_setup(path, e))
}
