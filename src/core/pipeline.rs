//! The bundle command from parsed arguments to the terminal report.

use crate::core::classifier::classify;
use crate::core::interfaces::BundleAssembler;
use crate::core::logs::{LogDestination, LogMode};
use crate::core::models::*;
use crate::core::options::{BundleArgs, DEFAULT_OUTPUT};
use crate::core::platform::check_platform;
use crate::core::resolver::resolve_fuzz_tests;
use crate::utils::ui::{BUNDLE_ERROR_MSG, BUNDLE_IN_PROGRESS_MSG, BUNDLE_SUCCESS_MSG};
use crate::utils::{ConfigLoader, Console, FuzzkitError, Logger, Result, Spinner, Timer};
use std::path::{Path, PathBuf};

const COMMAND: &str = "bundle";

/// Log an expected error where it is detected and mark it as reported.
/// Unexpected errors pass through untouched so the caller can show their
/// full cause chain.
pub(crate) fn report(err: FuzzkitError) -> FuzzkitError {
    if err.is_silent() || !err.is_expected() {
        return err;
    }
    Logger::error(&err.to_string());
    err.silence()
}

/// Runs one bundle request: classify, gate, resolve, validate, set up logs,
/// hand over to the assembler and report the outcome.
pub struct BundlePipeline<A: BundleAssembler> {
    assembler: A,
    console: Console,
    platform: HostPlatform,
    log_mode: LogMode,
    verbose: bool,
    working_dir: PathBuf,
}

impl<A: BundleAssembler> BundlePipeline<A> {
    pub fn new(assembler: A, console: Console) -> Self {
        let log_mode = LogMode::detect(false, &console);
        Self {
            assembler,
            console,
            platform: HostPlatform::current(),
            log_mode,
            verbose: false,
            working_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    pub fn with_platform(mut self, platform: HostPlatform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_log_mode(mut self, log_mode: LogMode) -> Self {
        self.log_mode = log_mode;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Directory to search for the project from when none is given.
    pub fn with_working_dir(mut self, working_dir: impl Into<PathBuf>) -> Self {
        self.working_dir = working_dir.into();
        self
    }

    pub fn assembler(&self) -> &A {
        &self.assembler
    }

    /// Run the pipeline. Returns the archive path reported by the assembler.
    pub fn run(&self, args: BundleArgs) -> Result<PathBuf> {
        let request = self.prepare(args).map_err(report)?;

        // Only a request that passed every check gets log files.
        let logs = LogDestination::open(&request.project_dir, &request.fuzz_tests, self.log_mode, &self.console)
            .map_err(report)?;

        let dispatch = Logger::with_secondary_output(self.verbose, logs.verbose_log());
        tracing::dispatcher::with_default(&dispatch, || self.execute(&request, &logs))
    }

    fn prepare(&self, args: BundleArgs) -> Result<BundleRequest> {
        let project_dir = self.project_dir(args.project_dir.as_deref())?;

        let file_config = ConfigLoader::load(&project_dir)?;
        let mut options = ConfigLoader::merge_with_cli(file_config, args, project_dir);
        // The assembler runs in the project directory, the user does not.
        options.output = Some(
            self.working_dir
                .join(options.output.as_deref().unwrap_or(Path::new(DEFAULT_OUTPUT))),
        );

        let kind = classify(&options.project_dir, options.build_system.as_deref(), COMMAND, &self.platform)?;
        check_platform(COMMAND, kind, &self.platform)?;

        let fuzz_tests = resolve_fuzz_tests(
            kind,
            &options.fuzz_tests,
            &options.project_dir,
            options.resolve_source_files,
        )?;
        if fuzz_tests.is_empty() {
            return Err(FuzzkitError::MissingFuzzTest(format!(
                "No fuzz tests found in {}",
                options.project_dir.display()
            )));
        }

        options.into_request(kind, fuzz_tests)
    }

    fn project_dir(&self, explicit: Option<&Path>) -> Result<PathBuf> {
        let project_dir = match explicit {
            Some(dir) if dir.is_absolute() => dir.to_path_buf(),
            Some(dir) => self.working_dir.join(dir),
            None => ConfigLoader::find_project_dir(&self.working_dir).unwrap_or_else(|| self.working_dir.clone()),
        };

        if !project_dir.is_dir() {
            return Err(FuzzkitError::config(format!(
                "Project directory {} does not exist",
                project_dir.display()
            )));
        }
        Logger::debug(&format!("Using project directory {}", project_dir.display()));
        Ok(project_dir)
    }

    fn execute(&self, request: &BundleRequest, logs: &LogDestination) -> Result<PathBuf> {
        Logger::debug(&format!(
            "Bundling {} fuzz test(s) for {} into {}",
            request.fuzz_tests.len(),
            request.build_system,
            request.output_path.display()
        ));

        let spinner = logs.logs_to_file().then(|| self.console.spinner(BUNDLE_IN_PROGRESS_MSG));

        let outcome = {
            let _timer = Timer::start("Bundle assembly");
            self.assembler.bundle(request, logs)
        };

        self.conclude(outcome, spinner, request, logs)
    }

    fn conclude(
        &self,
        outcome: ExecutionOutcome,
        spinner: Option<Spinner>,
        request: &BundleRequest,
        logs: &LogDestination,
    ) -> Result<PathBuf> {
        match outcome {
            ExecutionOutcome::Success(archive) => {
                if let Some(spinner) = spinner {
                    spinner.finish_success(BUNDLE_SUCCESS_MSG);
                }
                self.print_build_log_location(logs);
                self.console
                    .success(&format!("Successfully created bundle: {}", request.output_path.display()));
                Ok(archive)
            }
            ExecutionOutcome::ExpectedFailure(err) => {
                if let Some(spinner) = spinner {
                    spinner.finish_error(BUNDLE_ERROR_MSG);
                }
                self.replay_build_log(logs);
                self.print_build_log_location(logs);
                Err(report(err))
            }
            ExecutionOutcome::UnexpectedFailure(err) => {
                if let Some(spinner) = spinner {
                    spinner.finish_error(BUNDLE_ERROR_MSG);
                }
                self.replay_build_log(logs);
                self.print_build_log_location(logs);
                Err(FuzzkitError::Internal(err))
            }
        }
    }

    fn print_build_log_location(&self, logs: &LogDestination) {
        if let Some(message) = logs.build_log_message() {
            self.console.print(&message);
        }
    }

    fn replay_build_log(&self, logs: &LogDestination) {
        let mut out = self.console.out();
        if let Err(e) = logs.replay_build_log(&mut out) {
            Logger::error(&format!("Failed to print the build log: {}", e));
        }
    }
}
