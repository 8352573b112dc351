use crate::core::init::{init_project, PRERELEASE_ENV};
use crate::core::models::env_flag_enabled;
use crate::core::{BundleArgs, BundlePipeline, LogMode};
use crate::infrastructure::CommandBundler;
use crate::utils::{Console, Logger, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fuzzkit", version)]
#[command(about = "fuzzkit - build fuzz tests and bundle them for remote execution")]
pub struct Cli {
    /// Show verbose output, including the output of the build tools
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build fuzz tests and bundle them into an archive
    Bundle(BundleCommand),
    /// Set up a project for use with fuzzkit
    Init {
        /// Project directory
        #[arg(short = 'C', long)]
        dir: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Default)]
pub struct BundleCommand {
    /// Fuzz tests to bundle. All fuzz tests of the project when empty,
    /// except for build systems of type "other"
    pub fuzz_tests: Vec<String>,

    /// Arguments passed verbatim to the build tool
    #[arg(last = true)]
    pub build_system_args: Vec<String>,

    /// Output path of the bundle
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Docker image the fuzz tests run in
    #[arg(long)]
    pub docker_image: Option<String>,

    /// Environment variable for the fuzz tests, KEY=VALUE or KEY
    #[arg(long = "env")]
    pub env: Vec<String>,

    /// Directory with seed inputs
    #[arg(short = 's', long = "seed-corpus")]
    pub seed_corpus_dirs: Vec<PathBuf>,

    /// Maximum run time of a fuzz test, e.g. 30m
    #[arg(long)]
    pub timeout: Option<String>,

    /// Number of parallel build jobs
    #[arg(short = 'j', long)]
    pub build_jobs: Option<usize>,

    /// Command building one fuzz test, run with FUZZ_TEST set
    #[arg(long)]
    pub build_command: Option<String>,

    /// Command run once before building
    #[arg(long)]
    pub clean_command: Option<String>,

    /// Additional file for the bundle, source or source;target
    #[arg(long = "add")]
    pub additional_files: Vec<String>,

    /// Dictionary for the fuzzing engine
    #[arg(long)]
    pub dict: Option<PathBuf>,

    /// Argument passed to the fuzzing engine
    #[arg(long = "engine-arg")]
    pub engine_args: Vec<String>,

    #[arg(long)]
    pub branch: Option<String>,

    #[arg(long)]
    pub commit: Option<String>,

    /// Project directory, found from the current directory when omitted
    #[arg(long)]
    pub project_dir: Option<PathBuf>,

    /// Treat the arguments as source files and bundle the fuzz tests defined in them
    #[arg(long)]
    pub resolve: bool,
}

impl From<BundleCommand> for BundleArgs {
    fn from(cmd: BundleCommand) -> Self {
        BundleArgs {
            project_dir: cmd.project_dir,
            fuzz_tests: cmd.fuzz_tests,
            build_system_args: cmd.build_system_args,
            resolve_source_files: cmd.resolve,
            build_command: cmd.build_command,
            clean_command: cmd.clean_command,
            docker_image: cmd.docker_image,
            env: cmd.env,
            seed_corpus_dirs: cmd.seed_corpus_dirs,
            additional_files: cmd.additional_files,
            dict: cmd.dict,
            engine_args: cmd.engine_args,
            timeout: cmd.timeout,
            build_jobs: cmd.build_jobs,
            output: cmd.output,
            branch: cmd.branch,
            commit: cmd.commit,
        }
    }
}

pub struct CliHandler;

impl CliHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn run(&self, cli: Cli) -> Result<()> {
        Logger::init(cli.verbose);

        match cli.command {
            Commands::Bundle(cmd) => self.handle_bundle_command(cmd, cli.verbose),
            Commands::Init { dir } => self.handle_init_command(dir),
        }
    }

    fn handle_bundle_command(&self, cmd: BundleCommand, verbose: bool) -> Result<()> {
        let console = Console::stdio();
        let log_mode = LogMode::detect(verbose, &console);

        let pipeline = BundlePipeline::new(CommandBundler::new(), console)
            .with_verbose(verbose)
            .with_log_mode(log_mode);
        pipeline.run(cmd.into())?;
        Ok(())
    }

    fn handle_init_command(&self, dir: Option<PathBuf>) -> Result<()> {
        let dir = match dir {
            Some(dir) => dir,
            None => std::env::current_dir()?,
        };
        let prerelease = std::env::var(PRERELEASE_ENV)
            .map(|value| env_flag_enabled(&value))
            .unwrap_or(false);

        init_project(&dir, &Console::stdio(), prerelease)?;
        Ok(())
    }
}

impl Default for CliHandler {
    fn default() -> Self {
        Self::new()
    }
}
