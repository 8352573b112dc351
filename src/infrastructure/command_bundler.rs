//! Assembly delegate that shells out: the user's build command for "other"
//! projects, then the external archive-assembly engine.

use crate::core::interfaces::BundleAssembler;
use crate::core::logs::{log_suffix, BUILD_DIR};
use crate::core::models::*;
use crate::core::LogDestination;
use crate::utils::{FuzzkitError, Logger, Result};
use anyhow::Context;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};

pub const ASSEMBLER_ENV: &str = "FUZZKIT_ASSEMBLER";
pub const DEFAULT_ASSEMBLER: &str = "fuzzkit-assemble";

pub struct CommandBundler {
    assembler: Option<String>,
}

impl CommandBundler {
    /// Uses `$FUZZKIT_ASSEMBLER` when set, else the project's configured
    /// assembler, else `fuzzkit-assemble` from PATH.
    pub fn new() -> Self {
        Self {
            assembler: std::env::var(ASSEMBLER_ENV).ok().filter(|v| !v.trim().is_empty()),
        }
    }

    pub fn with_assembler(assembler: impl Into<String>) -> Self {
        Self {
            assembler: Some(assembler.into()),
        }
    }

    fn assembler_for(&self, request: &BundleRequest) -> String {
        self.assembler
            .clone()
            .or_else(|| request.assembler.clone())
            .unwrap_or_else(|| DEFAULT_ASSEMBLER.to_string())
    }

    fn try_bundle(&self, request: &BundleRequest, logs: &LogDestination) -> Result<PathBuf> {
        if request.build_system == BuildSystemKind::Other {
            self.build_other(request, logs)?;
        }

        let manifest = self.write_manifest(request)?;

        let assembler = self.assembler_for(request);
        let mut command = Command::new(&assembler);
        command.arg("--request").arg(&manifest).current_dir(&request.project_dir);
        run_streaming(command, &format!("{} --request {}", assembler, manifest.display()), logs)?;

        Ok(request.output_path.clone())
    }

    /// Clean once, then build every fuzz test with FUZZ_TEST set.
    fn build_other(&self, request: &BundleRequest, logs: &LogDestination) -> Result<()> {
        if let Some(clean_command) = &request.clean_command {
            let mut command = shell(clean_command);
            command.current_dir(&request.project_dir);
            run_streaming(command, clean_command, logs)?;
        }

        let Some(build_command) = &request.build_command else {
            return Err(FuzzkitError::invalid_option("no build command configured"));
        };
        for fuzz_test in &request.fuzz_tests {
            Logger::debug(&format!("Building {}", fuzz_test));
            let mut command = shell(build_command);
            command
                .args(&request.build_system_args)
                .env("FUZZ_TEST", fuzz_test.as_str())
                .current_dir(&request.project_dir);
            run_streaming(command, build_command, logs)?;
        }
        Ok(())
    }

    fn write_manifest(&self, request: &BundleRequest) -> Result<PathBuf> {
        let dir = request.project_dir.join(BUILD_DIR);
        std::fs::create_dir_all(&dir)?;

        let path = dir.join(format!("bundle-request-{}.json", log_suffix(&request.fuzz_tests)));
        let manifest = serde_json::to_vec_pretty(request).context("serializing bundle request")?;
        std::fs::write(&path, manifest)?;
        Logger::debug(&format!("Wrote bundle request to {}", path.display()));
        Ok(path)
    }
}

impl Default for CommandBundler {
    fn default() -> Self {
        Self::new()
    }
}

impl BundleAssembler for CommandBundler {
    fn bundle(&self, request: &BundleRequest, logs: &LogDestination) -> ExecutionOutcome {
        match self.try_bundle(request, logs) {
            Ok(archive) => ExecutionOutcome::Success(archive),
            Err(FuzzkitError::Internal(err)) => ExecutionOutcome::UnexpectedFailure(err),
            Err(FuzzkitError::Io(err)) => ExecutionOutcome::UnexpectedFailure(err.into()),
            Err(err) => ExecutionOutcome::ExpectedFailure(err),
        }
    }
}

#[cfg(windows)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

#[cfg(not(windows))]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    // Extra arguments become $1, $2, ... of the command.
    cmd.arg("-c").arg(command).arg("sh");
    cmd
}

/// Run `command` to completion, streaming its output into the log writers.
fn run_streaming(command: Command, display: &str, logs: &LogDestination) -> Result<()> {
    run_with_writers(command, display, logs.stdout(), logs.stderr())
}

fn run_with_writers(
    mut command: Command,
    display: &str,
    stdout: impl Write + Send,
    stderr: impl Write + Send,
) -> Result<()> {
    Logger::debug(&format!("Command: {}", display));

    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to start \"{}\"", display))?;

    let child_stdout = child.stdout.take();
    let child_stderr = child.stderr.take();

    let (status, copied) = std::thread::scope(|scope| {
        let out = child_stdout.map(|out| scope.spawn(move || forward_output(out, stdout)));
        let err = child_stderr.map(|err| scope.spawn(move || forward_output(err, stderr)));
        let status = child.wait();

        let copied: Vec<io::Result<u64>> = [out, err]
            .into_iter()
            .flatten()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err(io::Error::new(io::ErrorKind::Other, "output thread panicked")))
            })
            .collect();
        (status, copied)
    });

    let status = status.with_context(|| format!("failed to wait for \"{}\"", display))?;
    for result in copied {
        result.with_context(|| format!("failed to log the output of \"{}\"", display))?;
    }

    if !status.success() {
        return Err(FuzzkitError::Exec {
            command: display.to_string(),
            code: status.code(),
        });
    }
    Ok(())
}

/// Copy child output into `writer`. After a write error the rest is still
/// read so the child never blocks on a full pipe.
fn forward_output(mut output: impl Read, mut writer: impl Write) -> io::Result<u64> {
    match io::copy(&mut output, &mut writer) {
        Ok(copied) => writer.flush().map(|_| copied),
        Err(err) => {
            let _ = io::copy(&mut output, &mut io::sink());
            Err(err)
        }
    }
}
