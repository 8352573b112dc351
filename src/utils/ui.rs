use crate::utils::{CapturedOutput, SharedSink};
use colored::*;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::Write;
use std::time::Duration;

pub const BUNDLE_IN_PROGRESS_MSG: &str = "Building fuzz tests and creating bundle...";
pub const BUNDLE_SUCCESS_MSG: &str = "Bundle created";
pub const BUNDLE_ERROR_MSG: &str = "Failed to create bundle";

/// The user's terminal: where reports and interactive build output go.
#[derive(Clone, Debug)]
pub struct Console {
    out: SharedSink,
    err: SharedSink,
    interactive: bool,
}

impl Console {
    pub fn stdio() -> Self {
        Self {
            out: SharedSink::stdout(),
            err: SharedSink::stderr(),
            interactive: console::Term::stdout().is_term(),
        }
    }

    /// A non-interactive console writing into memory.
    pub fn captured() -> (Self, CapturedOutput, CapturedOutput) {
        let out = CapturedOutput::new();
        let err = CapturedOutput::new();
        let console = Self {
            out: SharedSink::new("stdout", out.clone()),
            err: SharedSink::new("stderr", err.clone()),
            interactive: false,
        };
        (console, out, err)
    }

    pub fn out(&self) -> SharedSink {
        self.out.clone()
    }

    pub fn err(&self) -> SharedSink {
        self.err.clone()
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn print(&self, msg: &str) {
        let mut out = self.out.clone();
        let _ = writeln!(out, "{}", msg);
    }

    pub fn success(&self, msg: &str) {
        self.print(&format!("{} {}", "✓".bright_green(), msg));
    }

    pub fn failure(&self, msg: &str) {
        let mut err = self.err.clone();
        let _ = writeln!(err, "{} {}", "✗".bright_red(), msg);
    }

    pub fn warning(&self, msg: &str) {
        let mut err = self.err.clone();
        let _ = writeln!(err, "{} {}", "!".bright_yellow(), msg);
    }

    /// Start a spinner. Drawn only on an interactive terminal.
    pub fn spinner(&self, msg: &str) -> Spinner {
        let bar = if self.interactive {
            ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr())
        } else {
            ProgressBar::hidden()
        };
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(msg.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Spinner { bar }
    }
}

pub struct Spinner {
    bar: ProgressBar,
}

impl Spinner {
    pub fn finish_success(self, msg: &str) {
        self.finish(format!("{} {}", "✓".bright_green(), msg));
    }

    pub fn finish_error(self, msg: &str) {
        self.finish(format!("{} {}", "✗".bright_red(), msg));
    }

    fn finish(self, line: String) {
        if let Ok(style) = ProgressStyle::with_template("{msg}") {
            self.bar.set_style(style);
        }
        self.bar.finish_with_message(line);
    }

    pub fn is_finished(&self) -> bool {
        self.bar.is_finished()
    }
}
