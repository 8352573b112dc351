//! fuzzkit: build fuzz tests and bundle them for remote execution.
//!
//! The bundle command is a [`core::BundlePipeline`]: it classifies the
//! project's build system, checks the host platform, resolves the fuzz
//! tests, validates the options, opens the run's log files and hands the
//! request to a [`core::BundleAssembler`].

pub mod cli;
pub mod core;
pub mod infrastructure;
pub mod utils;

pub use crate::core::{BundleArgs, BundleAssembler, BundlePipeline, BundleRequest, ExecutionOutcome, LogMode};
pub use crate::utils::{FuzzkitError, Result};
