// Core domain layer
pub mod auth;
pub mod classifier;
pub mod init;
pub mod interfaces;
pub mod logs;
pub mod models;
pub mod options;
pub mod pipeline;
pub mod platform;
pub mod resolver;

pub use interfaces::*;
pub use logs::{LogDestination, LogMode};
pub use models::*;
pub use options::{BundleArgs, BundleOptions};
pub use pipeline::BundlePipeline;
