// Infrastructure layer
pub mod command_bundler;
pub mod file_system;
pub mod token_store;

pub use command_bundler::*;
pub use file_system::*;
pub use token_store::*;
