// Shared utilities module
pub mod config_loader;
pub mod errors;
pub mod fan_out;
pub mod logging;
pub mod ui;

pub use config_loader::*;
pub use errors::*;
pub use fan_out::*;
pub use logging::*;
pub use ui::*;
