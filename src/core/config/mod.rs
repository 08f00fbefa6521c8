pub mod data;
pub mod io;

pub use data::{Config, Overrides, Preferences};
pub use io::{config_dir, default_config_path, ConfigError};
