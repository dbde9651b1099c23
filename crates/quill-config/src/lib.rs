pub mod annotations;
pub mod config;
pub mod error;
pub mod profile;
pub mod utils;

#[cfg(test)]
pub mod test_utils;

pub use config::{generate_default_config, set_config_path, Config};
pub use error::ConfigError;
pub use profile::Profile;
