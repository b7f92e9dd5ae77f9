pub mod config;
pub mod local;

pub use config::{ClientConfig, ConfigError, LocalConfig};
pub use local::LocalTransport;
