pub mod model;

pub use model::{Config, ConfigError};
