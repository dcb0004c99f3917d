#![doc = include_str!("../README.md")]

pub mod auth;
mod config;
mod error;
mod instance;
mod logging;
pub mod utils;

pub use config::{ConfigError, LibraryConfig, CONFIG_FILE_NAME};
pub use error::{json_or_error, ApiError};
pub use instance::{AmInstance, AmRealm, AuthError, AuthStrategy, ServiceAccountAuthStrategy};
pub use logging::{init_tracing, DebugLog};
