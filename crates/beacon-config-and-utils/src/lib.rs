//! Configuration, filesystem paths, and logging for beacon.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    Config, StoreBackend, DEFAULT_GAME, DEFAULT_KV_QUOTA_BYTES, DEFAULT_LOG_LEVEL,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SERVER_URL,
};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, init_logging_to_file};
pub use paths::Paths;
