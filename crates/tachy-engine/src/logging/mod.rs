//! Logging utilities.
//!
//! Centralizes `env_logger` initialization behind the `log` facade. Library
//! code only ever logs; binaries and tests decide whether to install a logger.

mod init;

pub use init::{LoggingConfig, init_logging};
