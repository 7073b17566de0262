//! Error types for the terminal driver.
//!
//! The typing session itself never fails; everything here comes from the
//! environment around it.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Terminal or filesystem I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file could not be encoded or decoded.
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),

    /// Tracing subscriber could not be installed.
    #[error("logging setup failed: {message}")]
    Logging { message: String },

    /// No directory is available for application state.
    #[error("no state directory available for log file")]
    NoStateDir,
}

pub type Result<T> = std::result::Result<T, Error>;
