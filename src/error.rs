//! # Error Types Module
//!
//! Centralized error handling for the ward dashboard.
//! Provides custom error types for each module with proper context and error chaining.
//!
//! ## Error Types
//! - `ConfigError`: Configuration file I/O, parsing and validation errors
//! - `SourceError`: Readings/assignment source failures
//! - `WindowError`: Rejected time window descriptors
//! - `SchedulerError`: Poll scheduler startup failures
//!
//! The reduction pipeline itself has no error type. Malformed readings and
//! empty series are handled in place and never surface here.

use chrono::{DateTime, Utc};
use std::fmt;

/// Errors that can occur during configuration operations
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read config file
    ReadFailed(std::io::Error),
    /// Failed to write config file
    WriteFailed(std::io::Error),
    /// Failed to parse config file
    ParseFailed(toml::de::Error),
    /// Failed to serialize config
    SerializeFailed(toml::ser::Error),
    /// Config parsed but holds an unusable value
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ReadFailed(e) => {
                write!(f, "Failed to read config file: {}", e)
            }
            ConfigError::WriteFailed(e) => {
                write!(f, "Failed to write config file: {}", e)
            }
            ConfigError::ParseFailed(e) => {
                write!(f, "Failed to parse config file: {}", e)
            }
            ConfigError::SerializeFailed(e) => {
                write!(f, "Failed to serialize config: {}", e)
            }
            ConfigError::Invalid(msg) => {
                write!(f, "Invalid configuration: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::ReadFailed(e) => Some(e),
            ConfigError::WriteFailed(e) => Some(e),
            ConfigError::ParseFailed(e) => Some(e),
            ConfigError::SerializeFailed(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}

/// Errors raised by the readings and assignment sources
#[derive(Debug)]
pub enum SourceError {
    /// Failed to read the backing file
    ReadFailed(std::io::Error),
    /// Backing document is not valid JSON of the expected shape
    ParseFailed(serde_json::Error),
    /// No such device in the source
    UnknownDevice(String),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::ReadFailed(e) => {
                write!(f, "Failed to read readings source: {}", e)
            }
            SourceError::ParseFailed(e) => {
                write!(f, "Failed to parse readings source: {}", e)
            }
            SourceError::UnknownDevice(id) => {
                write!(f, "Unknown device: {}", id)
            }
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SourceError::ReadFailed(e) => Some(e),
            SourceError::ParseFailed(e) => Some(e),
            SourceError::UnknownDevice(_) => None,
        }
    }
}

/// Errors building a time window
#[derive(Debug, Clone, PartialEq)]
pub enum WindowError {
    /// Relative range string could not be parsed
    InvalidRange(String),
    /// Custom range starts after it ends
    Degenerate {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl fmt::Display for WindowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowError::InvalidRange(range) => {
                write!(f, "Invalid time range '{}', expected e.g. -1h or -7d", range)
            }
            WindowError::Degenerate { start, end } => {
                write!(
                    f,
                    "Custom range starts after it ends: {} > {}",
                    start.to_rfc3339(),
                    end.to_rfc3339()
                )
            }
        }
    }
}

impl std::error::Error for WindowError {}

/// Errors that can occur starting a poll scheduler
#[derive(Debug)]
pub enum SchedulerError {
    /// Failed to create Tokio runtime
    RuntimeCreation(String),
    /// Failed to spawn the worker thread
    ThreadSpawn(String),
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerError::RuntimeCreation(msg) => {
                write!(f, "Failed to create async runtime: {}", msg)
            }
            SchedulerError::ThreadSpawn(msg) => {
                write!(f, "Failed to spawn poll thread: {}", msg)
            }
        }
    }
}

impl std::error::Error for SchedulerError {}
