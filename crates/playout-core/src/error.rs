//! Playout Error Definitions
//!
//! Error types for the unit contract, the command handlers and settings.

use thiserror::Error;

use crate::commands::ResponseCode;
use crate::{ClipIndex, UnitId};

// =============================================================================
// Unit Contract Errors
// =============================================================================

/// Failures reported by a unit or the engine behind it
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitError {
    #[error("Unable to open resource: {0}")]
    ResourceUnavailable(String),

    #[error("Clip index out of range: {0}")]
    IndexOutOfRange(ClipIndex),

    #[error("Unit {0} is offline")]
    Offline(UnitId),

    #[error("Unit {0} has no active consumer")]
    NoConsumer(UnitId),

    #[error("Invalid property assignment: {0}")]
    InvalidProperty(String),
}

/// Unit contract result type
pub type UnitResult<T> = Result<T, UnitError>;

/// Tagged failure of a trim (in/out point) operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimError {
    /// The clip does not accept a trim (unknown clip, no media)
    NotApplicable,
    /// The requested position lies outside the clip's valid range
    OutOfRange,
}

// =============================================================================
// Command Errors
// =============================================================================

/// Handler-level failure; each variant maps to exactly one response code
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unit not found: {0}")]
    InvalidUnit(String),

    #[error("Failed to locate or open clip: {0}")]
    BadFile(String),

    #[error("Missing argument: {0}")]
    MissingArgument(String),

    #[error("Argument value out of range: {0}")]
    OutOfRange(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),
}

impl CommandError {
    /// Response code reported to the caller for this failure
    pub fn code(&self) -> ResponseCode {
        match self {
            Self::InvalidUnit(_) => ResponseCode::InvalidUnit,
            Self::BadFile(_) => ResponseCode::BadFile,
            Self::MissingArgument(_) => ResponseCode::MissingArgument,
            Self::OutOfRange(_) => ResponseCode::OutOfRange,
            Self::UnknownCommand(_) => ResponseCode::UnknownCommand,
        }
    }
}

impl From<UnitError> for CommandError {
    fn from(err: UnitError) -> Self {
        Self::BadFile(err.to_string())
    }
}

impl From<TrimError> for CommandError {
    fn from(err: TrimError) -> Self {
        match err {
            TrimError::NotApplicable => Self::BadFile("clip does not accept trim".to_string()),
            TrimError::OutOfRange => Self::OutOfRange("trim position".to_string()),
        }
    }
}

/// Command handler result type
pub type CommandResult<T> = Result<T, CommandError>;

// =============================================================================
// Settings Errors
// =============================================================================

/// Failures while persisting server settings
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings result type
pub type SettingsResult<T> = Result<T, SettingsError>;
