//! Command Responses
//!
//! Numeric response codes and the optional text payload a handler returns.

use std::fmt;

use crate::CommandError;

/// Stable response code set (MVCP-compatible values)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResponseCode {
    Success = 200,
    SuccessWithPayload = 202,
    UnknownCommand = 400,
    MissingArgument = 402,
    InvalidUnit = 403,
    BadFile = 404,
    OutOfRange = 405,
}

impl ResponseCode {
    /// Numeric wire value
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// Status text sent after the numeric code
    pub fn message(self) -> &'static str {
        match self {
            Self::Success | Self::SuccessWithPayload => "OK",
            Self::UnknownCommand => "Unknown command",
            Self::MissingArgument => "Missing argument",
            Self::InvalidUnit => "Unit not found",
            Self::BadFile => "Failed to locate or open clip",
            Self::OutOfRange => "Argument value out of range",
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, Self::Success | Self::SuccessWithPayload)
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.message())
    }
}

/// Outcome of one command
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub code: ResponseCode,
    /// Newline-terminated text lines; empty when there is nothing to report
    pub payload: String,
}

impl Response {
    /// Plain success without payload
    pub fn ok() -> Self {
        Self {
            code: ResponseCode::Success,
            payload: String::new(),
        }
    }

    /// Success carrying a payload
    pub fn with_payload(code: ResponseCode, payload: impl Into<String>) -> Self {
        Self {
            code,
            payload: payload.into(),
        }
    }

    pub fn from_error(err: &CommandError) -> Self {
        Self {
            code: err.code(),
            payload: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code.is_success()
    }
}

impl From<Result<Response, CommandError>> for Response {
    fn from(result: Result<Response, CommandError>) -> Self {
        result.unwrap_or_else(|err| Self::from_error(&err))
    }
}

impl fmt::Display for Response {
    /// Wire form: status line followed by the payload
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.code)?;
        f.write_str(&self.payload)
    }
}
