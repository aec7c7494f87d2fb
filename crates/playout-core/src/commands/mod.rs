//! Unit Command System
//!
//! Handlers for every unit command, the context they read their arguments
//! from, and the executor that dispatches tokenized lines to them.

mod batch;
mod context;
mod executor;
mod path;
mod playlist;
mod property;
mod response;
mod tokenizer;
mod transfer;
mod transport;
mod trim;

pub use batch::*;
pub use context::*;
pub use executor::*;
pub use path::*;
pub use playlist::*;
pub use property::*;
pub use response::*;
pub use tokenizer::*;
pub use transfer::*;
pub use transport::*;
pub use trim::*;

use tracing::warn;

use crate::unit::UnitRegistry;
use crate::{CommandError, CommandResult, UnitError};

/// Signature shared by every unit command handler
pub type Handler = fn(&dyn UnitRegistry, &CommandContext<'_>) -> CommandResult<Response>;

/// Logs an engine rejection and reports it as a bad file
pub(crate) fn rejected(operation: &str, err: UnitError) -> CommandError {
    warn!(operation, error = %err, "Unit rejected operation");
    CommandError::BadFile(format!("{operation}: {err}"))
}
