//! Command Context
//!
//! The immutable input bundle of one command and the typed argument
//! accessors handlers use to read it.

use std::fmt;
use std::sync::Arc;

use crate::unit::{Unit, UnitRegistry};
use crate::{ClipIndex, CommandError, CommandResult, UnitId};

/// Index of the first argument token (after verb and unit)
pub const FIRST_ARG: usize = 2;

// =============================================================================
// Unit Target
// =============================================================================

/// Addressee of a command
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitTarget {
    Single(UnitId),
    /// Every resolvable unit
    Broadcast,
}

impl UnitTarget {
    /// Parses `U<digits>` (case-insensitive), or `U*` / `*` for broadcast
    pub fn parse(token: &str) -> Option<Self> {
        if token == "*" {
            return Some(Self::Broadcast);
        }
        let rest = token.strip_prefix(['U', 'u'])?;
        if rest == "*" {
            return Some(Self::Broadcast);
        }
        parse_unit_digits(rest).map(Self::Single)
    }
}

impl fmt::Display for UnitTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(id) => write!(f, "U{id}"),
            Self::Broadcast => f.write_str("U*"),
        }
    }
}

/// Parses a single-unit token of the form `[Uu]<digits>`
pub fn parse_unit_id(token: &str) -> Option<UnitId> {
    token.strip_prefix(['U', 'u']).and_then(parse_unit_digits)
}

fn parse_unit_digits(digits: &str) -> Option<UnitId> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

// =============================================================================
// Clip Reference
// =============================================================================

/// A clip addressed absolutely or relative to the unit's current clip
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClipRef {
    Current,
    Absolute(ClipIndex),
    Relative(ClipIndex),
}

impl ClipRef {
    /// `+n` / `-n` are deltas, anything else an absolute index
    pub fn parse(token: &str) -> Option<Self> {
        if let Some(delta) = token.strip_prefix('+') {
            return parse_unsigned(delta).map(Self::Relative);
        }
        if let Some(delta) = token.strip_prefix('-') {
            return parse_unsigned(delta).map(|d| Self::Relative(-d));
        }
        token.parse().ok().map(Self::Absolute)
    }

    /// Resolves against the current clip index
    pub fn resolve(self, current: ClipIndex) -> ClipIndex {
        match self {
            Self::Current => current,
            Self::Absolute(index) => index,
            Self::Relative(delta) => current.saturating_add(delta),
        }
    }
}

fn parse_unsigned(digits: &str) -> Option<ClipIndex> {
    if digits.starts_with(['+', '-']) {
        return None;
    }
    digits.parse().ok()
}

// =============================================================================
// Command Context
// =============================================================================

/// Input of a single command handler call
#[derive(Clone, Copy, Debug)]
pub struct CommandContext<'a> {
    pub target: UnitTarget,
    /// Full token list: verb, unit, then arguments
    pub tokens: &'a [String],
    /// Raw argument; the untokenized remainder for document commands
    pub argument: Option<&'a str>,
    /// Root directory prefixed to every resource path
    pub root_dir: &'a str,
}

impl<'a> CommandContext<'a> {
    /// Creates a context whose raw argument is the first argument token
    pub fn new(target: UnitTarget, tokens: &'a [String], root_dir: &'a str) -> Self {
        Self {
            target,
            tokens,
            argument: tokens.get(FIRST_ARG).map(String::as_str),
            root_dir,
        }
    }

    /// Overrides the raw argument
    pub fn with_argument(mut self, argument: Option<&'a str>) -> Self {
        self.argument = argument;
        self
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    pub fn token(&self, index: usize) -> Option<&'a str> {
        self.tokens.get(index).map(String::as_str)
    }

    /// Integer token at `index`, `None` when absent
    pub fn int_token(&self, index: usize) -> CommandResult<Option<i32>> {
        self.token(index)
            .map(|token| {
                token.parse().map_err(|_| {
                    CommandError::MissingArgument(format!("expected integer, got '{token}'"))
                })
            })
            .transpose()
    }

    /// Integer token at `index` that must be present
    pub fn require_int(&self, index: usize, what: &str) -> CommandResult<i32> {
        self.int_token(index)?
            .ok_or_else(|| CommandError::MissingArgument(what.to_string()))
    }

    /// Raw argument parsed as an integer
    pub fn int_argument(&self, what: &str) -> CommandResult<i32> {
        let raw = self
            .argument
            .ok_or_else(|| CommandError::MissingArgument(what.to_string()))?;
        raw.trim()
            .parse()
            .map_err(|_| CommandError::MissingArgument(format!("{what}: '{raw}'")))
    }

    /// Raw argument that must be present
    pub fn require_argument(&self, what: &str) -> CommandResult<&'a str> {
        self.argument
            .ok_or_else(|| CommandError::MissingArgument(what.to_string()))
    }

    /// Clip reference at `index`; absent means the current clip
    pub fn clip_ref(&self, index: usize) -> CommandResult<ClipRef> {
        match self.token(index) {
            None => Ok(ClipRef::Current),
            Some(token) => ClipRef::parse(token).ok_or_else(|| {
                CommandError::MissingArgument(format!("expected clip index, got '{token}'"))
            }),
        }
    }

    /// Resolves the single target unit; broadcast never resolves here
    pub fn resolve_unit(&self, registry: &dyn UnitRegistry) -> CommandResult<Arc<dyn Unit>> {
        match self.target {
            UnitTarget::Single(id) => registry
                .resolve(id)
                .ok_or_else(|| CommandError::InvalidUnit(self.target.to_string())),
            UnitTarget::Broadcast => Err(CommandError::InvalidUnit(self.target.to_string())),
        }
    }
}
