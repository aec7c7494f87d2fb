//! Command Executor Module
//!
//! The static command table and the executor that turns a command line
//! into a handler call. Every failure leaves here as a [`Response`]
//! carrying its mapped code; no error crosses the public boundary.

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::{debug, debug_span};

use super::context::{CommandContext, UnitTarget, FIRST_ARG};
use super::response::Response;
use super::tokenizer::{remainder, tokenize};
use super::{playlist, property, transfer, transport, trim, Handler};
use crate::unit::{Service, ServiceFactory, UnitRegistry};
use crate::{CommandError, CommandResult};

// =============================================================================
// Command Table
// =============================================================================

/// Argument a verb requires after its unit token
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgKind {
    /// Nothing required; optional arguments are read by the handler
    None,
    Int,
    Str,
    /// `name=value`
    Pair,
    /// Untokenized remainder of the line
    Document,
}

/// Unit commands understood by the executor
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    Load,
    List,
    Insert,
    Remove,
    Append,
    Move,
    Clean,
    Wipe,
    Clear,
    Receive,
    Play,
    Stop,
    Pause,
    Rewind,
    FastForward,
    Step,
    Goto,
    SetIn,
    SetOut,
    SetOutLive,
    Status,
    Set,
    Get,
    Delete,
    Transfer,
}

/// One row of the command table
#[derive(Debug)]
pub struct CommandSpec {
    pub command: Command,
    pub verb: &'static str,
    pub arg: ArgKind,
    pub help: &'static str,
}

const fn spec(command: Command, verb: &'static str, arg: ArgKind, help: &'static str) -> CommandSpec {
    CommandSpec { command, verb, arg, help }
}

pub static COMMANDS: &[CommandSpec] = &[
    spec(Command::Load, "LOAD", ArgKind::Str, "Load clip, flushing the playlist unless prefixed with '!'"),
    spec(Command::List, "LIST", ArgKind::None, "List the playlist"),
    spec(Command::Insert, "INSERT", ArgKind::Str, "Insert clips: path [index in out]..."),
    spec(Command::Remove, "REMOVE", ArgKind::None, "Remove clips by index (default: current)"),
    spec(Command::Append, "APND", ArgKind::Str, "Append clips: path [in out]..."),
    spec(Command::Move, "MOVE", ArgKind::Int, "Move clips: src dest [count]"),
    spec(Command::Clean, "CLEAN", ArgKind::None, "Drop clips that can no longer be opened"),
    spec(Command::Wipe, "WIPE", ArgKind::None, "Keep only the current clip"),
    spec(Command::Clear, "CLEAR", ArgKind::None, "Empty the playlist"),
    spec(Command::Receive, "RCV", ArgKind::Document, "Append a service built from an inline document"),
    spec(Command::Play, "PLAY", ArgKind::None, "Play at normal or given speed"),
    spec(Command::Stop, "STOP", ArgKind::None, "Stop playback"),
    spec(Command::Pause, "PAUSE", ArgKind::None, "Pause playback"),
    spec(Command::Rewind, "REW", ArgKind::None, "Rewind"),
    spec(Command::FastForward, "FF", ArgKind::None, "Fast forward"),
    spec(Command::Step, "STEP", ArgKind::Int, "Step frames"),
    spec(Command::Goto, "GOTO", ArgKind::Int, "Seek: frame [clip]"),
    spec(Command::SetIn, "SIN", ArgKind::Int, "Set in point: frame [clip]"),
    spec(Command::SetOut, "SOUT", ArgKind::Int, "Set out point: frame [clip]"),
    spec(Command::SetOutLive, "SOUTL", ArgKind::Int, "Set out point of a clip on air: frame [clip]"),
    spec(Command::Status, "USTA", ArgKind::None, "Report unit status"),
    spec(Command::Set, "USET", ArgKind::Pair, "Set unit property: name=value"),
    spec(Command::Get, "UGET", ArgKind::Str, "Get unit property"),
    spec(Command::Delete, "UDEL", ArgKind::Str, "Delete unit property"),
    spec(Command::Transfer, "XFER", ArgKind::Str, "Transfer the playlist to another unit"),
];

impl Command {
    /// Looks a verb up, ignoring case
    pub fn lookup(verb: &str) -> Option<&'static CommandSpec> {
        COMMANDS.iter().find(|spec| spec.verb.eq_ignore_ascii_case(verb))
    }

    pub fn spec(self) -> &'static CommandSpec {
        // Every variant has exactly one table row
        COMMANDS
            .iter()
            .find(|spec| spec.command == self)
            .unwrap_or(&COMMANDS[0])
    }

    pub fn verb(self) -> &'static str {
        self.spec().verb
    }

    /// Registry-only handler; `None` for commands that need more than the registry
    fn handler(self) -> Option<Handler> {
        let handler: Handler = match self {
            Self::Load => playlist::load,
            Self::List => playlist::list,
            Self::Insert => playlist::insert,
            Self::Remove => playlist::remove,
            Self::Append => playlist::append,
            Self::Move => playlist::move_clips,
            Self::Clean => playlist::clean,
            Self::Wipe => playlist::wipe,
            Self::Clear => playlist::clear,
            Self::Receive => return None,
            Self::Play => transport::play,
            Self::Stop => transport::stop,
            Self::Pause => transport::pause,
            Self::Rewind => transport::rewind,
            Self::FastForward => transport::fast_forward,
            Self::Step => transport::step,
            Self::Goto => transport::goto,
            Self::SetIn => trim::set_in_point,
            Self::SetOut => trim::set_out_point,
            Self::SetOutLive => trim::set_out_point_live,
            Self::Status => property::status,
            Self::Set => property::set_property,
            Self::Get => property::get_property,
            Self::Delete => property::delete_property,
            Self::Transfer => transfer::transfer,
        };
        Some(handler)
    }
}

// =============================================================================
// Command Executor
// =============================================================================

/// Dispatches unit commands against a registry
pub struct CommandExecutor {
    registry: Arc<dyn UnitRegistry>,
    factory: Arc<dyn ServiceFactory>,
    root_dir: String,
}

impl CommandExecutor {
    /// Creates an executor; `root_dir` prefixes every resource path
    pub fn new(
        registry: Arc<dyn UnitRegistry>,
        factory: Arc<dyn ServiceFactory>,
        root_dir: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            factory,
            root_dir: root_dir.into(),
        }
    }

    pub fn root_dir(&self) -> &str {
        &self.root_dir
    }

    pub fn registry(&self) -> &Arc<dyn UnitRegistry> {
        &self.registry
    }

    /// Tokenizes, validates and executes one command line
    pub fn execute_line(&self, line: &str) -> Response {
        let tokens = tokenize(line);
        let texts: Vec<String> = tokens.iter().map(|t| t.text.clone()).collect();

        let parsed = self.parse(&texts).and_then(|(spec, target)| {
            let argument = match spec.arg {
                ArgKind::Document => remainder(line, &tokens, FIRST_ARG),
                _ => texts.get(FIRST_ARG).map(String::as_str),
            };
            check_argument(spec, argument)?;
            Ok((spec.command, target, argument))
        });

        match parsed {
            Ok((command, target, argument)) => {
                let ctx = CommandContext::new(target, &texts, &self.root_dir).with_argument(argument);
                self.execute(&ctx, command)
            }
            Err(err) => {
                debug!(line, error = %err, "Rejected command line");
                Response::from_error(&err)
            }
        }
    }

    /// Executes an already-tokenized command
    pub fn execute(&self, ctx: &CommandContext<'_>, command: Command) -> Response {
        let span = debug_span!("command", verb = command.verb(), unit = %ctx.target);
        let _enter = span.enter();

        let registry = self.registry.as_ref();
        let result = match command.handler() {
            Some(handler) => handler(registry, ctx),
            None => playlist::receive(registry, self.factory.as_ref(), ctx),
        };
        log_failure(&result);
        result.into()
    }

    /// Attaches an already-constructed service to a unit's playlist
    pub fn push(&self, target: UnitTarget, service: Option<Service>) -> Response {
        let span = debug_span!("command", verb = "PUSH", unit = %target);
        let _enter = span.enter();

        let result = playlist::push(self.registry.as_ref(), target, service);
        log_failure(&result);
        result.into()
    }

    /// One line per verb with its help text
    pub fn help(&self) -> String {
        let mut out = String::new();
        for spec in COMMANDS {
            let _ = writeln!(out, "{:<7} {}", spec.verb, spec.help);
        }
        out
    }

    fn parse(&self, texts: &[String]) -> CommandResult<(&'static CommandSpec, UnitTarget)> {
        let verb = texts
            .first()
            .ok_or_else(|| CommandError::UnknownCommand(String::new()))?;
        let spec =
            Command::lookup(verb).ok_or_else(|| CommandError::UnknownCommand(verb.clone()))?;

        let unit = texts
            .get(1)
            .ok_or_else(|| CommandError::MissingArgument("unit".to_string()))?;
        let target = UnitTarget::parse(unit)
            .ok_or_else(|| CommandError::InvalidUnit(unit.clone()))?;
        Ok((spec, target))
    }
}

fn check_argument(spec: &CommandSpec, argument: Option<&str>) -> CommandResult<()> {
    let missing = || CommandError::MissingArgument(format!("{} argument", spec.verb));
    match spec.arg {
        ArgKind::None => Ok(()),
        ArgKind::Int | ArgKind::Str | ArgKind::Document => argument.map(|_| ()).ok_or_else(missing),
        ArgKind::Pair => match argument {
            Some(pair) if pair.contains('=') => Ok(()),
            _ => Err(missing()),
        },
    }
}

fn log_failure(result: &CommandResult<Response>) {
    if let Err(err) = result {
        debug!(code = err.code().as_u16(), error = %err, "Command failed");
    }
}
