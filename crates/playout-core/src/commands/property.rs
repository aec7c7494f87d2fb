//! Unit Status and Property Commands
//!
//! USTA reports transport status; USET, UGET and UDEL work on the unit's
//! string-keyed property map through a single `name=value` or `name`
//! argument.

use super::context::CommandContext;
use super::response::{Response, ResponseCode};
use super::rejected;
use crate::unit::UnitRegistry;
use crate::{CommandError, CommandResult};

/// Serialized status line of the unit
pub fn status(registry: &dyn UnitRegistry, ctx: &CommandContext<'_>) -> CommandResult<Response> {
    let unit = ctx.resolve_unit(registry)?;
    let status = unit
        .status()
        .map_err(|e| CommandError::InvalidUnit(e.to_string()))?;
    Ok(Response::with_payload(
        ResponseCode::SuccessWithPayload,
        status.to_string(),
    ))
}

pub fn set_property(
    registry: &dyn UnitRegistry,
    ctx: &CommandContext<'_>,
) -> CommandResult<Response> {
    let unit = ctx.resolve_unit(registry)?;
    let name_value = ctx.require_argument("name=value")?;
    unit.set_property(name_value)
        .map_err(|e| rejected("set property", e))?;
    Ok(Response::ok())
}

/// The value as a single payload line; an unset property yields no payload
pub fn get_property(
    registry: &dyn UnitRegistry,
    ctx: &CommandContext<'_>,
) -> CommandResult<Response> {
    let unit = ctx.resolve_unit(registry)?;
    let name = ctx.require_argument("name")?;
    let payload = unit
        .property(name)
        .map(|value| format!("{value}\n"))
        .unwrap_or_default();
    Ok(Response::with_payload(ResponseCode::Success, payload))
}

pub fn delete_property(
    registry: &dyn UnitRegistry,
    ctx: &CommandContext<'_>,
) -> CommandResult<Response> {
    let unit = ctx.resolve_unit(registry)?;
    let name = ctx.require_argument("name")?;
    unit.delete_property(name);
    Ok(Response::ok())
}
