//! Transfer Command
//!
//! XFER moves the whole playlist of the addressed unit into the unit named
//! by the argument (`U<n>`). Every refused precondition reports an invalid
//! unit.

use tracing::info;

use super::context::{parse_unit_id, CommandContext};
use super::response::Response;
use super::rejected;
use crate::unit::UnitRegistry;
use crate::{CommandError, CommandResult};

pub fn transfer(registry: &dyn UnitRegistry, ctx: &CommandContext<'_>) -> CommandResult<Response> {
    let src = ctx.resolve_unit(registry)?;

    let dest_token = ctx.argument.unwrap_or_default();
    let dest_id = parse_unit_id(dest_token)
        .ok_or_else(|| CommandError::InvalidUnit(format!("bad destination '{dest_token}'")))?;
    let dest = registry
        .resolve(dest_id)
        .ok_or_else(|| CommandError::InvalidUnit(format!("U{dest_id}")))?;

    if dest.is_offline() {
        return Err(CommandError::InvalidUnit(format!("U{dest_id} is offline")));
    }
    if dest.id() == src.id() {
        return Err(CommandError::InvalidUnit(format!("U{dest_id} is the source")));
    }

    src.transfer(dest.as_ref())
        .map_err(|e| rejected("transfer", e))?;
    info!(from = src.id(), to = dest_id, "Transferred playlist");
    Ok(Response::ok())
}
