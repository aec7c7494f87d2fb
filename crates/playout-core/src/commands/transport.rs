//! Transport Commands
//!
//! PLAY, STOP, PAUSE, REW, FF, STEP and GOTO.
//!
//! PLAY, STOP and PAUSE accept the broadcast target and apply the same
//! action to every resolvable unit in `[0, MAX_UNITS)`, one after the
//! other. A broadcast that reaches no unit is still a success.

use tracing::{debug, info};

use super::context::{CommandContext, UnitTarget, FIRST_ARG};
use super::response::Response;
use crate::unit::{Unit, UnitRegistry};
use crate::{
    CommandError, CommandResult, FAST_FORWARD_SPEED, MAX_UNITS, NORMAL_SPEED, REWIND_SPEED,
};

/// Applies `action` to the target unit, or to every live unit on broadcast.
///
/// Not atomic across units: units visited before a failure stay actioned.
fn for_each_target(
    registry: &dyn UnitRegistry,
    target: UnitTarget,
    action: impl Fn(&dyn Unit),
) -> CommandResult<()> {
    match target {
        UnitTarget::Single(id) => {
            let unit = registry
                .resolve(id)
                .ok_or_else(|| CommandError::InvalidUnit(target.to_string()))?;
            action(unit.as_ref());
        }
        UnitTarget::Broadcast => {
            let mut actioned = 0;
            for id in 0..MAX_UNITS {
                if let Some(unit) = registry.resolve(id) {
                    action(unit.as_ref());
                    actioned += 1;
                }
            }
            info!(units = actioned, "Broadcast transport command");
        }
    }
    Ok(())
}

/// Plays at normal speed, or at the speed given as the sole argument
pub fn play(registry: &dyn UnitRegistry, ctx: &CommandContext<'_>) -> CommandResult<Response> {
    let speed = if ctx.token_count() == FIRST_ARG + 1 {
        ctx.require_int(FIRST_ARG, "speed")?
    } else {
        NORMAL_SPEED
    };
    for_each_target(registry, ctx.target, |unit| unit.play(speed))?;
    debug!(speed, "Play");
    Ok(Response::ok())
}

pub fn stop(registry: &dyn UnitRegistry, ctx: &CommandContext<'_>) -> CommandResult<Response> {
    for_each_target(registry, ctx.target, |unit| unit.terminate())?;
    Ok(Response::ok())
}

/// Play at speed 0
pub fn pause(registry: &dyn UnitRegistry, ctx: &CommandContext<'_>) -> CommandResult<Response> {
    for_each_target(registry, ctx.target, |unit| unit.play(0))?;
    Ok(Response::ok())
}

/// Plays backwards, or returns to the start once playback has ended
pub fn rewind(registry: &dyn UnitRegistry, ctx: &CommandContext<'_>) -> CommandResult<Response> {
    let unit = ctx.resolve_unit(registry)?;
    if unit.has_terminated() {
        unit.change_position(0, 0);
    } else {
        unit.play(REWIND_SPEED);
    }
    Ok(Response::ok())
}

/// Plays fast forward, or returns to the start once playback has ended
pub fn fast_forward(
    registry: &dyn UnitRegistry,
    ctx: &CommandContext<'_>,
) -> CommandResult<Response> {
    let unit = ctx.resolve_unit(registry)?;
    if unit.has_terminated() {
        unit.change_position(0, 0);
    } else {
        unit.play(FAST_FORWARD_SPEED);
    }
    Ok(Response::ok())
}

/// Pauses, then steps by the signed frame count in the argument
pub fn step(registry: &dyn UnitRegistry, ctx: &CommandContext<'_>) -> CommandResult<Response> {
    let unit = ctx.resolve_unit(registry)?;
    let frames = ctx.int_argument("frames")?;
    unit.play(0);
    unit.step(frames);
    Ok(Response::ok())
}

/// Repositions to `frame` within the clip named by the optional clip token
pub fn goto(registry: &dyn UnitRegistry, ctx: &CommandContext<'_>) -> CommandResult<Response> {
    let unit = ctx.resolve_unit(registry)?;
    if unit.is_offline() {
        return Err(CommandError::InvalidUnit(format!("{} is offline", ctx.target)));
    }
    let position = ctx.int_argument("frame")?;
    let clip = ctx.clip_ref(FIRST_ARG + 1)?.resolve(unit.current_clip_index());
    unit.change_position(clip, position);
    debug!(clip, position, "Goto");
    Ok(Response::ok())
}
