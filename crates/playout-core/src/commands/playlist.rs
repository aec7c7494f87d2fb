//! Playlist Commands
//!
//! LOAD, LIST, INSERT, REMOVE, APND, MOVE, CLEAN, WIPE, CLEAR, PUSH and RCV.
//!
//! Batched commands are best-effort and non-transactional: each step is
//! applied as soon as it is accepted, and the first rejected step aborts
//! the command without rolling back the steps already applied. A caller
//! seeing a failure should inspect the playlist rather than assume it is
//! unchanged.

use tracing::debug;

use super::batch::{
    group_count, insertion_order, move_steps, removal_order, ClipSpec, APPEND_GROUP,
    INSERT_GROUP,
};
use super::context::{CommandContext, UnitTarget, FIRST_ARG};
use super::path::resolve_path;
use super::response::{Response, ResponseCode};
use super::rejected;
use crate::unit::{Service, ServiceFactory, UnitRegistry};
use crate::{CommandError, CommandResult, UNSPECIFIED_POINT};

/// Prefix on a LOAD filename that keeps the current playlist
const NO_FLUSH_MARKER: char = '!';

// =============================================================================
// LOAD / LIST
// =============================================================================

/// Loads a single clip, flushing the playlist unless the filename starts
/// with `!`. In/out points are read when exactly two follow the filename.
pub fn load(registry: &dyn UnitRegistry, ctx: &CommandContext<'_>) -> CommandResult<Response> {
    let unit = ctx.resolve_unit(registry)?;
    let argument = ctx.require_argument("clip")?;

    let (filename, flush) = match argument.strip_prefix(NO_FLUSH_MARKER) {
        Some(rest) => (rest, false),
        None => (argument, true),
    };
    let resource = resolve_path(ctx.root_dir, filename);

    let (in_point, out_point) = if ctx.token_count() == FIRST_ARG + 3 {
        (ctx.require_int(3, "in")?, ctx.require_int(4, "out")?)
    } else {
        (UNSPECIFIED_POINT, UNSPECIFIED_POINT)
    };

    unit.load(&resource, in_point, out_point, flush)
        .map_err(|e| rejected("load", e))?;
    debug!(%resource, in_point, out_point, flush, "Loaded clip");
    Ok(Response::ok())
}

/// Reports the playlist
pub fn list(registry: &dyn UnitRegistry, ctx: &CommandContext<'_>) -> CommandResult<Response> {
    let unit = ctx.resolve_unit(registry)?;
    let report = unit.report_list().map_err(|e| rejected("list", e))?;
    Ok(Response::with_payload(ResponseCode::Success, report.to_string()))
}

// =============================================================================
// INSERT / REMOVE / APND / MOVE
// =============================================================================

/// Inserts clip groups of `path [index in out]`.
///
/// Every path is checked before anything is inserted; insertion then runs
/// from the highest target index down so pending targets never shift. A
/// playlist that was empty before the batch is positioned at clip 0.
pub fn insert(registry: &dyn UnitRegistry, ctx: &CommandContext<'_>) -> CommandResult<Response> {
    let unit = ctx.resolve_unit(registry)?;

    let groups = group_count(ctx.token_count(), FIRST_ARG, INSERT_GROUP);
    let mut clips = Vec::with_capacity(groups);
    for group in 0..groups {
        let base = FIRST_ARG + group * INSERT_GROUP;
        let filename = ctx
            .token(base)
            .ok_or_else(|| CommandError::MissingArgument("clip".to_string()))?;
        let mut clip = ClipSpec::new(resolve_path(ctx.root_dir, filename));

        if ctx.token_count() > base + 3 {
            clip = clip
                .at(ctx.require_int(base + 1, "index")?)
                .with_points(ctx.require_int(base + 2, "in")?, ctx.require_int(base + 3, "out")?);
        }

        unit.check_clip(&clip.resource)
            .map_err(|e| rejected("insert", e))?;
        clips.push(clip);
    }

    let was_empty = unit.count() == 0;

    for clip in insertion_order(clips) {
        unit.insert(&clip.resource, clip.target_index, clip.in_point, clip.out_point)
            .map_err(|e| rejected("insert", e))?;
        debug!(resource = %clip.resource, index = clip.target_index, "Inserted clip");
    }

    if was_empty {
        unit.change_position(0, 0);
    }
    Ok(Response::ok())
}

/// Removes one clip per argument token (the current clip when none is
/// given), highest index first.
pub fn remove(registry: &dyn UnitRegistry, ctx: &CommandContext<'_>) -> CommandResult<Response> {
    let unit = ctx.resolve_unit(registry)?;

    let count = ctx.token_count().saturating_sub(FIRST_ARG).max(1);
    let mut indices = Vec::with_capacity(count);
    for offset in 0..count {
        let clip = ctx.clip_ref(FIRST_ARG + offset)?;
        indices.push(clip.resolve(unit.current_clip_index()));
    }

    for index in removal_order(indices) {
        unit.remove(index).map_err(|e| rejected("remove", e))?;
        debug!(index, "Removed clip");
    }
    Ok(Response::ok())
}

/// Appends clip groups of `path [in out]` in input order, after checking
/// every path.
pub fn append(registry: &dyn UnitRegistry, ctx: &CommandContext<'_>) -> CommandResult<Response> {
    let unit = ctx.resolve_unit(registry)?;

    let groups = group_count(ctx.token_count(), FIRST_ARG, APPEND_GROUP);
    let mut clips = Vec::with_capacity(groups);
    for group in 0..groups {
        let base = FIRST_ARG + group * APPEND_GROUP;
        let filename = ctx
            .token(base)
            .ok_or_else(|| CommandError::MissingArgument("clip".to_string()))?;
        let mut clip = ClipSpec::new(resolve_path(ctx.root_dir, filename));

        if ctx.token_count() > base + 2 {
            clip = clip.with_points(ctx.require_int(base + 1, "in")?, ctx.require_int(base + 2, "out")?);
        }

        unit.check_clip(&clip.resource)
            .map_err(|e| rejected("append", e))?;
        clips.push(clip);
    }

    for clip in clips {
        unit.append(&clip.resource, clip.in_point, clip.out_point)
            .map_err(|e| rejected("append", e))?;
        debug!(resource = %clip.resource, "Appended clip");
    }
    Ok(Response::ok())
}

/// Moves `src` to `dest`, optionally repeated `count` times
pub fn move_clips(registry: &dyn UnitRegistry, ctx: &CommandContext<'_>) -> CommandResult<Response> {
    let unit = ctx.resolve_unit(registry)?;

    let count = ctx.int_token(4)?.unwrap_or(1);
    if ctx.token_count() < FIRST_ARG + 2 {
        return Err(CommandError::MissingArgument("source and destination".to_string()));
    }
    let src = ctx.require_int(2, "source")?;
    let dest = ctx.require_int(3, "destination")?;

    for step in move_steps(src, dest, count) {
        let (from, to) =
            step.ok_or_else(|| CommandError::BadFile("clip index out of range".to_string()))?;
        unit.move_clip(from, to).map_err(|e| rejected("move", e))?;
        debug!(from, to, "Moved clip");
    }
    Ok(Response::ok())
}

// =============================================================================
// CLEAN / WIPE / CLEAR
// =============================================================================

pub fn clean(registry: &dyn UnitRegistry, ctx: &CommandContext<'_>) -> CommandResult<Response> {
    let unit = ctx.resolve_unit(registry)?;
    unit.clean().map_err(|e| rejected("clean", e))?;
    Ok(Response::ok())
}

pub fn wipe(registry: &dyn UnitRegistry, ctx: &CommandContext<'_>) -> CommandResult<Response> {
    let unit = ctx.resolve_unit(registry)?;
    unit.wipe().map_err(|e| rejected("wipe", e))?;
    Ok(Response::ok())
}

pub fn clear(registry: &dyn UnitRegistry, ctx: &CommandContext<'_>) -> CommandResult<Response> {
    let unit = ctx.resolve_unit(registry)?;
    unit.clear().map_err(|e| rejected("clear", e))?;
    Ok(Response::ok())
}

// =============================================================================
// PUSH / RCV
// =============================================================================

/// Attaches an already-constructed service to the end of the playlist
pub fn push(
    registry: &dyn UnitRegistry,
    target: UnitTarget,
    service: Option<Service>,
) -> CommandResult<Response> {
    let unit = match target {
        UnitTarget::Single(id) => registry.resolve(id),
        UnitTarget::Broadcast => None,
    }
    .ok_or_else(|| CommandError::InvalidUnit(target.to_string()))?;

    let service = service.ok_or_else(|| CommandError::BadFile("no service".to_string()))?;
    unit.append_service(&service)
        .map_err(|e| rejected("push", e))?;
    Ok(Response::ok())
}

/// Builds a service from the inline document with the unit's own profile
/// and attaches it. The local service handle is dropped on every path.
pub fn receive(
    registry: &dyn UnitRegistry,
    factory: &dyn ServiceFactory,
    ctx: &CommandContext<'_>,
) -> CommandResult<Response> {
    let unit = ctx.resolve_unit(registry)?;
    let document = ctx.require_argument("document")?;

    let profile = unit.profile().map_err(|e| rejected("receive", e))?;
    let service = factory
        .from_document(&profile, document)
        .ok_or_else(|| CommandError::BadFile("unusable document".to_string()))?;

    unit.append_service(&service)
        .map_err(|e| rejected("receive", e))?;
    debug!(label = %service.label, entries = service.entries.len(), "Received service");
    Ok(Response::ok())
}
