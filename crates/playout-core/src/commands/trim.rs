//! Trim Commands
//!
//! SIN, SOUT and SOUTL: move a clip's in or out point. The engine tells
//! apart a clip that cannot be trimmed (bad file) from a position outside
//! the clip's range (out of range), and so do the responses.

use tracing::debug;

use super::context::{CommandContext, FIRST_ARG};
use super::response::Response;
use crate::unit::{Unit, UnitRegistry};
use crate::{ClipIndex, CommandResult, Frame, TrimError};

fn trim(
    registry: &dyn UnitRegistry,
    ctx: &CommandContext<'_>,
    apply: impl Fn(&dyn Unit, ClipIndex, Frame) -> Result<(), TrimError>,
) -> CommandResult<Response> {
    let unit = ctx.resolve_unit(registry)?;
    let position = ctx.int_argument("position")?;
    let clip = ctx.clip_ref(FIRST_ARG + 1)?.resolve(unit.current_clip_index());

    apply(unit.as_ref(), clip, position)?;
    debug!(clip, position, "Trimmed clip");
    Ok(Response::ok())
}

pub fn set_in_point(
    registry: &dyn UnitRegistry,
    ctx: &CommandContext<'_>,
) -> CommandResult<Response> {
    trim(registry, ctx, |unit, clip, position| unit.set_clip_in(clip, position))
}

pub fn set_out_point(
    registry: &dyn UnitRegistry,
    ctx: &CommandContext<'_>,
) -> CommandResult<Response> {
    trim(registry, ctx, |unit, clip, position| unit.set_clip_out(clip, position))
}

/// Out point change on a clip that may be on air
pub fn set_out_point_live(
    registry: &dyn UnitRegistry,
    ctx: &CommandContext<'_>,
) -> CommandResult<Response> {
    trim(registry, ctx, |unit, clip, position| {
        unit.set_clip_out_live(clip, position)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{Handler, ResponseCode, UnitTarget};
    use crate::test_support::{tokens, Call, RecordingRegistry, RecordingUnit};

    fn run(
        unit: RecordingUnit,
        line: &str,
        handler: Handler,
    ) -> (CommandResult<Response>, Vec<Call>) {
        let registry = RecordingRegistry::with(vec![unit]);
        let toks = tokens(line);
        let ctx = CommandContext::new(UnitTarget::Single(0), &toks, "");
        let result = handler(&registry, &ctx);
        (result, registry.unit(0).calls())
    }

    #[test]
    fn test_set_points_on_relative_clip() {
        let mut unit = RecordingUnit::new(0);
        unit.current_clip = 2;
        let (result, calls) = run(unit, "SIN U0 25 +1", set_in_point);
        assert!(result.is_ok());
        assert_eq!(calls, vec![Call::SetIn(3, 25)]);

        let (_, calls) = run(RecordingUnit::new(0), "SOUT U0 99", set_out_point);
        assert_eq!(calls, vec![Call::SetOut(0, 99)]);

        let (_, calls) = run(RecordingUnit::new(0), "SOUTL U0 50 4", set_out_point_live);
        assert_eq!(calls, vec![Call::SetOutLive(4, 50)]);
    }

    #[test]
    fn test_trim_failures_map_to_distinct_codes() {
        let mut unit = RecordingUnit::new(0);
        unit.trim_error = Some(TrimError::NotApplicable);
        let (result, _) = run(unit, "SIN U0 10", set_in_point);
        assert_eq!(result.unwrap_err().code(), ResponseCode::BadFile);

        let mut unit = RecordingUnit::new(0);
        unit.trim_error = Some(TrimError::OutOfRange);
        let (result, _) = run(unit, "SOUT U0 10", set_out_point);
        assert_eq!(result.unwrap_err().code(), ResponseCode::OutOfRange);

        let mut unit = RecordingUnit::new(0);
        unit.trim_error = Some(TrimError::OutOfRange);
        let (result, _) = run(unit, "SOUTL U0 10", set_out_point_live);
        assert_eq!(result.unwrap_err().code(), ResponseCode::OutOfRange);
    }

    #[test]
    fn test_trim_unknown_unit() {
        let registry = RecordingRegistry::default();
        let toks = tokens("SIN U5 10");
        let ctx = CommandContext::new(UnitTarget::Single(5), &toks, "");
        let err = set_in_point(&registry, &ctx).unwrap_err();
        assert_eq!(err.code(), ResponseCode::InvalidUnit);
    }
}
