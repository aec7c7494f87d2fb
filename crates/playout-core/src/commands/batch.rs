//! Batch Ordering
//!
//! Computes application orders for multi-item playlist mutations so that
//! earlier steps never invalidate indices referenced by later ones. Every
//! index a caller supplies is relative to the playlist as it stood before
//! the batch began.

use crate::{ClipIndex, Frame, UNSPECIFIED_POINT};

/// Tokens per INSERT clip group: path, target index, in, out
pub const INSERT_GROUP: usize = 4;

/// Tokens per APND clip group: path, in, out
pub const APPEND_GROUP: usize = 3;

/// One clip of a batched INSERT or APND, already validated
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClipSpec {
    /// Resolved resource locator
    pub resource: String,
    /// Insertion index; `-1` lets the engine pick (append)
    pub target_index: ClipIndex,
    pub in_point: Frame,
    pub out_point: Frame,
}

impl ClipSpec {
    /// A clip covering the whole media at the engine's default index
    pub fn new(resource: String) -> Self {
        Self {
            resource,
            target_index: -1,
            in_point: UNSPECIFIED_POINT,
            out_point: UNSPECIFIED_POINT,
        }
    }

    pub fn at(mut self, target_index: ClipIndex) -> Self {
        self.target_index = target_index;
        self
    }

    pub fn with_points(mut self, in_point: Frame, out_point: Frame) -> Self {
        self.in_point = in_point;
        self.out_point = out_point;
        self
    }
}

/// Number of clip groups in the argument tokens, never less than one
pub fn group_count(token_count: usize, first_arg: usize, group_size: usize) -> usize {
    (token_count.saturating_sub(first_arg) / group_size).max(1)
}

/// Orders clips by descending target index.
///
/// Inserting the highest index first leaves the lower, still pending
/// targets untouched. The sort is stable: clips sharing a target are
/// inserted in input order.
pub fn insertion_order(mut clips: Vec<ClipSpec>) -> Vec<ClipSpec> {
    clips.sort_by(|a, b| b.target_index.cmp(&a.target_index));
    clips
}

/// Orders removal indices from highest to lowest
pub fn removal_order(mut indices: Vec<ClipIndex>) -> Vec<ClipIndex> {
    indices.sort_unstable_by(|a, b| b.cmp(a));
    indices
}

/// Expands a MOVE request into its individual `(src, dest)` steps.
///
/// Moving forward repeats the same pair, promoting whatever slides into
/// `src` each time. Moving backward shifts a contiguous run: both ends
/// advance by one per step. Steps are produced lazily so a rejected move
/// ends the expansion early. A step whose indices overflow yields `None`.
pub fn move_steps(
    src: ClipIndex,
    dest: ClipIndex,
    count: i32,
) -> impl Iterator<Item = Option<(ClipIndex, ClipIndex)>> {
    (0..count.max(0)).map(move |i| {
        if dest > src {
            Some((src, dest))
        } else {
            Some((src.checked_add(i)?, dest.checked_add(i)?))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply_inserts(playlist: &mut Vec<String>, clips: &[ClipSpec]) {
        for clip in insertion_order(clips.to_vec()) {
            let index = clip.target_index;
            if index < 0 || index as usize > playlist.len() {
                playlist.push(clip.resource);
            } else {
                playlist.insert(index as usize, clip.resource);
            }
        }
    }

    #[test]
    fn test_group_count_has_floor_of_one() {
        assert_eq!(group_count(2, 2, INSERT_GROUP), 1);
        assert_eq!(group_count(3, 2, INSERT_GROUP), 1);
        assert_eq!(group_count(10, 2, INSERT_GROUP), 2);
        assert_eq!(group_count(11, 2, APPEND_GROUP), 3);
        assert_eq!(group_count(0, 2, APPEND_GROUP), 1);
    }

    #[test]
    fn test_insertion_order_is_descending() {
        let clips = vec![
            ClipSpec::new("a".into()).at(1),
            ClipSpec::new("b".into()).at(5),
            ClipSpec::new("c".into()).at(3),
        ];
        let ordered: Vec<_> = insertion_order(clips)
            .into_iter()
            .map(|c| c.target_index)
            .collect();
        assert_eq!(ordered, vec![5, 3, 1]);
    }

    #[test]
    fn test_insertion_order_keeps_ties_in_input_order() {
        let clips = vec![
            ClipSpec::new("first".into()).at(2),
            ClipSpec::new("high".into()).at(4),
            ClipSpec::new("second".into()).at(2),
        ];
        let ordered: Vec<_> = insertion_order(clips)
            .into_iter()
            .map(|c| c.resource)
            .collect();
        assert_eq!(ordered, vec!["high", "first", "second"]);
    }

    #[test]
    fn test_default_targets_go_last() {
        let clips = vec![ClipSpec::new("x".into()), ClipSpec::new("y".into()).at(0)];
        let ordered: Vec<_> = insertion_order(clips)
            .into_iter()
            .map(|c| c.resource)
            .collect();
        assert_eq!(ordered, vec!["y", "x"]);
    }

    #[test]
    fn test_increasing_targets_land_before_original_items() {
        let original: Vec<String> = (0..6).map(|i| format!("item{i}")).collect();
        let mut playlist = original.clone();
        let clips = vec![
            ClipSpec::new("new1".into()).at(1),
            ClipSpec::new("new3".into()).at(3),
            ClipSpec::new("new5".into()).at(5),
        ];

        apply_inserts(&mut playlist, &clips);

        assert_eq!(playlist.len(), original.len() + clips.len());
        for clip in &clips {
            let pos = playlist.iter().position(|r| *r == clip.resource).unwrap();
            // Each clip sits immediately before the item that held its
            // target index before the batch.
            assert_eq!(playlist[pos + 1], original[clip.target_index as usize]);
        }
    }

    #[test]
    fn test_removal_removes_original_items_regardless_of_input_order() {
        let original: Vec<String> = (0..10).map(|i| format!("item{i}")).collect();
        let mut playlist = original.clone();

        for index in removal_order(vec![5, 2, 7]) {
            playlist.remove(index as usize);
        }

        assert_eq!(playlist.len(), 7);
        for gone in ["item2", "item5", "item7"] {
            assert!(!playlist.iter().any(|r| r == gone));
        }
    }

    #[test]
    fn test_move_forward_repeats_pair() {
        let steps: Vec<_> = move_steps(2, 5, 3).flatten().collect();
        assert_eq!(steps, vec![(2, 5), (2, 5), (2, 5)]);
    }

    #[test]
    fn test_move_backward_shifts_run() {
        let steps: Vec<_> = move_steps(2, 0, 3).flatten().collect();
        assert_eq!(steps, vec![(2, 0), (3, 1), (4, 2)]);
        let steps: Vec<_> = move_steps(3, 3, 2).flatten().collect();
        assert_eq!(steps, vec![(3, 3), (4, 4)]);
    }

    #[test]
    fn test_move_non_positive_count_is_empty() {
        assert_eq!(move_steps(1, 4, 0).count(), 0);
        assert_eq!(move_steps(1, 4, -2).count(), 0);
    }

    #[test]
    fn test_move_backward_overflow_yields_none() {
        let steps: Vec<_> = move_steps(ClipIndex::MAX, 0, 2).collect();
        assert_eq!(steps, vec![Some((ClipIndex::MAX, 0)), None]);
    }

    #[test]
    fn test_move_steps_are_lazy() {
        let mut steps = move_steps(0, 5, i32::MAX);
        assert_eq!(steps.next(), Some(Some((0, 5))));
    }
}
