/// Match planning
///
/// Streams the probe layer against the build-side [`KeyIndex`] and yields the
/// (a, b) id pairs that define the output rows of a join.
use fxhash::FxHashSet;
use std::collections::VecDeque;
use tracing::debug;

use super::key_index::KeyIndex;
use crate::error::{JoinError, JoinResult};
use crate::layer::{Feature, FeatureId, LayerSource};

/// Join flavour
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JoinMode {
    Inner,
    Left,
    Right,
    Full,
}

/// One side of a join
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    A,
    B,
}

impl JoinMode {
    /// Side whose features are indexed
    pub fn build_side(&self) -> Side {
        match self {
            JoinMode::Right => Side::A,
            JoinMode::Inner | JoinMode::Left | JoinMode::Full => Side::B,
        }
    }

    /// Side streamed against the index
    pub fn probe_side(&self) -> Side {
        match self.build_side() {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    /// Whether probe features without a match still produce a row
    fn keeps_unmatched_probe(&self) -> bool {
        !matches!(self, JoinMode::Inner)
    }
}

impl std::fmt::Display for JoinMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinMode::Inner => write!(f, "inner"),
            JoinMode::Left => write!(f, "left"),
            JoinMode::Right => write!(f, "right"),
            JoinMode::Full => write!(f, "full"),
        }
    }
}

/// Ids of the a-side and b-side features of one output row
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MatchPair {
    pub a: Option<FeatureId>,
    pub b: Option<FeatureId>,
}

impl MatchPair {
    pub fn new(a: Option<FeatureId>, b: Option<FeatureId>) -> Self {
        Self { a, b }
    }

    /// Order (probe, build) ids as (a, b)
    fn oriented(probe_side: Side, probe: Option<FeatureId>, build: Option<FeatureId>) -> Self {
        match probe_side {
            Side::A => Self::new(probe, build),
            Side::B => Self::new(build, probe),
        }
    }
}

enum Phase {
    Probing,
    Trailing(usize),
    Done,
}

/// Lazy sequence of [`MatchPair`]s
pub struct MatchPlan<'a> {
    mode: JoinMode,
    index: &'a KeyIndex,
    probe: Box<dyn Iterator<Item = (FeatureId, &'a Feature)> + 'a>,
    probe_key_field: &'a str,
    pending: VecDeque<MatchPair>,
    matched_build_ids: FxHashSet<FeatureId>,
    phase: Phase,
}

impl<'a> MatchPlan<'a> {
    /// Queue the pairs of the next probe feature; false once probing ends
    fn advance_probe(&mut self) -> bool {
        let Some((probe_id, feature)) = self.probe.next() else {
            return false;
        };
        let index = self.index;
        let probe_side = self.mode.probe_side();
        let matches = feature
            .attribute(self.probe_key_field)
            .map(|key| index.probe(key))
            .unwrap_or(&[]);

        if matches.is_empty() {
            if self.mode.keeps_unmatched_probe() {
                self.pending
                    .push_back(MatchPair::oriented(probe_side, Some(probe_id), None));
            }
            return true;
        }

        for &build_id in matches {
            if self.mode == JoinMode::Full {
                self.matched_build_ids.insert(build_id);
            }
            self.pending
                .push_back(MatchPair::oriented(probe_side, Some(probe_id), Some(build_id)));
        }
        true
    }
}

impl<'a> Iterator for MatchPlan<'a> {
    type Item = MatchPair;

    fn next(&mut self) -> Option<MatchPair> {
        loop {
            if let Some(pair) = self.pending.pop_front() {
                return Some(pair);
            }
            match self.phase {
                Phase::Probing => {
                    if !self.advance_probe() {
                        self.phase = if self.mode == JoinMode::Full {
                            Phase::Trailing(0)
                        } else {
                            Phase::Done
                        };
                    }
                }
                Phase::Trailing(position) => {
                    let Some(&build_id) = self.index.record_ids().get(position) else {
                        self.phase = Phase::Done;
                        continue;
                    };
                    self.phase = Phase::Trailing(position + 1);
                    if !self.matched_build_ids.contains(&build_id) {
                        let probe_side = self.mode.probe_side();
                        return Some(MatchPair::oriented(probe_side, None, Some(build_id)));
                    }
                }
                Phase::Done => return None,
            }
        }
    }
}

/// Plan the output rows of a join
///
/// `index` must be built over the mode's build side and `probe_layer` must be
/// the mode's probe side. Fails with `FieldMissing` when `probe_key_field` is
/// not in the probe layer schema.
pub fn plan_matches<'a, P>(
    mode: JoinMode,
    index: &'a KeyIndex,
    probe_layer: &'a P,
    probe_key_field: &'a str,
) -> JoinResult<MatchPlan<'a>>
where
    P: LayerSource + ?Sized,
{
    if !probe_layer.schema().contains(probe_key_field) {
        return Err(JoinError::field_missing_in(probe_key_field, probe_layer.name()));
    }

    debug!(
        "Planning {} join: build side {:?} ({} keys), probe side {:?} ({})",
        mode,
        mode.build_side(),
        index.num_keys(),
        mode.probe_side(),
        probe_layer.name()
    );

    Ok(MatchPlan {
        mode,
        index,
        probe: probe_layer.features(),
        probe_key_field,
        pending: VecDeque::new(),
        matched_build_ids: FxHashSet::default(),
        phase: Phase::Probing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::{FieldDefinition, FieldType, Layer, Schema, Value};

    fn keyed_layer(name: &str, keys: &[Option<i64>]) -> Layer {
        let schema = Schema::new()
            .with_field("key_id", FieldDefinition::new(FieldType::Integer))
            .unwrap();
        Layer::new(name, schema).with_features(
            keys.iter()
                .map(|key| Feature::new().with_attribute("key_id", Value::from(*key))),
        )
    }

    fn plan(mode: JoinMode, a: &Layer, b: &Layer) -> Vec<(Option<FeatureId>, Option<FeatureId>)> {
        let (build, probe) = match mode.build_side() {
            Side::A => (a, b),
            Side::B => (b, a),
        };
        let index = KeyIndex::build(build, "key_id").unwrap();
        plan_matches(mode, &index, probe, "key_id")
            .unwrap()
            .map(|pair| (pair.a, pair.b))
            .collect()
    }

    #[test]
    fn test_inner_fan_out() {
        let a = keyed_layer("a", &[Some(1), Some(2), Some(1)]);
        let b = keyed_layer("b", &[Some(1), Some(3), Some(1)]);

        assert_eq!(
            plan(JoinMode::Inner, &a, &b),
            vec![
                (Some(0), Some(0)),
                (Some(0), Some(2)),
                (Some(2), Some(0)),
                (Some(2), Some(2)),
            ]
        );
    }

    #[test]
    fn test_left_keeps_unmatched_probe() {
        let a = keyed_layer("a", &[Some(1), None, Some(9)]);
        let b = keyed_layer("b", &[Some(1), None]);

        assert_eq!(
            plan(JoinMode::Left, &a, &b),
            vec![(Some(0), Some(0)), (Some(1), None), (Some(2), None)]
        );
    }

    #[test]
    fn test_right_swaps_orientation() {
        let a = keyed_layer("a", &[Some(164)]);
        let b = keyed_layer("b", &[Some(0), Some(164)]);

        assert_eq!(
            plan(JoinMode::Right, &a, &b),
            vec![(None, Some(0)), (Some(0), Some(1))]
        );
    }

    #[test]
    fn test_full_appends_unmatched_build_in_native_order() {
        let a = keyed_layer("a", &[Some(2), Some(7)]);
        let b = keyed_layer("b", &[Some(5), None, Some(2), Some(6)]);

        assert_eq!(
            plan(JoinMode::Full, &a, &b),
            vec![
                (Some(0), Some(2)),
                (Some(1), None),
                (None, Some(0)),
                (None, Some(1)),
                (None, Some(3)),
            ]
        );
    }

    #[test]
    fn test_null_keys_do_not_match_each_other() {
        let a = keyed_layer("a", &[None]);
        let b = keyed_layer("b", &[None]);

        assert!(plan(JoinMode::Inner, &a, &b).is_empty());
        assert_eq!(plan(JoinMode::Full, &a, &b), vec![(Some(0), None), (None, Some(0))]);
    }

    #[test]
    fn test_missing_probe_key_field() {
        let a = keyed_layer("a", &[Some(1)]);
        let index = KeyIndex::build(&a, "key_id").unwrap();
        let err = plan_matches(JoinMode::Inner, &index, &a, "CODE_DEPT").err().unwrap();
        assert_eq!(err, JoinError::field_missing_in("CODE_DEPT", "a"));
    }

    #[test]
    fn test_build_sides() {
        assert_eq!(JoinMode::Inner.build_side(), Side::B);
        assert_eq!(JoinMode::Left.build_side(), Side::B);
        assert_eq!(JoinMode::Full.build_side(), Side::B);
        assert_eq!(JoinMode::Right.build_side(), Side::A);
        assert_eq!(JoinMode::Right.probe_side(), Side::B);
    }
}
