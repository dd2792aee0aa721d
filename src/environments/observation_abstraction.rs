use std::collections::BTreeSet;
use serde::{Serialize, Deserialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};
use crate::environments::controllers::{block_is_grasped, block_type, ControllerConfig};
use crate::environments::raw_observation::{BlockAttributes, RawObservation};
use crate::environments::symbolic::{Literal, LiteralSetSpace, Predicate};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum ObservationPredicate {
    On,
    OnTable,
    Holding,
    Clear,
    HandEmpty
}
impl ObservationPredicate {
    pub fn predicate(&self) -> Predicate {
        match self {
            ObservationPredicate::On => { Predicate::new("on", vec![block_type(), block_type()]) }
            ObservationPredicate::OnTable => { Predicate::new("ontable", vec![block_type()]) }
            ObservationPredicate::Holding => { Predicate::new("holding", vec![block_type()]) }
            ObservationPredicate::Clear => { Predicate::new("clear", vec![block_type()]) }
            ObservationPredicate::HandEmpty => { Predicate::new("handempty", vec![]) }
        }
    }
    pub fn all_predicates() -> Vec<Predicate> {
        ObservationPredicate::iter().map(|p| p.predicate()).collect()
    }
    pub fn observation_space() -> LiteralSetSpace {
        LiteralSetSpace::new(Self::all_predicates().into_iter().collect())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObservationAbstractionMode {
    /// Every block is asserted to be on the table, regardless of where it actually is.
    OnTableOnly,
    /// Support, grasp and clearance relations are derived from block geometry.
    Geometric
}
impl Default for ObservationAbstractionMode {
    fn default() -> Self {
        ObservationAbstractionMode::Geometric
    }
}

/// Maps a raw observation to the set of observation literals that hold in it.  Deterministic and
/// free of side effects.
///
/// In `Geometric` mode:
/// * `holding(a)`: `a` is grasped under the controller's grasp test.
/// * `handempty()`: no block is held.
/// * `on(a, b)`: neither is held, their footprints overlap, and the bottom of `a` is within
///   `support_tolerance` of the top of `b`.
/// * `ontable(a)`: `a` is neither held nor on another block.
/// * `clear(a)`: `a` is not held and no block is on it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ObservationAbstraction {
    mode: ObservationAbstractionMode,
    grasp_config: ControllerConfig,
    support_tolerance: f64
}
impl ObservationAbstraction {
    pub fn new(mode: ObservationAbstractionMode, grasp_config: ControllerConfig) -> Self {
        Self { mode, grasp_config, support_tolerance: 0.01 }
    }
    pub fn with_support_tolerance(mut self, support_tolerance: f64) -> Self {
        self.support_tolerance = support_tolerance;
        self
    }
    pub fn mode(&self) -> ObservationAbstractionMode {
        self.mode
    }
    pub fn support_tolerance(&self) -> f64 {
        self.support_tolerance
    }
    pub fn get_observation(&self, raw_observation: &RawObservation) -> BTreeSet<Literal> {
        match self.mode {
            ObservationAbstractionMode::OnTableOnly => { self.get_on_table_only_observation(raw_observation) }
            ObservationAbstractionMode::Geometric => { self.get_geometric_observation(raw_observation) }
        }
    }

    fn get_on_table_only_observation(&self, raw_observation: &RawObservation) -> BTreeSet<Literal> {
        let ontable = ObservationPredicate::OnTable.predicate();
        raw_observation.blocks.keys().filter_map(|name| ontable.ground(&[name.as_str()]).ok()).collect()
    }
    fn get_geometric_observation(&self, raw_observation: &RawObservation) -> BTreeSet<Literal> {
        let gripper = &raw_observation.gripper;
        let held: BTreeSet<&String> = raw_observation.blocks.iter()
            .filter(|(_, b)| block_is_grasped(&self.grasp_config, gripper.left_finger_position, &gripper.position, &b.position))
            .map(|(name, _)| name)
            .collect();

        let mut on_pairs = vec![];
        for (top_name, top) in &raw_observation.blocks {
            if held.contains(&top_name) { continue; }
            for (bottom_name, bottom) in &raw_observation.blocks {
                if top_name == bottom_name || held.contains(&bottom_name) { continue; }
                if self.rests_on(top, bottom) {
                    on_pairs.push((top_name.as_str(), bottom_name.as_str()));
                }
            }
        }

        let mut out_set = BTreeSet::new();
        let mut push = |p: ObservationPredicate, args: &[&str]| {
            if let Ok(l) = p.predicate().ground(args) { out_set.insert(l); }
        };

        for (top, bottom) in &on_pairs {
            push(ObservationPredicate::On, &[*top, *bottom]);
        }
        for name in raw_observation.blocks.keys() {
            if held.contains(&name) {
                push(ObservationPredicate::Holding, &[name.as_str()]);
                continue;
            }
            if !on_pairs.iter().any(|(t, _)| *t == name.as_str()) {
                push(ObservationPredicate::OnTable, &[name.as_str()]);
            }
            if !on_pairs.iter().any(|(_, b)| *b == name.as_str()) {
                push(ObservationPredicate::Clear, &[name.as_str()]);
            }
        }
        if held.is_empty() {
            push(ObservationPredicate::HandEmpty, &[]);
        }

        out_set
    }
    fn rests_on(&self, top: &BlockAttributes, bottom: &BlockAttributes) -> bool {
        let overlaps_x = (top.position.x - bottom.position.x).abs() < (top.width + bottom.width) / 2.0;
        let overlaps_y = (top.position.y - bottom.position.y).abs() < (top.length + bottom.length) / 2.0;
        overlaps_x && overlaps_y && (top.bottom() - bottom.top()).abs() <= self.support_tolerance
    }
}
impl Default for ObservationAbstraction {
    fn default() -> Self {
        Self::new(ObservationAbstractionMode::default(), ControllerConfig::default())
    }
}
