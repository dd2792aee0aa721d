use std::collections::BTreeMap;
use nalgebra::{UnitQuaternion, Vector3};
use serde::{Serialize, Deserialize};
use crate::utils::utils_console::{blocksim_print_labeled, PrintColor};

/// Continuous snapshot of the world produced by a low-level environment once per step.
///
/// Blocks are keyed by name (`block0`, `block1`, ...), so iteration order is deterministic.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RawObservation {
    pub gripper: GripperObservation,
    pub blocks: BTreeMap<String, BlockAttributes>
}
impl RawObservation {
    pub fn new(gripper: GripperObservation) -> Self {
        Self { gripper, blocks: BTreeMap::new() }
    }
    pub fn with_block(mut self, name: &str, attributes: BlockAttributes) -> Self {
        self.blocks.insert(name.to_string(), attributes);
        self
    }
    pub fn get_block(&self, name: &str) -> Option<&BlockAttributes> {
        self.blocks.get(name)
    }
    pub fn block_names(&self) -> Vec<String> {
        self.blocks.keys().cloned().collect()
    }
    pub fn print_summary(&self) {
        blocksim_print_labeled("gripper ---> ", &format!("position {:?}, finger {}", self.gripper.position.as_slice(), self.gripper.left_finger_position), PrintColor::Blue);
        for (name, b) in &self.blocks {
            blocksim_print_labeled(&format!("{} ---> ", name), &format!("position {:?}, size ({}, {}, {})", b.position.as_slice(), b.width, b.length, b.height), PrintColor::Cyan);
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GripperObservation {
    /// End effector position.
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    /// Opening of one finger; both fingers move symmetrically.
    pub left_finger_position: f64
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BlockAttributes {
    pub width: f64,
    pub length: f64,
    pub height: f64,
    pub position: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
    pub mass: f64,
    pub friction: f64
}
impl BlockAttributes {
    /// An axis-aligned cube with unit mass and friction.
    pub fn new_cube(size: f64, position: Vector3<f64>) -> Self {
        Self {
            width: size,
            length: size,
            height: size,
            position,
            orientation: UnitQuaternion::identity(),
            mass: 1.0,
            friction: 1.0
        }
    }
    pub fn top(&self) -> f64 {
        self.position.z + self.height / 2.0
    }
    pub fn bottom(&self) -> f64 {
        self.position.z - self.height / 2.0
    }
}
