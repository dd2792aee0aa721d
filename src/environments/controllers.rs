use std::str::FromStr;
use nalgebra::{Vector3, Vector4};
use serde::{Serialize, Deserialize};
use strum_macros::{Display, EnumIter, EnumString};
use tracing::debug;
use crate::environments::raw_observation::RawObservation;
use crate::environments::symbolic::{Predicate, Type};
use crate::utils::utils_errors::BlocksimError;

/// End effector displacement (x, y, z) followed by the gripper actuation command.  Each component
/// is nominally in `[-1, 1]` and scaled by the low-level environment.
pub type ControlVector = Vector4<f64>;

pub fn block_type() -> Type {
    Type::new("block")
}

/// The fixed set of symbolic actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumIter, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ActionKind {
    Pickup,
    PutOn,
    PutOnTable
}
impl ActionKind {
    pub fn predicate(&self) -> Predicate {
        match self {
            ActionKind::Pickup => { Predicate::new("pickup", vec![block_type()]) }
            ActionKind::PutOn => { Predicate::new("puton", vec![block_type()]) }
            ActionKind::PutOnTable => { Predicate::new("putontable", vec![]) }
        }
    }
    pub fn from_predicate_name(name: &str) -> Result<Self, BlocksimError> {
        ActionKind::from_str(name).map_err(|_| BlocksimError::new_unregistered_action_error(name, file!(), line!()))
    }
}

/// The phase a pickup is in, inferred from a single observation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumIter)]
pub enum GraspPhase {
    MoveAboveTarget,
    OpenGrippers,
    DescendToGrasp,
    CloseGrippers,
    LiftToPickHeight,
    Done
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ControllerConfig {
    /// Shared tolerance of every threshold comparison.
    pub atol: f64,
    /// Proportional gain of move actions.
    pub gain: f64,
    pub pick_height: f64,
    /// Height above the grasp target the gripper approaches first.
    pub workspace_height: f64,
    /// Expected gripper position minus block position while grasping.
    pub relative_grasp_position: Vector3<f64>,
    pub finger_closed_aperture: f64,
    pub finger_open_aperture: f64,
    pub done_gripper_command: f64,
    pub lift_gripper_command: f64,
    pub close_gripper_command: f64,
    pub open_gripper_command: f64,
    /// Gripper command of a move action that also closes the gripper.
    pub move_close_gripper_command: f64
}
impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            atol: 1e-3,
            gain: 10.0,
            pick_height: 0.7,
            workspace_height: 0.1,
            relative_grasp_position: Vector3::zeros(),
            finger_closed_aperture: 0.035,
            finger_open_aperture: 0.05,
            done_gripper_command: -0.01,
            lift_gripper_command: -0.01,
            close_gripper_command: -1.0,
            open_gripper_command: 1.0,
            move_close_gripper_command: -0.1
        }
    }
}

/// Proportional move toward `target_position`.
pub fn get_move_action(config: &ControllerConfig, gripper_position: &Vector3<f64>, target_position: &Vector3<f64>, close_gripper: bool) -> ControlVector {
    let action = (target_position - gripper_position) * config.gain;
    let gripper_action = if close_gripper { config.move_close_gripper_command } else { 0.0 };
    ControlVector::new(action.x, action.y, action.z, gripper_action)
}

/// Squared distance between the observed and the expected grasp offset is strictly below `atol`.
pub fn block_inside_grippers(config: &ControllerConfig, gripper_position: &Vector3<f64>, block_position: &Vector3<f64>) -> bool {
    let relative_position = gripper_position - block_position;
    (relative_position - config.relative_grasp_position).norm_squared() < config.atol
}

pub fn grippers_are_closed(config: &ControllerConfig, left_finger_position: f64) -> bool {
    left_finger_position.abs() - config.finger_closed_aperture <= config.atol
}

pub fn grippers_are_open(config: &ControllerConfig, left_finger_position: f64) -> bool {
    (left_finger_position - config.finger_open_aperture).abs() <= config.atol
}

pub fn block_is_grasped(config: &ControllerConfig, left_finger_position: f64, gripper_position: &Vector3<f64>, block_position: &Vector3<f64>) -> bool {
    let block_inside = block_inside_grippers(config, gripper_position, block_position);
    let grippers_closed = grippers_are_closed(config, left_finger_position);
    block_inside && grippers_closed
}

/// Infers the pickup phase from scratch.  Checks run in priority order, so the result does not
/// depend on which phase came before.
pub fn infer_grasp_phase(config: &ControllerConfig, gripper_position: &Vector3<f64>, left_finger_position: f64, block_position: &Vector3<f64>) -> GraspPhase {
    if block_position.z >= config.pick_height {
        return GraspPhase::Done;
    }
    if block_is_grasped(config, left_finger_position, gripper_position, block_position) {
        return GraspPhase::LiftToPickHeight;
    }
    if block_inside_grippers(config, gripper_position, block_position) {
        return GraspPhase::CloseGrippers;
    }

    let target_position = block_position + config.relative_grasp_position;
    let dx = gripper_position.x - target_position.x;
    let dy = gripper_position.y - target_position.y;
    if dx * dx + dy * dy < config.atol {
        if !grippers_are_open(config, left_finger_position) {
            return GraspPhase::OpenGrippers;
        }
        return GraspPhase::DescendToGrasp;
    }

    GraspPhase::MoveAboveTarget
}

/// One pickup control decision.  Returns the control vector and whether the pickup is done.
pub fn pickup_policy(config: &ControllerConfig, observation: &RawObservation, block_name: &str) -> Result<(ControlVector, bool), BlocksimError> {
    let block = match observation.get_block(block_name) {
        None => { return Err(BlocksimError::new_generic_error_str(&format!("block {} is not part of the observation.", block_name), file!(), line!())); }
        Some(b) => { b }
    };
    let gripper_position = &observation.gripper.position;
    let block_position = &block.position;

    let phase = infer_grasp_phase(config, gripper_position, observation.gripper.left_finger_position, block_position);
    debug!(block = block_name, %phase, "pickup controller");

    let target_position = block_position + config.relative_grasp_position;
    let out = match phase {
        GraspPhase::Done => { (ControlVector::new(0., 0., 0., config.done_gripper_command), true) }
        GraspPhase::LiftToPickHeight => { (ControlVector::new(0., 0., sign(config.pick_height - block_position.z), config.lift_gripper_command), false) }
        GraspPhase::CloseGrippers => { (ControlVector::new(0., 0., 0., config.close_gripper_command), false) }
        GraspPhase::OpenGrippers => { (ControlVector::new(0., 0., 0., config.open_gripper_command), false) }
        GraspPhase::DescendToGrasp => { (get_move_action(config, gripper_position, &target_position, false), false) }
        GraspPhase::MoveAboveTarget => {
            let above = target_position + Vector3::new(0., 0., config.workspace_height);
            (get_move_action(config, gripper_position, &above, false), false)
        }
    };

    Ok(out)
}

fn sign(x: f64) -> f64 {
    if x > 0.0 { 1.0 } else if x < 0.0 { -1.0 } else { 0.0 }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PickupController {
    config: ControllerConfig
}
impl PickupController {
    pub fn new(config: ControllerConfig) -> Self {
        Self { config }
    }
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }
}

/// A controller for one action kind.  `step` is called once per tick with the latest observation
/// and returns the next control vector plus a completion flag.
///
/// Placing a block (`PutOn`, `PutOnTable`) is not implemented: those controllers finish
/// immediately with a zero control.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum ActionController {
    Pickup(PickupController),
    PutOn,
    PutOnTable
}
impl ActionController {
    pub fn new(kind: ActionKind, config: &ControllerConfig) -> Self {
        match kind {
            ActionKind::Pickup => { ActionController::Pickup(PickupController::new(config.clone())) }
            ActionKind::PutOn => { ActionController::PutOn }
            ActionKind::PutOnTable => { ActionController::PutOnTable }
        }
    }
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionController::Pickup(_) => { ActionKind::Pickup }
            ActionController::PutOn => { ActionKind::PutOn }
            ActionController::PutOnTable => { ActionKind::PutOnTable }
        }
    }
    pub fn step(&self, arguments: &[String], observation: &RawObservation) -> Result<(ControlVector, bool), BlocksimError> {
        let arity = self.kind().predicate().arity();
        if arguments.len() != arity {
            return Err(BlocksimError::new_generic_error_str(&format!("{} expects {} arguments, got {}.", self.kind(), arity, arguments.len()), file!(), line!()));
        }

        match self {
            ActionController::Pickup(c) => { pickup_policy(&c.config, observation, &arguments[0]) }
            ActionController::PutOn | ActionController::PutOnTable => { Ok((ControlVector::zeros(), true)) }
        }
    }
}
