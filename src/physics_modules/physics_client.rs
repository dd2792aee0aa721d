use nalgebra::{UnitQuaternion, Vector3};
use serde::{Serialize, Deserialize};
use crate::inverse_kinematics::JointLimits;
use crate::robot_modules::robot_model_module::RobotModelModule;
use crate::utils::utils_errors::BlocksimError;

pub type BodyHandle = usize;
pub type SnapshotId = usize;

/// The boundary to a rigid-body physics engine.
///
/// Everything that touches dynamics, contacts, or rendering goes through this trait.  Calls are
/// blocking and strictly sequential: a `step_tick` must complete before the next control decision
/// is computed.  Implementations are assumed reliable, so errors returned here are treated as
/// fatal by the callers (they are propagated, never retried).
///
/// Joint and link indices follow the usual engine convention: link `i` is the child link of joint `i`.
pub trait PhysicsClient {
    /// Removes every body and snapshot.
    fn reset_simulation(&mut self) -> Result<(), BlocksimError>;
    fn load_body(&mut self, spec: &BodySpec) -> Result<BodyHandle, BlocksimError>;
    fn remove_body(&mut self, body: BodyHandle) -> Result<(), BlocksimError>;
    fn set_base_pose(&mut self, body: BodyHandle, position: &Vector3<f64>, orientation: &UnitQuaternion<f64>) -> Result<(), BlocksimError>;
    fn get_base_pose(&self, body: BodyHandle) -> Result<(Vector3<f64>, UnitQuaternion<f64>), BlocksimError>;
    fn num_joints(&self, body: BodyHandle) -> Result<usize, BlocksimError>;
    fn get_joint_info(&self, body: BodyHandle, joint_idx: usize) -> Result<JointInfo, BlocksimError>;
    fn get_joint_state(&self, body: BodyHandle, joint_idx: usize) -> Result<f64, BlocksimError>;
    /// Teleports a joint to the given value (no dynamics involved).
    fn reset_joint_state(&mut self, body: BodyHandle, joint_idx: usize, value: f64) -> Result<(), BlocksimError>;
    /// Position-control command that is tracked over the following ticks.
    fn set_joint_target(&mut self, body: BodyHandle, joint_idx: usize, value: f64) -> Result<(), BlocksimError>;
    fn get_link_state(&self, body: BodyHandle, link_idx: usize) -> Result<LinkState, BlocksimError>;
    /// Numeric inverse kinematics over all free joints of the body.  The result has one entry per
    /// free joint (joints with a `q_idx`), ordered by `q_idx`.  Never fails because of an
    /// unreachable target; it returns a best-effort answer instead.
    fn calculate_inverse_kinematics(&self, body: BodyHandle, end_effector_link_idx: usize, target_position: &Vector3<f64>, target_orientation: &UnitQuaternion<f64>, limits: &JointLimits) -> Result<Vec<f64>, BlocksimError>;
    /// Advances all dynamics by one fixed timestep.
    fn step_tick(&mut self) -> Result<(), BlocksimError>;
    fn save_snapshot(&mut self) -> Result<SnapshotId, BlocksimError>;
    fn restore_snapshot(&mut self, snapshot: SnapshotId) -> Result<(), BlocksimError>;
    /// True when an interactive display is attached to this client.
    fn has_display(&self) -> bool;
    fn render(&self, camera: &CameraSpec) -> Result<PixelBuffer, BlocksimError>;
    fn disconnect(&mut self) -> Result<(), BlocksimError>;
}

/// What to load into the simulation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum BodySpec {
    /// An infinite ground plane at the given height.
    Plane { height: f64 },
    /// A static table; `top_height` is the height of its top surface.
    Table { position: Vector3<f64>, half_extents: Vector3<f64>, top_height: f64 },
    /// An articulated body with a fixed base.
    Robot { model: RobotModelModule },
    Block(BlockSpec)
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BlockSpec {
    pub half_extents: Vector3<f64>,
    pub position: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
    pub mass: f64,
    pub friction: f64,
    pub color: [f64; 4]
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct JointInfo {
    pub joint_idx: usize,
    pub name: String,
    /// Position of the joint in the body's list of free joints; `None` for fixed joints.
    pub q_idx: Option<usize>,
    /// `None` when the joint is attached directly to the body's base.
    pub parent_link_idx: Option<usize>
}
impl JointInfo {
    pub fn is_movable(&self) -> bool {
        self.q_idx.is_some()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LinkState {
    pub position: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
    pub linear_velocity: Vector3<f64>
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CameraSpec {
    pub distance: f64,
    pub yaw: f64,
    pub pitch: f64,
    pub target: Vector3<f64>,
    pub width: usize,
    pub height: usize
}
impl Default for CameraSpec {
    fn default() -> Self {
        Self {
            distance: 1.5,
            yaw: 90.0,
            pitch: -24.0,
            target: Vector3::new(1.65, 0.75, 0.42),
            width: 2 * (3350 / 8),
            height: 2 * (1800 / 8)
        }
    }
}

/// Row-major RGB image.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelBuffer {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>
}
impl PixelBuffer {
    pub fn new(width: usize, height: usize, fill: [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(width * height * 3);
        for _ in 0..width * height { data.extend_from_slice(&fill); }
        Self { width, height, data }
    }
    pub fn get_pixel(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height { return None; }
        let i = (y * self.width + x) * 3;
        Some([self.data[i], self.data[i + 1], self.data[i + 2]])
    }
    pub fn set_pixel(&mut self, x: usize, y: usize, rgb: [u8; 3]) {
        if x >= self.width || y >= self.height { return; }
        let i = (y * self.width + x) * 3;
        self.data[i..i + 3].copy_from_slice(&rgb);
    }
}
