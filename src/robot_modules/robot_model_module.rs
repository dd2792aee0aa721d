use std::collections::HashMap;
use nalgebra::Vector3;
use serde::{Serialize, Deserialize};
use crate::utils::utils_console::{blocksim_print, PrintColor, PrintMode};
use crate::utils::utils_errors::BlocksimError;
use crate::utils::utils_robot::joint::{Joint, JointType};

/// The `RobotModelModule` holds the joint graph of an articulated body.
///
/// Joints are stored in index order and link `i` is the child link of joint `i`.  A joint's parent
/// link must precede it (parent index < joint index), so a single forward pass over the joints
/// is a valid traversal from the base outward.  Movable joints are assigned increasing `q_idx`
/// values in joint index order; the resulting list is the body's "free joints", which is the
/// layout of every full-body inverse kinematics result.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RobotModelModule {
    robot_name: String,
    joints: Vec<Joint>,
    free_joint_idxs: Vec<usize>,
    initial_joint_values: Vec<f64>,
    gripper: Option<GripperSpec>,
    joint_name_to_idx_hashmap: HashMap<String, usize>
}
impl RobotModelModule {
    pub fn new(robot_name: &str, joints: Vec<Joint>) -> Result<Self, BlocksimError> {
        let mut joints = joints;
        let mut free_joint_idxs = vec![];
        let mut joint_name_to_idx_hashmap = HashMap::new();

        for (i, j) in joints.iter_mut().enumerate() {
            if j.joint_idx() != i {
                return Err(BlocksimError::new_generic_error_str(&format!("joint {} is stored at position {} but has index {}.", j.name(), i, j.joint_idx()), file!(), line!()));
            }
            if let Some(parent_link_idx) = j.parent_link_idx() {
                if parent_link_idx >= i {
                    return Err(BlocksimError::new_generic_error_str(&format!("joint {} has parent link {} which does not precede it.", j.name(), parent_link_idx), file!(), line!()));
                }
            }
            if j.is_movable() {
                j.set_q_idx(Some(free_joint_idxs.len()));
                free_joint_idxs.push(i);
            } else {
                j.set_q_idx(None);
            }
            joint_name_to_idx_hashmap.insert(j.name().to_string(), i);
        }

        let initial_joint_values = vec![0.0; joints.len()];

        Ok(Self {
            robot_name: robot_name.to_string(),
            joints,
            free_joint_idxs,
            initial_joint_values,
            gripper: None,
            joint_name_to_idx_hashmap
        })
    }
    /// A single arm with a parallel-jaw gripper, loosely proportioned after the Fetch arm.
    ///
    /// Joint layout (link `i` is the child of joint `i`):
    /// ```text
    /// 0 base_mount           fixed      parent: base
    /// 1 shoulder_pan_joint   revolute z parent: 0
    /// 2 shoulder_lift_joint  revolute y parent: 1
    /// 3 elbow_flex_joint     revolute y parent: 2
    /// 4 wrist_flex_joint     revolute y parent: 3
    /// 5 wrist_roll_joint     revolute x parent: 4
    /// 6 gripper_axis         fixed      parent: 5   (end effector)
    /// 7 l_gripper_finger_joint prismatic +y parent: 6
    /// 8 r_gripper_finger_joint prismatic -y parent: 6
    /// ```
    /// At zero joint values the arm points along the base's +x axis; positive pitch rotations
    /// tilt it downward.
    pub fn new_gripper_arm() -> Result<Self, BlocksimError> {
        let joints = vec![
            Joint::new_fixed("base_mount", 0, None, Vector3::new(0., 0., 0.)),
            Joint::new("shoulder_pan_joint", 1, JointType::Revolute, Some(0), Vector3::new(0., 0., 0.6), Vector3::new(0., 0., 1.), (-1.6, 1.6)),
            Joint::new("shoulder_lift_joint", 2, JointType::Revolute, Some(1), Vector3::new(0., 0., 0.1), Vector3::new(0., 1., 0.), (-1.6, 1.6)),
            Joint::new("elbow_flex_joint", 3, JointType::Revolute, Some(2), Vector3::new(0.45, 0., 0.), Vector3::new(0., 1., 0.), (-2.3, 2.3)),
            Joint::new("wrist_flex_joint", 4, JointType::Revolute, Some(3), Vector3::new(0.45, 0., 0.), Vector3::new(0., 1., 0.), (-2.2, 2.2)),
            Joint::new("wrist_roll_joint", 5, JointType::Revolute, Some(4), Vector3::new(0.1, 0., 0.), Vector3::new(1., 0., 0.), (-3.1, 3.1)),
            Joint::new_fixed("gripper_axis", 6, Some(5), Vector3::new(0.12, 0., 0.)),
            Joint::new("l_gripper_finger_joint", 7, JointType::Prismatic, Some(6), Vector3::new(0., 0., 0.), Vector3::new(0., 1., 0.), (0.0, 0.05)),
            Joint::new("r_gripper_finger_joint", 8, JointType::Prismatic, Some(6), Vector3::new(0., 0., 0.), Vector3::new(0., -1., 0.), (0.0, 0.05)),
        ];

        Self::new("gripper_arm", joints)?
            .with_initial_joint_values(vec![0.0, 0.0, -0.6, 1.4, 0.77, 0.0, 0.0, 0.05, 0.05])?
            .with_gripper(GripperSpec {
                end_effector_link_idx: 6,
                finger_joint_idxs: vec![7, 8],
                grip_radius: 0.035,
                contact_compliance: 0.005
            })
    }
    pub fn with_initial_joint_values(mut self, initial_joint_values: Vec<f64>) -> Result<Self, BlocksimError> {
        if initial_joint_values.len() != self.joints.len() {
            return Err(BlocksimError::new_generic_error_str(&format!("expected {} initial joint values, got {}.", self.joints.len(), initial_joint_values.len()), file!(), line!()));
        }
        self.initial_joint_values = initial_joint_values;
        Ok(self)
    }
    pub fn with_gripper(mut self, gripper: GripperSpec) -> Result<Self, BlocksimError> {
        self.get_joint_by_idx(gripper.end_effector_link_idx)?;
        for f in &gripper.finger_joint_idxs {
            self.get_joint_by_idx(*f)?;
        }
        self.gripper = Some(gripper);
        Ok(self)
    }
    pub fn robot_name(&self) -> &str {
        &self.robot_name
    }
    pub fn joints(&self) -> &Vec<Joint> {
        &self.joints
    }
    pub fn num_joints(&self) -> usize {
        self.joints.len()
    }
    pub fn free_joint_idxs(&self) -> &Vec<usize> {
        &self.free_joint_idxs
    }
    pub fn num_free_joints(&self) -> usize {
        self.free_joint_idxs.len()
    }
    pub fn initial_joint_values(&self) -> &Vec<f64> {
        &self.initial_joint_values
    }
    pub fn gripper(&self) -> Option<&GripperSpec> {
        self.gripper.as_ref()
    }
    pub fn get_joint_by_idx(&self, joint_idx: usize) -> Result<&Joint, BlocksimError> {
        return match self.joints.get(joint_idx) {
            None => { Err(BlocksimError::new_idx_out_of_bound_error(joint_idx, self.joints.len(), file!(), line!())) }
            Some(j) => { Ok(j) }
        }
    }
    pub fn get_joint_idx_from_name(&self, joint_name: &str) -> Option<usize> {
        self.joint_name_to_idx_hashmap.get(joint_name).copied()
    }
    /// Returns true if `ancestor_link_idx` lies on the path from `link_idx` to the base (inclusive).
    pub fn is_ancestor_link(&self, ancestor_link_idx: usize, link_idx: usize) -> bool {
        let mut curr = Some(link_idx);
        while let Some(c) = curr {
            if c == ancestor_link_idx { return true; }
            curr = self.joints.get(c).and_then(|j| j.parent_link_idx());
        }
        false
    }
    pub fn print_summary(&self) {
        blocksim_print(&format!("Robot {} ({} free joints) ---> ", self.robot_name, self.num_free_joints()), PrintMode::Println, PrintColor::Blue, true);
        for j in &self.joints {
            j.print_summary();
        }
    }
}

/// Describes the parallel-jaw gripper at the end of a body's kinematic chain.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GripperSpec {
    pub end_effector_link_idx: usize,
    pub finger_joint_idxs: Vec<usize>,
    /// Horizontal distance between the end effector and a block center within which the block
    /// sits between the fingers.
    pub grip_radius: f64,
    /// How far past a block's surface the fingers are allowed to squeeze.
    pub contact_compliance: f64
}
