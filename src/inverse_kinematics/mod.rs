use nalgebra::{UnitQuaternion, Vector3};
use serde::{Serialize, Deserialize};
use tracing::trace;
use crate::physics_modules::physics_client::{BodyHandle, PhysicsClient};
use crate::utils::utils_console::{blocksim_print_labeled, PrintColor};
use crate::utils::utils_errors::BlocksimError;

/// Solves for the joint values of a requested subset of a body's joints that bring the end
/// effector to a target pose.
///
/// Every call is a local correction around the body's live state: rest poses are the current joint
/// values, the requested joints get a wide admissible range, and every other movable joint is
/// pinned to an epsilon band around its current value.  The numeric solve itself is delegated to
/// the physics client, which answers for all free joints of the body; the requested entries are
/// then picked out by their position among the free joints.
///
/// Requesting a joint that is not part of the body's joint graph is a configuration error.  An
/// unreachable target is not an error; the best-effort answer is returned as is.
#[derive(Clone, Debug, Default)]
pub struct KinematicSolver {
    config: KinematicSolverConfig
}
impl KinematicSolver {
    pub fn new(config: KinematicSolverConfig) -> Self {
        Self { config }
    }
    pub fn config(&self) -> &KinematicSolverConfig {
        &self.config
    }
    /// Returns one value per entry of `joint_idxs`, in the same order.
    pub fn inverse_kinematics<C: PhysicsClient>(&self,
                                                client: &C,
                                                body: BodyHandle,
                                                end_effector_link_idx: usize,
                                                target_position: &Vector3<f64>,
                                                target_orientation: &UnitQuaternion<f64>,
                                                joint_idxs: &[usize]) -> Result<Vec<f64>, BlocksimError> {
        let num_joints = client.num_joints(body)?;
        let mut q_idxs = Vec::with_capacity(joint_idxs.len());
        for joint_idx in joint_idxs {
            if *joint_idx >= num_joints {
                return Err(BlocksimError::new_idx_out_of_bound_error(*joint_idx, num_joints, file!(), line!()));
            }
            let info = client.get_joint_info(body, *joint_idx)?;
            match info.q_idx {
                None => { return Err(BlocksimError::new_generic_error_str(&format!("joint {} ({}) is fixed and cannot be solved for.", joint_idx, info.name), file!(), line!())); }
                Some(q_idx) => { q_idxs.push(q_idx); }
            }
        }

        let limits = self.get_joint_ranges(client, body, joint_idxs)?;
        let all_joint_values = client.calculate_inverse_kinematics(body, end_effector_link_idx, target_position, target_orientation, &limits)?;

        let mut out_vec = Vec::with_capacity(q_idxs.len());
        for q_idx in q_idxs {
            match all_joint_values.get(q_idx) {
                None => { return Err(BlocksimError::new_idx_out_of_bound_error(q_idx, all_joint_values.len(), file!(), line!())); }
                Some(v) => { out_vec.push(*v); }
            }
        }
        trace!(?joint_idxs, ?out_vec, "inverse kinematics solution");

        Ok(out_vec)
    }
    /// Limits for every free joint of the body (in free joint order).  Joints listed in
    /// `included_joint_idxs` get the configured wide bounds; the rest collapse around their
    /// current value.
    pub fn get_joint_ranges<C: PhysicsClient>(&self, client: &C, body: BodyHandle, included_joint_idxs: &[usize]) -> Result<JointLimits, BlocksimError> {
        let c = &self.config;
        let mut out_limits = JointLimits::default();

        for joint_idx in 0..client.num_joints(body)? {
            let info = client.get_joint_info(body, joint_idx)?;
            if !info.is_movable() { continue; }

            let rest_pose = client.get_joint_state(body, joint_idx)?;
            if included_joint_idxs.contains(&joint_idx) {
                out_limits.push(c.free_joint_lower_bound, c.free_joint_upper_bound, c.free_joint_range, rest_pose);
            } else {
                out_limits.push(rest_pose - c.locked_joint_epsilon, rest_pose + c.locked_joint_epsilon, c.locked_joint_epsilon, rest_pose);
            }
        }

        Ok(out_limits)
    }
    /// Movable joints on the path from the end effector link to the body's base, ordered from the
    /// end effector to the base.  Reverse the result for base-to-end-effector order.
    pub fn get_kinematic_chain<C: PhysicsClient>(&self, client: &C, body: BodyHandle, end_effector_link_idx: usize) -> Result<Vec<usize>, BlocksimError> {
        let num_joints = client.num_joints(body)?;
        if end_effector_link_idx >= num_joints {
            return Err(BlocksimError::new_idx_out_of_bound_error(end_effector_link_idx, num_joints, file!(), line!()));
        }

        let mut kinematic_chain = vec![];
        let mut curr = Some(end_effector_link_idx);
        while let Some(joint_idx) = curr {
            let info = client.get_joint_info(body, joint_idx)?;
            if info.is_movable() {
                kinematic_chain.push(joint_idx);
            }
            curr = info.parent_link_idx;
        }

        Ok(kinematic_chain)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct KinematicSolverConfig {
    pub free_joint_lower_bound: f64,
    pub free_joint_upper_bound: f64,
    pub free_joint_range: f64,
    /// Half-width of the band a locked joint may move in, also used as its range.
    pub locked_joint_epsilon: f64
}
impl Default for KinematicSolverConfig {
    fn default() -> Self {
        Self {
            free_joint_lower_bound: -2.0,
            free_joint_upper_bound: 2.0,
            free_joint_range: 4.0,
            locked_joint_epsilon: 1e-8
        }
    }
}

/// Per free joint lower limit, upper limit, range and rest pose for one inverse kinematics query.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct JointLimits {
    lower_limits: Vec<f64>,
    upper_limits: Vec<f64>,
    joint_ranges: Vec<f64>,
    rest_poses: Vec<f64>
}
impl JointLimits {
    pub fn new(lower_limits: Vec<f64>, upper_limits: Vec<f64>, joint_ranges: Vec<f64>, rest_poses: Vec<f64>) -> Result<Self, BlocksimError> {
        let n = lower_limits.len();
        if upper_limits.len() != n || joint_ranges.len() != n || rest_poses.len() != n {
            return Err(BlocksimError::new_generic_error_str(&format!("joint limit vectors differ in length ({}, {}, {}, {}).", n, upper_limits.len(), joint_ranges.len(), rest_poses.len()), file!(), line!()));
        }
        Ok(Self { lower_limits, upper_limits, joint_ranges, rest_poses })
    }
    fn push(&mut self, lower_limit: f64, upper_limit: f64, joint_range: f64, rest_pose: f64) {
        self.lower_limits.push(lower_limit);
        self.upper_limits.push(upper_limit);
        self.joint_ranges.push(joint_range);
        self.rest_poses.push(rest_pose);
    }
    pub fn len(&self) -> usize {
        self.lower_limits.len()
    }
    pub fn is_empty(&self) -> bool {
        self.lower_limits.is_empty()
    }
    pub fn lower_limits(&self) -> &Vec<f64> {
        &self.lower_limits
    }
    pub fn upper_limits(&self) -> &Vec<f64> {
        &self.upper_limits
    }
    pub fn joint_ranges(&self) -> &Vec<f64> {
        &self.joint_ranges
    }
    pub fn rest_poses(&self) -> &Vec<f64> {
        &self.rest_poses
    }
    pub fn print_summary(&self) {
        for i in 0..self.len() {
            blocksim_print_labeled(&format!("free joint {}: ", i), &format!("[{}, {}] range {} rest {}", self.lower_limits[i], self.upper_limits[i], self.joint_ranges[i], self.rest_poses[i]), PrintColor::Blue);
        }
    }
}

/// The joints an environment drives: the arm chain, ordered from the end effector to the base,
/// followed by the gripper finger joints.  Derived once at setup and read-only afterwards.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct KinematicChain {
    arm_joint_idxs: Vec<usize>,
    finger_joint_idxs: Vec<usize>
}
impl KinematicChain {
    pub fn new(arm_joint_idxs: Vec<usize>, finger_joint_idxs: Vec<usize>) -> Self {
        Self { arm_joint_idxs, finger_joint_idxs }
    }
    /// Walks the joint graph from `end_effector_link_idx` and appends the given finger joints.
    pub fn derive<C: PhysicsClient>(solver: &KinematicSolver, client: &C, body: BodyHandle, end_effector_link_idx: usize, finger_joint_idxs: &[usize]) -> Result<Self, BlocksimError> {
        let arm_joint_idxs = solver.get_kinematic_chain(client, body, end_effector_link_idx)?;
        Ok(Self::new(arm_joint_idxs, finger_joint_idxs.to_vec()))
    }
    pub fn arm_joint_idxs(&self) -> &Vec<usize> {
        &self.arm_joint_idxs
    }
    pub fn finger_joint_idxs(&self) -> &Vec<usize> {
        &self.finger_joint_idxs
    }
    /// Arm joints (end effector first) followed by finger joints.
    pub fn all_joint_idxs(&self) -> Vec<usize> {
        let mut out_vec = self.arm_joint_idxs.clone();
        out_vec.extend(self.finger_joint_idxs.iter());
        out_vec
    }
    pub fn base_to_end_effector(&self) -> Vec<usize> {
        self.arm_joint_idxs.iter().rev().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics_modules::kinematic_physics_client::{ConnectionMode, KinematicPhysicsClient, KinematicPhysicsParameters};
    use crate::physics_modules::physics_client::BodySpec;
    use crate::robot_modules::robot_model_module::RobotModelModule;

    fn setup() -> (KinematicPhysicsClient, BodyHandle) {
        let mut c = KinematicPhysicsClient::connect(ConnectionMode::Direct, KinematicPhysicsParameters::default());
        let b = c.load_body(&BodySpec::Robot { model: RobotModelModule::new_gripper_arm().unwrap() }).unwrap();
        (c, b)
    }

    #[test]
    fn kinematic_chain_runs_from_end_effector_to_base() {
        let (c, b) = setup();
        let s = KinematicSolver::default();
        assert_eq!(s.get_kinematic_chain(&c, b, 6).unwrap(), vec![5, 4, 3, 2, 1]);
        let chain = KinematicChain::derive(&s, &c, b, 6, &[7, 8]).unwrap();
        assert_eq!(chain.all_joint_idxs(), vec![5, 4, 3, 2, 1, 7, 8]);
        assert_eq!(chain.base_to_end_effector(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn excluded_joints_collapse_around_their_current_value() {
        let (c, b) = setup();
        let limits = KinematicSolver::default().get_joint_ranges(&c, b, &[1, 2, 3, 4, 5]).unwrap();
        assert_eq!(limits.len(), 7);
        assert_eq!(limits.lower_limits()[0], -2.0);
        assert_eq!(limits.joint_ranges()[4], 4.0);
        assert_eq!(limits.rest_poses()[1], -0.6);
        assert!((limits.upper_limits()[5] - 0.05).abs() <= 1e-8 + 1e-15);
        assert_eq!(limits.joint_ranges()[6], 1e-8);
    }

    #[test]
    fn unknown_and_fixed_joints_are_rejected() {
        let (c, b) = setup();
        let s = KinematicSolver::default();
        let r = s.inverse_kinematics(&c, b, 6, &Vector3::new(1.0, 0.0, 0.6), &UnitQuaternion::identity(), &[1, 42]);
        assert!(matches!(r, Err(BlocksimError::IdxOutOfBoundError(_))));
        let r = s.inverse_kinematics(&c, b, 6, &Vector3::new(1.0, 0.0, 0.6), &UnitQuaternion::identity(), &[6]);
        assert!(r.is_err());
    }
}
