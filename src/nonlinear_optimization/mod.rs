use nalgebra::{DMatrix, DVector, Isometry3, UnitQuaternion, Vector3};
use serde::{Serialize, Deserialize};
use crate::inverse_kinematics::JointLimits;
use crate::robot_modules::robot_kinematics_module::RobotKinematicsModule;
use crate::utils::utils_errors::BlocksimError;

/// Numerical end-effector pose optimizer used by the kinematic physics backend to answer inverse
/// kinematics queries.
///
/// This is a weighted damped-least-squares iteration over all free joints of a body.  Each joint is
/// weighted by its allowed range (relative to the largest range in the query), and every iterate
/// is clamped to the query's lower/upper limits, so a joint whose limits collapse to an epsilon band
/// around its current value cannot leave that band.  The optimizer never fails on a hard target; it
/// returns its best iterate after `max_iterations`.
#[derive(Clone, Debug)]
pub struct DampedLeastSquaresOptimizer {
    parameters: OptimizerParameters
}
impl DampedLeastSquaresOptimizer {
    pub fn new(parameters: OptimizerParameters) -> Self {
        Self { parameters }
    }
    pub fn parameters(&self) -> &OptimizerParameters {
        &self.parameters
    }
    /// `init_joint_values` has one entry per joint of the body.  The result's `x_min` has one entry
    /// per free joint, in free joint order.
    pub fn optimize(&self,
                    kinematics: &RobotKinematicsModule,
                    base_pose: &Isometry3<f64>,
                    init_joint_values: &[f64],
                    end_link_idx: usize,
                    target_position: &Vector3<f64>,
                    target_orientation: &UnitQuaternion<f64>,
                    limits: &JointLimits) -> Result<OptimizerResult, BlocksimError> {
        let model = kinematics.robot_model_module();
        let free_joint_idxs = model.free_joint_idxs();
        let n = free_joint_idxs.len();
        if limits.len() != n {
            return Err(BlocksimError::new_generic_error_str(&format!("joint limits have {} entries but the body has {} free joints.", limits.len(), n), file!(), line!()));
        }

        let max_range = limits.joint_ranges().iter().cloned().fold(0.0_f64, f64::max);
        let weights: Vec<f64> = limits.joint_ranges().iter().map(|r| {
            if max_range <= 0.0 { 0.0 } else { (r / max_range).max(0.0).min(1.0) }
        }).collect();

        let p = &self.parameters;
        let mut q = init_joint_values.to_vec();
        let mut num_iterations = 0;
        let mut final_error = f64::INFINITY;
        let mut converged = false;

        for _ in 0..p.max_iterations {
            let fk_res = kinematics.compute_fk(base_pose, &q)?;
            let pose = fk_res.get_link_pose(end_link_idx)?;

            let e_pos = target_position - pose.translation.vector;
            let e_rot = (target_orientation * pose.rotation.inverse()).scaled_axis() * p.orientation_weight;
            let err = DVector::from_vec(vec![e_pos.x, e_pos.y, e_pos.z, e_rot.x, e_rot.y, e_rot.z]);
            final_error = err.norm();
            if final_error < p.tolerance {
                converged = true;
                break;
            }

            let mut jacobian = kinematics.compute_jacobian(&fk_res, end_link_idx)?;
            for r in 3..6 {
                jacobian.row_mut(r).scale_mut(p.orientation_weight);
            }
            let mut jacobian_weighted = jacobian.clone();
            for (c, w) in weights.iter().enumerate() {
                jacobian_weighted.column_mut(c).scale_mut(*w);
            }

            let a = &jacobian_weighted * jacobian.transpose() + DMatrix::<f64>::identity(6, 6) * (p.damping * p.damping);
            let a_inv = match a.try_inverse() {
                None => { break; }
                Some(a_inv) => { a_inv }
            };
            let mut dq = jacobian_weighted.transpose() * (a_inv * err);
            let step_norm = dq.norm();
            if step_norm > p.max_step_norm {
                dq *= p.max_step_norm / step_norm;
            }

            for (k, joint_idx) in free_joint_idxs.iter().enumerate() {
                let v = q[*joint_idx] + dq[k];
                q[*joint_idx] = v.max(limits.lower_limits()[k]).min(limits.upper_limits()[k]);
            }
            num_iterations += 1;
        }

        Ok(OptimizerResult {
            x_min: free_joint_idxs.iter().map(|j| q[*j]).collect(),
            num_iterations,
            final_error,
            converged
        })
    }
}
impl Default for DampedLeastSquaresOptimizer {
    fn default() -> Self {
        Self::new(OptimizerParameters::default())
    }
}

#[derive(Clone, Debug)]
pub struct OptimizerResult {
    x_min: Vec<f64>,
    num_iterations: usize,
    final_error: f64,
    converged: bool
}
impl OptimizerResult {
    pub fn x_min(&self) -> &Vec<f64> {
        &self.x_min
    }
    pub fn num_iterations(&self) -> usize {
        self.num_iterations
    }
    /// Weighted pose error norm at the returned iterate.
    pub fn final_error(&self) -> f64 {
        self.final_error
    }
    pub fn converged(&self) -> bool {
        self.converged
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OptimizerParameters {
    pub max_iterations: usize,
    pub damping: f64,
    pub tolerance: f64,
    pub orientation_weight: f64,
    pub max_step_norm: f64
}
impl Default for OptimizerParameters {
    fn default() -> Self {
        Self {
            max_iterations: 300,
            damping: 0.02,
            tolerance: 1e-7,
            orientation_weight: 0.5,
            max_step_norm: 0.25
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::robot_modules::robot_model_module::RobotModelModule;

    fn setup() -> (RobotKinematicsModule, Vec<f64>) {
        let model = RobotModelModule::new_gripper_arm().unwrap();
        let q = model.initial_joint_values().clone();
        (RobotKinematicsModule::new(model), q)
    }

    fn free_limits(k: &RobotKinematicsModule, q: &[f64]) -> JointLimits {
        let free = k.robot_model_module().free_joint_idxs();
        JointLimits::new(vec![-2.0; free.len()], vec![2.0; free.len()], vec![4.0; free.len()], free.iter().map(|j| q[*j]).collect()).unwrap()
    }

    #[test]
    fn reaches_a_reachable_downward_pose() {
        let (k, q) = setup();
        let target = Vector3::new(0.6, 0.1, 0.55);
        let orientation = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), std::f64::consts::FRAC_PI_2);
        let res = DampedLeastSquaresOptimizer::default().optimize(&k, &Isometry3::identity(), &q, 6, &target, &orientation, &free_limits(&k, &q)).unwrap();

        let mut q_out = q.clone();
        for (x, j) in res.x_min().iter().zip(k.robot_model_module().free_joint_idxs()) { q_out[*j] = *x; }
        let ee = k.compute_fk(&Isometry3::identity(), &q_out).unwrap().get_link_pose(6).unwrap().translation.vector;
        assert!((ee - target).norm() < 1e-3, "ee {:?}", ee);
    }

    #[test]
    fn unreachable_targets_still_return_an_answer() {
        let (k, q) = setup();
        let target = Vector3::new(5.0, 0.0, 0.0);
        let res = DampedLeastSquaresOptimizer::default().optimize(&k, &Isometry3::identity(), &q, 6, &target, &UnitQuaternion::identity(), &free_limits(&k, &q)).unwrap();
        assert_eq!(res.x_min().len(), 7);
        assert!(!res.converged());
        assert!(res.x_min().iter().all(|x| x.is_finite()));
    }
}
