use nalgebra::{DMatrix, Isometry3, Vector3};
use serde::{Serialize, Deserialize};
use crate::robot_modules::robot_model_module::RobotModelModule;
use crate::utils::utils_console::{blocksim_print, PrintColor, PrintMode};
use crate::utils::utils_errors::BlocksimError;
use crate::utils::utils_robot::joint::JointType;

/// The `RobotKinematicsModule` performs operations related to a body's kinematics: forward
/// kinematics (joint values to the SE(3) poses of all links) and the geometric Jacobian of a link
/// with respect to the body's free joints.
///
/// # Example
/// ```
/// use nalgebra::Isometry3;
/// use blocksim::robot_modules::robot_model_module::RobotModelModule;
/// use blocksim::robot_modules::robot_kinematics_module::RobotKinematicsModule;
///
/// let model = RobotModelModule::new_gripper_arm().unwrap();
/// let joint_values = model.initial_joint_values().clone();
/// let kinematics = RobotKinematicsModule::new(model);
/// let fk_res = kinematics.compute_fk(&Isometry3::identity(), &joint_values).unwrap();
/// fk_res.print_summary();
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RobotKinematicsModule {
    robot_model_module: RobotModelModule
}
impl RobotKinematicsModule {
    pub fn new(robot_model_module: RobotModelModule) -> Self {
        Self {
            robot_model_module
        }
    }
    /// `joint_values` holds one value per joint (fixed joints included, their values are ignored).
    pub fn compute_fk(&self, base_pose: &Isometry3<f64>, joint_values: &[f64]) -> Result<RobotFKResult, BlocksimError> {
        let joints = self.robot_model_module.joints();
        if joint_values.len() != joints.len() {
            return Err(BlocksimError::new_generic_error_str(&format!("compute_fk expected {} joint values, got {}.", joints.len(), joint_values.len()), file!(), line!()));
        }

        let mut link_poses: Vec<Isometry3<f64>> = Vec::with_capacity(joints.len());
        for (i, joint) in joints.iter().enumerate() {
            let parent_pose = match joint.parent_link_idx() {
                None => { base_pose.clone() }
                Some(p) => { link_poses[p].clone() }
            };
            link_poses.push(parent_pose * joint.local_transform(joint_values[i]));
        }

        Ok(RobotFKResult {
            link_names: joints.iter().map(|j| j.name().to_string()).collect(),
            link_poses
        })
    }
    /// Geometric Jacobian (6 x number of free joints) of the given link's origin.  Rows 0..3 are the
    /// translational part and rows 3..6 the rotational part.  Columns follow free joint order, and
    /// columns of free joints that do not lie on the link's chain are zero.
    pub fn compute_jacobian(&self, fk_res: &RobotFKResult, end_link_idx: usize) -> Result<DMatrix<f64>, BlocksimError> {
        let end_pose = fk_res.get_link_pose(end_link_idx)?;
        let end_point: Vector3<f64> = end_pose.translation.vector;

        let free_joint_idxs = self.robot_model_module.free_joint_idxs();
        let mut jacobian = DMatrix::zeros(6, free_joint_idxs.len());

        for (col, joint_idx) in free_joint_idxs.iter().enumerate() {
            if !self.robot_model_module.is_ancestor_link(*joint_idx, end_link_idx) { continue; }

            let joint = &self.robot_model_module.joints()[*joint_idx];
            let joint_pose = fk_res.get_link_pose(*joint_idx)?;
            let rotated_axis = joint_pose.rotation * joint.axis().into_inner();

            match joint.joint_type() {
                JointType::Revolute => {
                    let connector_vec = end_point - joint_pose.translation.vector;
                    let cross_vec = rotated_axis.cross(&connector_vec);

                    jacobian[(0, col)] = cross_vec.x; jacobian[(1, col)] = cross_vec.y; jacobian[(2, col)] = cross_vec.z;
                    jacobian[(3, col)] = rotated_axis.x; jacobian[(4, col)] = rotated_axis.y; jacobian[(5, col)] = rotated_axis.z;
                }
                JointType::Prismatic => {
                    jacobian[(0, col)] = rotated_axis.x; jacobian[(1, col)] = rotated_axis.y; jacobian[(2, col)] = rotated_axis.z;
                }
                JointType::Fixed => { }
            }
        }

        Ok(jacobian)
    }
    pub fn robot_model_module(&self) -> &RobotModelModule {
        &self.robot_model_module
    }
}

/// The output of a forward kinematics computation: one world pose per link.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RobotFKResult {
    link_names: Vec<String>,
    link_poses: Vec<Isometry3<f64>>
}
impl RobotFKResult {
    pub fn link_poses(&self) -> &Vec<Isometry3<f64>> {
        &self.link_poses
    }
    pub fn get_link_pose(&self, link_idx: usize) -> Result<&Isometry3<f64>, BlocksimError> {
        return match self.link_poses.get(link_idx) {
            None => { Err(BlocksimError::new_idx_out_of_bound_error(link_idx, self.link_poses.len(), file!(), line!())) }
            Some(p) => { Ok(p) }
        }
    }
    /// Prints a summary of the forward kinematics result.
    pub fn print_summary(&self) {
        for (i, (name, pose)) in self.link_names.iter().zip(self.link_poses.iter()).enumerate() {
            blocksim_print(&format!("Link {} {} ---> ", i, name), PrintMode::Println, PrintColor::Blue, true);
            blocksim_print(&format!("   > Pose Translation: {:?}", pose.translation.vector.as_slice()), PrintMode::Println, PrintColor::None, false);
            blocksim_print(&format!("   > Pose Euler Angles: {:?}", pose.rotation.euler_angles()), PrintMode::Println, PrintColor::None, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinematics() -> RobotKinematicsModule {
        RobotKinematicsModule::new(RobotModelModule::new_gripper_arm().unwrap())
    }

    #[test]
    fn zero_configuration_extends_along_x() {
        let k = kinematics();
        let fk = k.compute_fk(&Isometry3::identity(), &vec![0.0; 9]).unwrap();
        let ee = fk.get_link_pose(6).unwrap().translation.vector;
        assert!((ee.x - 1.12).abs() < 1e-9);
        assert!(ee.y.abs() < 1e-9);
        assert!((ee.z - 0.7).abs() < 1e-9);
    }

    #[test]
    fn jacobian_matches_finite_differences() {
        let k = kinematics();
        let q = k.robot_model_module().initial_joint_values().clone();
        let fk = k.compute_fk(&Isometry3::identity(), &q).unwrap();
        let jac = k.compute_jacobian(&fk, 6).unwrap();
        let p0 = fk.get_link_pose(6).unwrap().translation.vector;

        let h = 1e-7;
        for (col, joint_idx) in k.robot_model_module().free_joint_idxs().iter().enumerate() {
            let mut q_h = q.clone();
            q_h[*joint_idx] += h;
            let p1 = k.compute_fk(&Isometry3::identity(), &q_h).unwrap().get_link_pose(6).unwrap().translation.vector;
            let fd = (p1 - p0) / h;
            for r in 0..3 {
                assert!((fd[r] - jac[(r, col)]).abs() < 1e-5, "col {} row {}", col, r);
            }
        }
    }

    #[test]
    fn wrong_number_of_joint_values_is_an_error() {
        let k = kinematics();
        assert!(k.compute_fk(&Isometry3::identity(), &[0.0; 3]).is_err());
    }
}
