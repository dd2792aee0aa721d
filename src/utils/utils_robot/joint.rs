use nalgebra::{Isometry3, Translation3, Unit, UnitQuaternion, Vector3};
use serde::{Serialize, Deserialize};
use crate::utils::utils_console::{blocksim_print, PrintColor, PrintMode};

/// A Joint holds the information about a single joint of a body's joint graph that is needed
/// to do kinematic computations on it.
///
/// Bodies follow the convention of most rigid-body engines: link `i` is the child link of joint `i`,
/// and the base of the body is not a link (a joint whose parent link is `None` is attached to the base).
/// Only movable joints (revolute or prismatic) receive a `q_idx`, i.e., a position in the body's
/// list of free joints.  Fixed joints have `q_idx == None`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Joint {
    name: String,
    joint_idx: usize,
    joint_type: JointType,
    parent_link_idx: Option<usize>,
    origin_translation: Vector3<f64>,
    origin_rotation: UnitQuaternion<f64>,
    axis: Unit<Vector3<f64>>,
    limits: (f64, f64),
    q_idx: Option<usize>
}
impl Joint {
    pub fn new(name: &str, joint_idx: usize, joint_type: JointType, parent_link_idx: Option<usize>, origin_translation: Vector3<f64>, axis: Vector3<f64>, limits: (f64, f64)) -> Self {
        Self {
            name: name.to_string(),
            joint_idx,
            joint_type,
            parent_link_idx,
            origin_translation,
            origin_rotation: UnitQuaternion::identity(),
            axis: Unit::new_normalize(axis),
            limits,
            q_idx: None
        }
    }
    pub fn new_fixed(name: &str, joint_idx: usize, parent_link_idx: Option<usize>, origin_translation: Vector3<f64>) -> Self {
        Self::new(name, joint_idx, JointType::Fixed, parent_link_idx, origin_translation, Vector3::new(0., 0., 1.), (0.0, 0.0))
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn joint_idx(&self) -> usize {
        self.joint_idx
    }
    pub fn joint_type(&self) -> &JointType {
        &self.joint_type
    }
    pub fn parent_link_idx(&self) -> Option<usize> {
        self.parent_link_idx
    }
    pub fn origin_translation(&self) -> &Vector3<f64> {
        &self.origin_translation
    }
    pub fn origin_rotation(&self) -> &UnitQuaternion<f64> {
        &self.origin_rotation
    }
    pub fn axis(&self) -> &Unit<Vector3<f64>> {
        &self.axis
    }
    pub fn limits(&self) -> (f64, f64) {
        self.limits
    }
    pub fn q_idx(&self) -> Option<usize> {
        self.q_idx
    }
    pub fn is_movable(&self) -> bool {
        self.joint_type != JointType::Fixed
    }
    pub fn set_q_idx(&mut self, q_idx: Option<usize>) {
        self.q_idx = q_idx;
    }
    pub fn set_origin_rotation(&mut self, origin_rotation: UnitQuaternion<f64>) {
        self.origin_rotation = origin_rotation;
    }
    /// Pose of the joint's child link frame relative to its parent link frame for the given joint value.
    pub fn local_transform(&self, joint_value: f64) -> Isometry3<f64> {
        let origin = Isometry3::from_parts(Translation3::from(self.origin_translation), self.origin_rotation);
        let motion = match self.joint_type {
            JointType::Fixed => { Isometry3::identity() }
            JointType::Revolute => { Isometry3::from_parts(Translation3::identity(), UnitQuaternion::from_axis_angle(&self.axis, joint_value)) }
            JointType::Prismatic => { Isometry3::from_parts(Translation3::from(self.axis.into_inner() * joint_value), UnitQuaternion::identity()) }
        };
        origin * motion
    }
    /// Clamps a joint value to the joint's own (model) limits.  Fixed joints always return 0.
    pub fn clamp_to_limits(&self, joint_value: f64) -> f64 {
        match self.joint_type {
            JointType::Fixed => { 0.0 }
            _ => { joint_value.max(self.limits.0).min(self.limits.1) }
        }
    }
    pub fn print_summary(&self) {
        blocksim_print(&format!(">> Joint index: "), PrintMode::Print, PrintColor::Blue, true);
        blocksim_print(&format!(" {} ", self.joint_idx), PrintMode::Print, PrintColor::None, false);
        blocksim_print(&format!("  Joint name: "), PrintMode::Print, PrintColor::Blue, true);
        blocksim_print(&format!(" {} ", self.name), PrintMode::Print, PrintColor::None, false);
        blocksim_print(&format!("  Type: "), PrintMode::Print, PrintColor::Blue, true);
        blocksim_print(&format!(" {:?} ", self.joint_type), PrintMode::Print, PrintColor::None, false);
        blocksim_print(&format!("  Parent link: "), PrintMode::Print, PrintColor::Blue, true);
        blocksim_print(&format!(" {:?} ", self.parent_link_idx), PrintMode::Print, PrintColor::None, false);
        blocksim_print(&format!("  q index: "), PrintMode::Print, PrintColor::Blue, true);
        let c = if self.q_idx.is_some() { PrintColor::Green } else { PrintColor::Red };
        blocksim_print(&format!(" {:?} ", self.q_idx), PrintMode::Println, c, false);
    }
}

/// Specifies the motion type of a Joint.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum JointType {
    Fixed,
    Revolute,
    Prismatic
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn revolute_local_transform_rotates_about_axis() {
        let j = Joint::new("j", 0, JointType::Revolute, None, Vector3::new(0., 0., 1.), Vector3::new(0., 1., 0.), (-2., 2.));
        let t = j.local_transform(FRAC_PI_2);
        let p = t * nalgebra::Point3::new(1., 0., 0.);
        assert!((p.x - 0.0).abs() < 1e-9);
        assert!((p.z - 0.0).abs() < 1e-9);
    }

    #[test]
    fn fixed_joints_ignore_their_value() {
        let j = Joint::new_fixed("f", 0, None, Vector3::new(0.1, 0., 0.));
        assert_eq!(j.local_transform(3.0), j.local_transform(0.0));
        assert_eq!(j.clamp_to_limits(1.0), 0.0);
        assert!(!j.is_movable());
    }
}
