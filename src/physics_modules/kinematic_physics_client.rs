use std::cmp::Ordering;
use nalgebra::{Isometry3, Perspective3, Point3, Translation3, UnitQuaternion, Vector3};
use serde::{Serialize, Deserialize};
use crate::inverse_kinematics::JointLimits;
use crate::nonlinear_optimization::{DampedLeastSquaresOptimizer, OptimizerParameters};
use crate::physics_modules::physics_client::{BlockSpec, BodyHandle, BodySpec, CameraSpec, JointInfo, LinkState, PhysicsClient, PixelBuffer, SnapshotId};
use crate::robot_modules::robot_kinematics_module::RobotKinematicsModule;
use crate::utils::utils_errors::BlocksimError;

/// An in-process, kinematic stand-in for a rigid-body engine.
///
/// Articulated bodies track their position-control targets with bounded per-tick joint velocities.
/// Boxes ("blocks") are either resting or held: a resting block drops onto the highest support under
/// its footprint (a plane, a table top, or another resting block) within the tick, and a block
/// becomes held once it sits between a gripper's fingers and the fingers press against it.  A held
/// block moves rigidly with the end effector until the fingers open past its width.  Finger joints
/// cannot close further than `contact_compliance` past a block's surface.
///
/// There is no contact dynamics beyond that.  Inverse kinematics queries are answered with a
/// `DampedLeastSquaresOptimizer`.
#[derive(Clone, Debug)]
pub struct KinematicPhysicsClient {
    connection_mode: ConnectionMode,
    parameters: KinematicPhysicsParameters,
    optimizer: DampedLeastSquaresOptimizer,
    world: WorldState,
    snapshots: Vec<WorldState>,
    connected: bool
}
impl KinematicPhysicsClient {
    pub fn connect(connection_mode: ConnectionMode, parameters: KinematicPhysicsParameters) -> Self {
        let optimizer = DampedLeastSquaresOptimizer::new(parameters.ik_parameters.clone());
        Self {
            connection_mode,
            parameters,
            optimizer,
            world: WorldState::default(),
            snapshots: vec![],
            connected: true
        }
    }
    pub fn connection_mode(&self) -> &ConnectionMode {
        &self.connection_mode
    }
    pub fn parameters(&self) -> &KinematicPhysicsParameters {
        &self.parameters
    }
    pub fn num_ticks(&self) -> u64 {
        self.world.tick
    }
    pub fn num_bodies(&self) -> usize {
        self.world.bodies.iter().filter(|b| b.is_some()).count()
    }
    /// Returns the robot (if any) currently holding the given block.
    pub fn block_holder(&self, block: BodyHandle) -> Result<Option<BodyHandle>, BlocksimError> {
        return match self.get_body(block, "block_holder")? {
            SimBody::Block(b) => { Ok(b.held_by.as_ref().map(|h| h.robot)) }
            _ => { Err(BlocksimError::new_generic_error_str(&format!("body {} is not a block.", block), file!(), line!())) }
        }
    }

    fn check_connected(&self, function_name: &str) -> Result<(), BlocksimError> {
        if !self.connected {
            return Err(BlocksimError::new_session_closed_error(function_name, file!(), line!()));
        }
        Ok(())
    }
    fn get_body(&self, body: BodyHandle, function_name: &str) -> Result<&SimBody, BlocksimError> {
        self.check_connected(function_name)?;
        return match self.world.bodies.get(body) {
            Some(Some(b)) => { Ok(b) }
            _ => { Err(BlocksimError::new_idx_out_of_bound_error(body, self.world.bodies.len(), file!(), line!())) }
        }
    }
    fn get_body_mut(&mut self, body: BodyHandle, function_name: &str) -> Result<&mut SimBody, BlocksimError> {
        self.check_connected(function_name)?;
        let num_bodies = self.world.bodies.len();
        return match self.world.bodies.get_mut(body) {
            Some(Some(b)) => { Ok(b) }
            _ => { Err(BlocksimError::new_idx_out_of_bound_error(body, num_bodies, file!(), line!())) }
        }
    }
    fn get_robot(&self, body: BodyHandle, function_name: &str) -> Result<&RobotBody, BlocksimError> {
        return match self.get_body(body, function_name)? {
            SimBody::Robot(r) => { Ok(r) }
            _ => { Err(BlocksimError::new_unsupported_operation_error(function_name, &format!("body {} has no joints.", body), file!(), line!())) }
        }
    }
    fn get_robot_mut(&mut self, body: BodyHandle, function_name: &str) -> Result<&mut RobotBody, BlocksimError> {
        return match self.get_body_mut(body, function_name)? {
            SimBody::Robot(r) => { Ok(r) }
            _ => { Err(BlocksimError::new_unsupported_operation_error(function_name, &format!("body {} has no joints.", body), file!(), line!())) }
        }
    }

    fn step_robots(&mut self) -> Result<(), BlocksimError> {
        let dt = self.parameters.timestep;
        let max_joint_velocity = self.parameters.max_joint_velocity;
        let max_finger_velocity = self.parameters.max_finger_velocity;
        let blocks: Vec<BlockBody> = self.world.blocks().map(|(_, b)| b.clone()).collect();

        for body in self.world.bodies.iter_mut() {
            if let Some(SimBody::Robot(robot)) = body {
                let prev_positions: Vec<Vector3<f64>> = robot.link_poses()?.iter().map(|p| p.translation.vector).collect();
                let model = robot.kinematics.robot_model_module().clone();
                let finger_joint_idxs = model.gripper().map(|g| g.finger_joint_idxs.clone()).unwrap_or_default();

                for joint in model.joints() {
                    let idx = joint.joint_idx();
                    if !joint.is_movable() { continue; }
                    if let Some(target) = robot.joint_targets[idx] {
                        let v = if finger_joint_idxs.contains(&idx) { max_finger_velocity } else { max_joint_velocity };
                        let step = (target - robot.joint_values[idx]).max(-v).min(v);
                        robot.joint_values[idx] = joint.clamp_to_limits(robot.joint_values[idx] + step);
                    }
                }

                if let Some(gripper) = model.gripper() {
                    let ee_position = robot.link_poses()?[gripper.end_effector_link_idx].translation.vector;
                    for b in &blocks {
                        if b.is_between_fingers(&ee_position, gripper.grip_radius) {
                            let min_finger = b.grip_half_width() - gripper.contact_compliance;
                            for f in &gripper.finger_joint_idxs {
                                robot.joint_values[*f] = robot.joint_values[*f].max(min_finger);
                            }
                        }
                    }
                }

                let new_positions: Vec<Vector3<f64>> = robot.link_poses()?.iter().map(|p| p.translation.vector).collect();
                robot.link_velocities = new_positions.iter().zip(prev_positions.iter()).map(|(n, p)| (n - p) / dt).collect();
            }
        }

        Ok(())
    }
    fn update_held_blocks(&mut self) -> Result<(), BlocksimError> {
        let mut grippers = vec![];
        for (h, body) in self.world.bodies.iter().enumerate() {
            if let Some(SimBody::Robot(robot)) = body {
                if let Some(gripper) = robot.kinematics.robot_model_module().gripper() {
                    let ee_position = robot.link_poses()?[gripper.end_effector_link_idx].translation.vector;
                    let finger_values: Vec<f64> = gripper.finger_joint_idxs.iter().map(|f| robot.joint_values[*f]).collect();
                    grippers.push((h, ee_position, finger_values, gripper.grip_radius));
                }
            }
        }

        let dt = self.parameters.timestep;
        for body in self.world.bodies.iter_mut() {
            if let Some(SimBody::Block(block)) = body {
                let prev_position = block.spec.position;

                if let Some(hold) = block.held_by.clone() {
                    let g = grippers.iter().find(|g| g.0 == hold.robot);
                    match g {
                        Some((_, ee_position, finger_values, _)) if finger_values.iter().all(|f| *f <= block.grip_half_width()) => {
                            block.spec.position = ee_position + hold.offset;
                        }
                        _ => { block.held_by = None; }
                    }
                } else {
                    for (h, ee_position, finger_values, grip_radius) in &grippers {
                        let pressing = !finger_values.is_empty() && finger_values.iter().all(|f| *f <= block.grip_half_width());
                        if pressing && block.is_between_fingers(ee_position, *grip_radius) {
                            block.held_by = Some(Hold { robot: *h, offset: block.spec.position - ee_position });
                            break;
                        }
                    }
                }

                block.velocity = (block.spec.position - prev_position) / dt;
            }
        }

        Ok(())
    }
    fn settle_resting_blocks(&mut self) {
        let dt = self.parameters.timestep;

        let mut resting: Vec<BodyHandle> = self.world.blocks().filter(|(_, b)| b.held_by.is_none()).map(|(h, _)| h).collect();
        resting.sort_by(|a, b| {
            let za = self.world.block_ref(*a).map(|x| x.bottom()).unwrap_or(0.0);
            let zb = self.world.block_ref(*b).map(|x| x.bottom()).unwrap_or(0.0);
            za.partial_cmp(&zb).unwrap_or(Ordering::Equal)
        });

        let mut settled: Vec<BodyHandle> = vec![];
        for h in resting {
            let block = match self.world.block_ref(h) { Some(b) => b.clone(), None => continue };
            let mut support_top = f64::NEG_INFINITY;

            for body in self.world.bodies.iter().flatten() {
                match body {
                    SimBody::Plane { height } => { support_top = support_top.max(*height); }
                    SimBody::Table { position, half_extents, top_height } => {
                        let inside = (block.spec.position.x - position.x).abs() <= half_extents.x && (block.spec.position.y - position.y).abs() <= half_extents.y;
                        if inside && *top_height <= block.bottom() + self.parameters.support_tolerance {
                            support_top = support_top.max(*top_height);
                        }
                    }
                    _ => {}
                }
            }
            for s in &settled {
                if let Some(other) = self.world.block_ref(*s) {
                    if other.footprint_overlaps(&block) && other.top() <= block.bottom() + self.parameters.support_tolerance {
                        support_top = support_top.max(other.top());
                    }
                }
            }

            if support_top.is_finite() {
                if let Some(SimBody::Block(b)) = self.world.bodies[h].as_mut() {
                    let prev_position = b.spec.position;
                    b.spec.position.z = support_top + b.spec.half_extents.z;
                    b.velocity = (b.spec.position - prev_position) / dt;
                }
            }
            settled.push(h);
        }
    }
}
impl PhysicsClient for KinematicPhysicsClient {
    fn reset_simulation(&mut self) -> Result<(), BlocksimError> {
        self.check_connected("reset_simulation")?;
        self.world = WorldState::default();
        self.snapshots.clear();
        Ok(())
    }
    fn load_body(&mut self, spec: &BodySpec) -> Result<BodyHandle, BlocksimError> {
        self.check_connected("load_body")?;
        let body = match spec {
            BodySpec::Plane { height } => { SimBody::Plane { height: *height } }
            BodySpec::Table { position, half_extents, top_height } => { SimBody::Table { position: *position, half_extents: *half_extents, top_height: *top_height } }
            BodySpec::Robot { model } => {
                let joint_values = model.initial_joint_values().clone();
                let num_joints = joint_values.len();
                SimBody::Robot(RobotBody {
                    kinematics: RobotKinematicsModule::new(model.clone()),
                    base_pose: Isometry3::identity(),
                    joint_values,
                    joint_targets: vec![None; num_joints],
                    link_velocities: vec![Vector3::zeros(); num_joints]
                })
            }
            BodySpec::Block(block_spec) => {
                SimBody::Block(BlockBody {
                    spec: block_spec.clone(),
                    velocity: Vector3::zeros(),
                    held_by: None
                })
            }
        };
        self.world.bodies.push(Some(body));
        Ok(self.world.bodies.len() - 1)
    }
    fn remove_body(&mut self, body: BodyHandle) -> Result<(), BlocksimError> {
        self.get_body(body, "remove_body")?;
        self.world.bodies[body] = None;
        Ok(())
    }
    fn set_base_pose(&mut self, body: BodyHandle, position: &Vector3<f64>, orientation: &UnitQuaternion<f64>) -> Result<(), BlocksimError> {
        match self.get_body_mut(body, "set_base_pose")? {
            SimBody::Plane { height } => { *height = position.z; }
            SimBody::Table { position: p, .. } => { *p = *position; }
            SimBody::Robot(r) => { r.base_pose = Isometry3::from_parts(Translation3::from(*position), *orientation); }
            SimBody::Block(b) => {
                b.spec.position = *position;
                b.spec.orientation = *orientation;
            }
        }
        Ok(())
    }
    fn get_base_pose(&self, body: BodyHandle) -> Result<(Vector3<f64>, UnitQuaternion<f64>), BlocksimError> {
        return match self.get_body(body, "get_base_pose")? {
            SimBody::Plane { height } => { Ok((Vector3::new(0., 0., *height), UnitQuaternion::identity())) }
            SimBody::Table { position, .. } => { Ok((*position, UnitQuaternion::identity())) }
            SimBody::Robot(r) => { Ok((r.base_pose.translation.vector, r.base_pose.rotation)) }
            SimBody::Block(b) => { Ok((b.spec.position, b.spec.orientation)) }
        }
    }
    fn num_joints(&self, body: BodyHandle) -> Result<usize, BlocksimError> {
        return match self.get_body(body, "num_joints")? {
            SimBody::Robot(r) => { Ok(r.joint_values.len()) }
            _ => { Ok(0) }
        }
    }
    fn get_joint_info(&self, body: BodyHandle, joint_idx: usize) -> Result<JointInfo, BlocksimError> {
        let robot = self.get_robot(body, "get_joint_info")?;
        let joint = robot.kinematics.robot_model_module().get_joint_by_idx(joint_idx)?;
        Ok(JointInfo {
            joint_idx,
            name: joint.name().to_string(),
            q_idx: joint.q_idx(),
            parent_link_idx: joint.parent_link_idx()
        })
    }
    fn get_joint_state(&self, body: BodyHandle, joint_idx: usize) -> Result<f64, BlocksimError> {
        let robot = self.get_robot(body, "get_joint_state")?;
        return match robot.joint_values.get(joint_idx) {
            None => { Err(BlocksimError::new_idx_out_of_bound_error(joint_idx, robot.joint_values.len(), file!(), line!())) }
            Some(v) => { Ok(*v) }
        }
    }
    fn reset_joint_state(&mut self, body: BodyHandle, joint_idx: usize, value: f64) -> Result<(), BlocksimError> {
        let robot = self.get_robot_mut(body, "reset_joint_state")?;
        let num_joints = robot.joint_values.len();
        if joint_idx >= num_joints {
            return Err(BlocksimError::new_idx_out_of_bound_error(joint_idx, num_joints, file!(), line!()));
        }
        robot.joint_values[joint_idx] = value;
        robot.joint_targets[joint_idx] = Some(value);
        Ok(())
    }
    fn set_joint_target(&mut self, body: BodyHandle, joint_idx: usize, value: f64) -> Result<(), BlocksimError> {
        let robot = self.get_robot_mut(body, "set_joint_target")?;
        let num_joints = robot.joint_values.len();
        if joint_idx >= num_joints {
            return Err(BlocksimError::new_idx_out_of_bound_error(joint_idx, num_joints, file!(), line!()));
        }
        robot.joint_targets[joint_idx] = Some(value);
        Ok(())
    }
    fn get_link_state(&self, body: BodyHandle, link_idx: usize) -> Result<LinkState, BlocksimError> {
        let robot = self.get_robot(body, "get_link_state")?;
        let poses = robot.link_poses()?;
        let pose = match poses.get(link_idx) {
            None => { return Err(BlocksimError::new_idx_out_of_bound_error(link_idx, poses.len(), file!(), line!())); }
            Some(p) => { p }
        };
        Ok(LinkState {
            position: pose.translation.vector,
            orientation: pose.rotation,
            linear_velocity: robot.link_velocities[link_idx]
        })
    }
    fn calculate_inverse_kinematics(&self, body: BodyHandle, end_effector_link_idx: usize, target_position: &Vector3<f64>, target_orientation: &UnitQuaternion<f64>, limits: &JointLimits) -> Result<Vec<f64>, BlocksimError> {
        let robot = self.get_robot(body, "calculate_inverse_kinematics")?;
        let res = self.optimizer.optimize(&robot.kinematics, &robot.base_pose, &robot.joint_values, end_effector_link_idx, target_position, target_orientation, limits)?;
        Ok(res.x_min().clone())
    }
    fn step_tick(&mut self) -> Result<(), BlocksimError> {
        self.check_connected("step_tick")?;
        self.step_robots()?;
        self.update_held_blocks()?;
        self.settle_resting_blocks();
        self.world.tick += 1;
        Ok(())
    }
    fn save_snapshot(&mut self) -> Result<SnapshotId, BlocksimError> {
        self.check_connected("save_snapshot")?;
        self.snapshots.push(self.world.clone());
        Ok(self.snapshots.len() - 1)
    }
    fn restore_snapshot(&mut self, snapshot: SnapshotId) -> Result<(), BlocksimError> {
        self.check_connected("restore_snapshot")?;
        let state = match self.snapshots.get(snapshot) {
            None => { return Err(BlocksimError::new_idx_out_of_bound_error(snapshot, self.snapshots.len(), file!(), line!())); }
            Some(s) => { s.clone() }
        };
        self.world = state;
        Ok(())
    }
    fn has_display(&self) -> bool {
        self.connection_mode == ConnectionMode::Gui
    }
    fn render(&self, camera: &CameraSpec) -> Result<PixelBuffer, BlocksimError> {
        self.check_connected("render")?;
        if !self.has_display() {
            return Err(BlocksimError::new_unsupported_operation_error("render", "Rendering only works with a GUI connection.", file!(), line!()));
        }

        let mut image = PixelBuffer::new(camera.width, camera.height, [200, 200, 200]);
        if camera.width == 0 || camera.height == 0 { return Ok(image); }

        let yaw = camera.yaw.to_radians();
        let pitch = camera.pitch.to_radians();
        let forward = Vector3::new(pitch.cos() * yaw.cos(), pitch.cos() * yaw.sin(), pitch.sin());
        let eye = Point3::from(camera.target - forward * camera.distance);
        let view = Isometry3::look_at_rh(&eye, &Point3::from(camera.target), &Vector3::z());
        let projection = Perspective3::new(camera.width as f64 / camera.height as f64, 60f64.to_radians(), 0.1, 100.0);

        // (distance to eye, center, half extents, color)
        let mut boxes: Vec<(f64, Vector3<f64>, Vector3<f64>, [u8; 3])> = vec![];
        for body in self.world.bodies.iter().flatten() {
            match body {
                SimBody::Table { position, half_extents, top_height } => {
                    let center = Vector3::new(position.x, position.y, top_height - half_extents.z);
                    boxes.push(((center - eye.coords).norm(), center, *half_extents, [140, 100, 60]));
                }
                SimBody::Block(b) => {
                    let c = b.spec.color;
                    let rgb = [(c[0] * 255.0) as u8, (c[1] * 255.0) as u8, (c[2] * 255.0) as u8];
                    boxes.push(((b.spec.position - eye.coords).norm(), b.spec.position, b.spec.half_extents, rgb));
                }
                SimBody::Robot(r) => {
                    for pose in r.link_poses()? {
                        let center = pose.translation.vector;
                        boxes.push(((center - eye.coords).norm(), center, Vector3::new(0.02, 0.02, 0.02), [60, 60, 60]));
                    }
                }
                SimBody::Plane { .. } => {}
            }
        }
        boxes.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

        for (_, center, half_extents, rgb) in boxes {
            let mut min_px = (f64::INFINITY, f64::INFINITY);
            let mut max_px = (f64::NEG_INFINITY, f64::NEG_INFINITY);
            let mut visible = true;
            for sx in [-1.0, 1.0] {
                for sy in [-1.0, 1.0] {
                    for sz in [-1.0, 1.0] {
                        let corner = Point3::new(center.x + sx * half_extents.x, center.y + sy * half_extents.y, center.z + sz * half_extents.z);
                        let in_view = view.transform_point(&corner);
                        if in_view.z >= -0.1 { visible = false; }
                        let ndc = projection.project_point(&in_view);
                        let px = (ndc.x + 1.0) * 0.5 * camera.width as f64;
                        let py = (1.0 - ndc.y) * 0.5 * camera.height as f64;
                        min_px = (min_px.0.min(px), min_px.1.min(py));
                        max_px = (max_px.0.max(px), max_px.1.max(py));
                    }
                }
            }
            if !visible { continue; }

            let (x0, y0, x1, y1) = match pixel_rect(min_px, max_px, camera.width, camera.height) {
                None => { continue; }
                Some(r) => { r }
            };
            for y in y0..=y1 {
                for x in x0..=x1 {
                    image.set_pixel(x, y, rgb);
                }
            }
        }

        Ok(image)
    }
    fn disconnect(&mut self) -> Result<(), BlocksimError> {
        self.check_connected("disconnect")?;
        self.world = WorldState::default();
        self.snapshots.clear();
        self.connected = false;
        Ok(())
    }
}

/// Clips a projected box to the viewport; `None` when nothing of it lands on screen.
fn pixel_rect(min_px: (f64, f64), max_px: (f64, f64), width: usize, height: usize) -> Option<(usize, usize, usize, usize)> {
    if width == 0 || height == 0 { return None; }
    if max_px.0 < 0.0 || max_px.1 < 0.0 || min_px.0 >= width as f64 || min_px.1 >= height as f64 { return None; }
    let x0 = min_px.0.max(0.0).floor() as usize;
    let y0 = min_px.1.max(0.0).floor() as usize;
    let x1 = max_px.0.min(width as f64 - 1.0).ceil() as usize;
    let y1 = max_px.1.min(height as f64 - 1.0).ceil() as usize;
    Some((x0, y0, x1, y1))
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Headless.
    Direct,
    /// An interactive display is attached; enables `render`.
    Gui
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct KinematicPhysicsParameters {
    /// Seconds per tick.
    pub timestep: f64,
    /// Largest change of a non-finger joint per tick.
    pub max_joint_velocity: f64,
    /// Largest change of a finger joint per tick.
    pub max_finger_velocity: f64,
    /// A surface counts as support if its top is at most this far above a block's bottom.
    pub support_tolerance: f64,
    pub ik_parameters: OptimizerParameters
}
impl Default for KinematicPhysicsParameters {
    fn default() -> Self {
        Self {
            timestep: 1.0 / 240.0,
            max_joint_velocity: 0.1,
            max_finger_velocity: 0.005,
            support_tolerance: 1e-3,
            ik_parameters: OptimizerParameters::default()
        }
    }
}

#[derive(Clone, Debug, Default)]
struct WorldState {
    bodies: Vec<Option<SimBody>>,
    tick: u64
}
impl WorldState {
    fn blocks(&self) -> impl Iterator<Item = (BodyHandle, &BlockBody)> {
        self.bodies.iter().enumerate().filter_map(|(h, b)| match b {
            Some(SimBody::Block(block)) => { Some((h, block)) }
            _ => { None }
        })
    }
    fn block_ref(&self, h: BodyHandle) -> Option<&BlockBody> {
        match self.bodies.get(h) {
            Some(Some(SimBody::Block(b))) => { Some(b) }
            _ => { None }
        }
    }
}

#[derive(Clone, Debug)]
enum SimBody {
    Plane { height: f64 },
    Table { position: Vector3<f64>, half_extents: Vector3<f64>, top_height: f64 },
    Robot(RobotBody),
    Block(BlockBody)
}

#[derive(Clone, Debug)]
struct RobotBody {
    kinematics: RobotKinematicsModule,
    base_pose: Isometry3<f64>,
    joint_values: Vec<f64>,
    joint_targets: Vec<Option<f64>>,
    link_velocities: Vec<Vector3<f64>>
}
impl RobotBody {
    fn link_poses(&self) -> Result<Vec<Isometry3<f64>>, BlocksimError> {
        let fk_res = self.kinematics.compute_fk(&self.base_pose, &self.joint_values)?;
        Ok(fk_res.link_poses().clone())
    }
}

#[derive(Clone, Debug)]
struct BlockBody {
    spec: BlockSpec,
    velocity: Vector3<f64>,
    held_by: Option<Hold>
}
impl BlockBody {
    fn bottom(&self) -> f64 {
        self.spec.position.z - self.spec.half_extents.z
    }
    fn top(&self) -> f64 {
        self.spec.position.z + self.spec.half_extents.z
    }
    fn grip_half_width(&self) -> f64 {
        self.spec.half_extents.x.min(self.spec.half_extents.y)
    }
    fn is_between_fingers(&self, ee_position: &Vector3<f64>, grip_radius: f64) -> bool {
        let dx = ee_position.x - self.spec.position.x;
        let dy = ee_position.y - self.spec.position.y;
        (dx * dx + dy * dy).sqrt() < grip_radius && (ee_position.z - self.spec.position.z).abs() < self.spec.half_extents.z
    }
    fn footprint_overlaps(&self, other: &BlockBody) -> bool {
        (self.spec.position.x - other.spec.position.x).abs() < self.spec.half_extents.x + other.spec.half_extents.x &&
            (self.spec.position.y - other.spec.position.y).abs() < self.spec.half_extents.y + other.spec.half_extents.y
    }
}

#[derive(Clone, Debug)]
struct Hold {
    robot: BodyHandle,
    offset: Vector3<f64>
}
