use std::collections::BTreeMap;
use nalgebra::{UnitQuaternion, Vector3};
use serde::{Serialize, Deserialize};
use tracing::{debug, info};
use crate::environments::controllers::ControlVector;
use crate::environments::raw_observation::{BlockAttributes, GripperObservation, RawObservation};
use crate::environments::{LowLevelEnv, LowLevelStep};
use crate::inverse_kinematics::{KinematicChain, KinematicSolver, KinematicSolverConfig};
use crate::physics_modules::kinematic_physics_client::{ConnectionMode, KinematicPhysicsClient, KinematicPhysicsParameters};
use crate::physics_modules::physics_client::{BlockSpec, BodyHandle, BodySpec, CameraSpec, PhysicsClient, PixelBuffer, SnapshotId};
use crate::physics_modules::physics_session::PhysicsSession;
use crate::robot_modules::robot_model_module::RobotModelModule;
use crate::utils::utils_errors::BlocksimError;
use crate::utils::utils_sampling::{SeededSampler, SeededSamplerState};

/// Block name to block attributes.
pub type BlocksState = BTreeMap<String, BlockAttributes>;

const BLOCK_COLORS: [[f64; 4]; 9] = [
    [0.95, 0.05, 0.1, 1.],
    [0.05, 0.95, 0.1, 1.],
    [0.1, 0.05, 0.95, 1.],
    [0.4, 0.05, 0.6, 1.],
    [0.6, 0.4, 0.05, 1.],
    [0.05, 0.04, 0.6, 1.],
    [0.95, 0.95, 0.1, 1.],
    [0.95, 0.05, 0.95, 1.],
    [0.05, 0.95, 0.95, 1.],
];
const DEFAULT_BLOCK_COLOR: [f64; 4] = [0., 0., 1., 1.];

/// Color of a block named `block<n>`, cycling through a fixed palette by `n`.
pub fn block_color(block_name: &str) -> [f64; 4] {
    match block_name.strip_prefix("block").and_then(|n| n.parse::<usize>().ok()) {
        None => { DEFAULT_BLOCK_COLOR }
        Some(n) => { BLOCK_COLORS[n % BLOCK_COLORS.len()] }
    }
}

/// The continuous blocks world: a fixed-base arm with a parallel gripper next to a table with
/// blocks on it.
///
/// A step takes a 4-vector (end effector displacement and finger command), scales it, solves
/// inverse kinematics toward the displaced end effector position at a fixed orientation, commands
/// the arm and finger joints and then runs `sim_steps_per_action` physics ticks.  Reward is always
/// zero and steps never terminate on their own.
///
/// The environment exclusively owns its physics session; `close` (or dropping the environment)
/// releases it.
pub struct LowLevelBlocksEnv<C: PhysicsClient> {
    config: LowLevelBlocksEnvConfig,
    session: PhysicsSession<C>,
    solver: KinematicSolver,
    sampler: SeededSampler,
    robot: BodyHandle,
    end_effector_link_idx: usize,
    left_finger_idx: usize,
    right_finger_idx: usize,
    kinematic_chain: KinematicChain,
    initial_snapshot: SnapshotId,
    block_ids: BTreeMap<String, BodyHandle>,
    static_block_attributes: BTreeMap<BodyHandle, StaticBlockAttributes>
}
impl LowLevelBlocksEnv<KinematicPhysicsClient> {
    /// Uses the in-process kinematic backend, connected with a display iff `config.use_gui`.
    pub fn new_kinematic(config: LowLevelBlocksEnvConfig) -> Result<Self, BlocksimError> {
        let connection_mode = if config.use_gui { ConnectionMode::Gui } else { ConnectionMode::Direct };
        let client = KinematicPhysicsClient::connect(connection_mode, config.physics.clone());
        Self::new(client, config)
    }
}
impl<C: PhysicsClient> LowLevelBlocksEnv<C> {
    pub fn new(client: C, config: LowLevelBlocksEnvConfig) -> Result<Self, BlocksimError> {
        let mut out_self = Self {
            solver: KinematicSolver::new(config.solver.clone()),
            sampler: SeededSampler::new(config.seed),
            config,
            session: PhysicsSession::new(client),
            robot: 0,
            end_effector_link_idx: 0,
            left_finger_idx: 0,
            right_finger_idx: 0,
            kinematic_chain: KinematicChain::new(vec![], vec![]),
            initial_snapshot: 0,
            block_ids: BTreeMap::new(),
            static_block_attributes: BTreeMap::new()
        };
        out_self.setup()?;
        Ok(out_self)
    }
    /// Loads the static scene, moves the arm to its start pose and records the result as the
    /// snapshot every reset returns to.
    fn setup(&mut self) -> Result<(), BlocksimError> {
        let c = &self.config;
        let client = self.session.client_mut()?;
        client.reset_simulation()?;

        let plane = client.load_body(&BodySpec::Plane { height: c.plane_height })?;
        client.set_base_pose(plane, &Vector3::new(0., 0., c.plane_height), &UnitQuaternion::identity())?;

        let robot = client.load_body(&BodySpec::Robot { model: RobotModelModule::new_gripper_arm()? })?;
        client.set_base_pose(robot, &c.base_position, &c.base_orientation)?;

        let end_effector_link_idx = find_joint_by_name(&*client, robot, &c.end_effector_joint_name)?;
        let left_finger_idx = find_joint_by_name(&*client, robot, &c.left_finger_joint_name)?;
        let right_finger_idx = find_joint_by_name(&*client, robot, &c.right_finger_joint_name)?;
        let kinematic_chain = KinematicChain::derive(&self.solver, &*client, robot, end_effector_link_idx, &[left_finger_idx, right_finger_idx])?;

        client.load_body(&BodySpec::Table { position: c.table_position, half_extents: c.table_half_extents, top_height: c.table_top_height })?;

        for _ in 0..c.setup_settle_ticks { client.step_tick()?; }

        let chain_joint_idxs = kinematic_chain.all_joint_idxs();
        let joint_values = self.solver.inverse_kinematics(&*client, robot, end_effector_link_idx, &c.start_end_effector_position, &c.end_effector_orientation, &chain_joint_idxs)?;
        for (joint_idx, joint_value) in chain_joint_idxs.iter().zip(joint_values.iter()) {
            client.reset_joint_state(robot, *joint_idx, *joint_value)?;
        }

        for _ in 0..c.setup_settle_ticks { client.step_tick()?; }

        self.initial_snapshot = client.save_snapshot()?;
        self.robot = robot;
        self.end_effector_link_idx = end_effector_link_idx;
        self.left_finger_idx = left_finger_idx;
        self.right_finger_idx = right_finger_idx;
        self.kinematic_chain = kinematic_chain;
        self.block_ids.clear();
        self.static_block_attributes.clear();

        debug!(chain = ?self.kinematic_chain, "low level blocks env set up");
        Ok(())
    }
    /// Samples one to `max_piles` piles of blocks, one block per pile, with sampled size and mass.
    pub fn sample_initial_state(&mut self) -> Result<BlocksState, BlocksimError> {
        let c = &self.config;
        let mut state = BlocksState::new();
        let mut block_name_counter = 0;

        let num_piles = self.sampler.randint(1, c.max_piles + 1);
        for pile in 0..num_piles {
            let x = c.pile_x;
            let y = c.pile_y_start + pile as f64 * c.pile_y_spacing;
            let mut previous_block_top = c.table_top_height;
            for _ in 0..c.blocks_per_pile {
                let block_name = format!("block{}", block_name_counter);
                block_name_counter += 1;

                let dims = self.sampler.normal_samples(&[(c.block_size_mean, c.block_size_std); 3])?;
                let (w, l, h) = (dims[0], dims[1], dims[2]);
                let mass = self.sampler.uniform(c.block_mass_range.0, c.block_mass_range.1);

                let z = previous_block_top + h / 2.0;
                previous_block_top += h;
                state.insert(block_name, BlockAttributes {
                    width: w,
                    length: l,
                    height: h,
                    position: Vector3::new(x, y, z),
                    orientation: UnitQuaternion::identity(),
                    mass,
                    friction: c.block_friction
                });
            }
        }

        Ok(state)
    }
    /// Replaces all blocks with the given ones and lets the scene settle.
    pub fn set_state(&mut self, state: &BlocksState) -> Result<(), BlocksimError> {
        self.remove_blocks()?;

        let client = self.session.client_mut()?;
        for (block_name, attributes) in state {
            let block_id = client.load_body(&BodySpec::Block(BlockSpec {
                half_extents: Vector3::new(attributes.width / 2.0, attributes.length / 2.0, attributes.height / 2.0),
                position: attributes.position,
                orientation: attributes.orientation,
                mass: attributes.mass,
                friction: attributes.friction,
                color: block_color(block_name)
            }))?;
            self.block_ids.insert(block_name.clone(), block_id);
            self.static_block_attributes.insert(block_id, StaticBlockAttributes::from(attributes));
        }

        for _ in 0..self.config.reset_settle_ticks { client.step_tick()?; }
        Ok(())
    }
    /// Same as `set_state`, for callers that build scenes by hand (e.g. tests).
    pub fn set_block_states(&mut self, state: &BlocksState) -> Result<RawObservation, BlocksimError> {
        self.set_state(state)?;
        self.get_state()
    }
    pub fn get_state(&self) -> Result<RawObservation, BlocksimError> {
        let client = self.session.client()?;
        let link_state = client.get_link_state(self.robot, self.end_effector_link_idx)?;
        let left_finger_position = client.get_joint_state(self.robot, self.left_finger_idx)?;

        let mut observation = RawObservation::new(GripperObservation {
            position: link_state.position,
            velocity: link_state.linear_velocity,
            left_finger_position
        });
        for (block_name, block_id) in &self.block_ids {
            let s = match self.static_block_attributes.get(block_id) {
                None => { return Err(BlocksimError::new_generic_error_str(&format!("no attributes cached for block {}.", block_name), file!(), line!())); }
                Some(s) => { s }
            };
            let (position, orientation) = client.get_base_pose(*block_id)?;
            observation.blocks.insert(block_name.clone(), BlockAttributes {
                width: s.width,
                length: s.length,
                height: s.height,
                position,
                orientation,
                mass: s.mass,
                friction: s.friction
            });
        }

        Ok(observation)
    }
    pub fn config(&self) -> &LowLevelBlocksEnvConfig {
        &self.config
    }
    pub fn kinematic_chain(&self) -> &KinematicChain {
        &self.kinematic_chain
    }
    pub fn robot(&self) -> BodyHandle {
        self.robot
    }
    pub fn end_effector_link_idx(&self) -> usize {
        self.end_effector_link_idx
    }
    pub fn block_ids(&self) -> &BTreeMap<String, BodyHandle> {
        &self.block_ids
    }
    pub fn client(&self) -> Result<&C, BlocksimError> {
        self.session.client()
    }
    pub fn capture_sampler_state(&self) -> SeededSamplerState {
        self.sampler.capture_state()
    }
    pub fn restore_sampler_state(&mut self, state: &SeededSamplerState) {
        self.sampler.restore_state(state);
    }

    fn remove_blocks(&mut self) -> Result<(), BlocksimError> {
        let client = self.session.client_mut()?;
        for block_id in self.block_ids.values() {
            client.remove_body(*block_id)?;
        }
        self.block_ids.clear();
        self.static_block_attributes.clear();
        Ok(())
    }
}
impl<C: PhysicsClient> LowLevelEnv for LowLevelBlocksEnv<C> {
    fn reset(&mut self) -> Result<RawObservation, BlocksimError> {
        self.remove_blocks()?;

        let client = self.session.client_mut()?;
        client.restore_snapshot(self.initial_snapshot)?;
        client.set_base_pose(self.robot, &self.config.base_position, &self.config.base_orientation)?;

        let initial_state = self.sample_initial_state()?;
        self.set_state(&initial_state)?;
        info!(num_blocks = initial_state.len(), "low level blocks env reset");

        self.get_state()
    }
    fn step(&mut self, control: &ControlVector) -> Result<LowLevelStep, BlocksimError> {
        let action = control * self.config.action_scale;
        let ee_delta = Vector3::new(action.x, action.y, action.z);
        let finger_action = action.w;

        let chain_joint_idxs = self.kinematic_chain.all_joint_idxs();
        let client = self.session.client_mut()?;
        let current_position = client.get_link_state(self.robot, self.end_effector_link_idx)?.position;
        let target_position = current_position + ee_delta;

        let joint_values = self.solver.inverse_kinematics(&*client, self.robot, self.end_effector_link_idx, &target_position, &self.config.end_effector_orientation, &chain_joint_idxs)?;
        for (joint_idx, joint_value) in chain_joint_idxs.iter().zip(joint_values.iter()) {
            client.set_joint_target(self.robot, *joint_idx, *joint_value)?;
        }

        for finger_idx in [self.left_finger_idx, self.right_finger_idx] {
            let current_value = client.get_joint_state(self.robot, finger_idx)?;
            client.set_joint_target(self.robot, finger_idx, current_value + finger_action)?;
        }

        for _ in 0..self.config.sim_steps_per_action { client.step_tick()?; }

        Ok(LowLevelStep {
            observation: self.get_state()?,
            reward: 0.0,
            done: false
        })
    }
    fn render(&self) -> Result<PixelBuffer, BlocksimError> {
        let client = self.session.client()?;
        if !self.config.use_gui || !client.has_display() {
            return Err(BlocksimError::new_unsupported_operation_error("render", "Rendering only works with GUI on.", file!(), line!()));
        }
        client.render(&self.config.camera)
    }
    fn seed(&mut self, seed: Option<u64>) -> u64 {
        self.sampler.reseed(seed)
    }
    fn close(&mut self) -> Result<(), BlocksimError> {
        self.session.close()
    }
    fn is_closed(&self) -> bool {
        self.session.is_closed()
    }
}

fn find_joint_by_name<C: PhysicsClient>(client: &C, body: BodyHandle, joint_name: &str) -> Result<usize, BlocksimError> {
    for joint_idx in 0..client.num_joints(body)? {
        if client.get_joint_info(body, joint_idx)?.name == joint_name {
            return Ok(joint_idx);
        }
    }
    Err(BlocksimError::new_generic_error_str(&format!("body {} has no joint named {}.", body, joint_name), file!(), line!()))
}

#[derive(Clone, Debug, PartialEq)]
struct StaticBlockAttributes {
    width: f64,
    length: f64,
    height: f64,
    mass: f64,
    friction: f64
}
impl From<&BlockAttributes> for StaticBlockAttributes {
    fn from(a: &BlockAttributes) -> Self {
        Self { width: a.width, length: a.length, height: a.height, mass: a.mass, friction: a.friction }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LowLevelBlocksEnvConfig {
    /// Connect with a display; required for `render`.
    pub use_gui: bool,
    /// Seed of the scene sampler.  `None` draws a fresh one.
    pub seed: Option<u64>,
    pub sim_steps_per_action: usize,
    /// Factor applied to every control vector before it is executed.
    pub action_scale: f64,
    pub base_position: Vector3<f64>,
    pub base_orientation: UnitQuaternion<f64>,
    pub end_effector_joint_name: String,
    pub left_finger_joint_name: String,
    pub right_finger_joint_name: String,
    /// Held fixed by every step.  The default points the gripper straight down.
    pub end_effector_orientation: UnitQuaternion<f64>,
    pub start_end_effector_position: Vector3<f64>,
    pub plane_height: f64,
    pub table_position: Vector3<f64>,
    pub table_half_extents: Vector3<f64>,
    pub table_top_height: f64,
    pub max_piles: usize,
    pub blocks_per_pile: usize,
    pub pile_x: f64,
    pub pile_y_start: f64,
    pub pile_y_spacing: f64,
    pub block_size_mean: f64,
    pub block_size_std: f64,
    pub block_mass_range: (f64, f64),
    pub block_friction: f64,
    pub setup_settle_ticks: usize,
    pub reset_settle_ticks: usize,
    pub camera: CameraSpec,
    pub solver: KinematicSolverConfig,
    /// Only used by `LowLevelBlocksEnv::new_kinematic`.
    pub physics: KinematicPhysicsParameters
}
impl Default for LowLevelBlocksEnvConfig {
    fn default() -> Self {
        Self {
            use_gui: false,
            seed: None,
            sim_steps_per_action: 20,
            action_scale: 0.05,
            base_position: Vector3::new(0.405 + 0.2869, 0.48 + 0.2641, 0.0),
            base_orientation: UnitQuaternion::identity(),
            end_effector_joint_name: "gripper_axis".to_string(),
            left_finger_joint_name: "l_gripper_finger_joint".to_string(),
            right_finger_joint_name: "r_gripper_finger_joint".to_string(),
            end_effector_orientation: UnitQuaternion::from_axis_angle(&Vector3::y_axis(), std::f64::consts::FRAC_PI_2),
            start_end_effector_position: Vector3::new(1.14, 0.74, 0.85),
            plane_height: -1.0,
            table_position: Vector3::new(1.65, 0.75, 0.0),
            table_half_extents: Vector3::new(0.7, 0.6, 0.25),
            table_top_height: 0.5,
            max_piles: 3,
            blocks_per_pile: 1,
            pile_x: 1.25,
            pile_y_start: 0.5,
            pile_y_spacing: 0.2,
            block_size_mean: 0.075,
            block_size_std: 0.005,
            block_mass_range: (0.05, 0.2),
            block_friction: 1.0,
            setup_settle_ticks: 100,
            reset_settle_ticks: 250,
            camera: CameraSpec::default(),
            solver: KinematicSolverConfig::default(),
            physics: KinematicPhysicsParameters::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> LowLevelBlocksEnv<KinematicPhysicsClient> {
        LowLevelBlocksEnv::new_kinematic(LowLevelBlocksEnvConfig { seed: Some(0), ..Default::default() }).unwrap()
    }

    #[test]
    fn arm_starts_at_the_configured_pose() {
        let e = env();
        let obs = e.get_state().unwrap();
        assert!((obs.gripper.position - e.config().start_end_effector_position).norm() < 1e-3, "{:?}", obs.gripper.position);
        assert!((obs.gripper.left_finger_position - 0.05).abs() < 1e-12);
        assert_eq!(e.kinematic_chain().all_joint_idxs(), vec![5, 4, 3, 2, 1, 7, 8]);
    }

    #[test]
    fn reset_samples_piles_on_the_table() {
        let mut e = env();
        for _ in 0..5 {
            let obs = e.reset().unwrap();
            let n = obs.blocks.len();
            assert!(n >= 1 && n <= 3);
            for (i, (name, b)) in obs.blocks.iter().enumerate() {
                assert_eq!(name, &format!("block{}", i));
                assert!((b.bottom() - 0.5).abs() < 1e-9);
                assert!((b.position.y - (0.5 + 0.2 * i as f64)).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn restoring_the_sampler_reproduces_the_scene() {
        let mut e = env();
        let state = e.capture_sampler_state();
        let a = e.sample_initial_state().unwrap();
        e.restore_sampler_state(&state);
        let b = e.sample_initial_state().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn steps_move_the_gripper_by_the_scaled_displacement() {
        let mut e = env();
        e.reset().unwrap();
        let before = e.get_state().unwrap().gripper.position;
        let step = e.step(&ControlVector::new(0.0, 0.0, 1.0, 0.0)).unwrap();
        assert_eq!(step.reward, 0.0);
        assert!(!step.done);
        let moved = step.observation.gripper.position - before;
        assert!((moved.z - 0.05).abs() < 2e-3, "{:?}", moved);
        assert!(moved.x.abs() < 2e-3 && moved.y.abs() < 2e-3);
    }

    #[test]
    fn render_without_gui_fails_and_close_is_final() {
        let mut e = env();
        assert!(matches!(e.render(), Err(BlocksimError::UnsupportedOperationError(_))));
        e.close().unwrap();
        assert!(e.is_closed());
        assert!(matches!(e.reset(), Err(BlocksimError::SessionClosedError(_))));
    }

    #[test]
    fn block_colors_cycle_through_the_palette() {
        assert_eq!(block_color("block0"), [0.95, 0.05, 0.1, 1.]);
        assert_eq!(block_color("block9"), block_color("block0"));
        assert_eq!(block_color("crate"), [0., 0., 1., 1.]);
    }
}
