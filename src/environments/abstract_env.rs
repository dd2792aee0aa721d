use std::collections::{BTreeMap, BTreeSet};
use serde::{Serialize, Deserialize};
use tracing::{debug, info, warn};
use crate::environments::controllers::{ActionController, ActionKind, ControllerConfig};
use crate::environments::low_level_blocks_env::{LowLevelBlocksEnv, LowLevelBlocksEnvConfig};
use crate::environments::observation_abstraction::{ObservationAbstraction, ObservationAbstractionMode, ObservationPredicate};
use crate::environments::raw_observation::RawObservation;
use crate::environments::symbolic::{objects_in_literals, Literal, LiteralSetSpace, LiteralSpace};
use crate::environments::LowLevelEnv;
use crate::physics_modules::kinematic_physics_client::KinematicPhysicsClient;
use crate::physics_modules::physics_client::PixelBuffer;
use crate::utils::utils_enums::EnumUtils;
use crate::utils::utils_errors::BlocksimError;
use crate::utils::utils_logging::{init_logging, LogConfig};

pub type SymbolicObservation = BTreeSet<Literal>;

/// The symbolic face of a low-level environment.
///
/// Actions are ground literals over the action predicates of the registered controllers.  `step`
/// hands the action to its controller and alternates controller decisions with low-level steps
/// until the controller reports completion, the low-level environment reports a terminal state,
/// or `controller_max_steps` low-level steps have run.  The resulting raw observation is abstracted
/// into literals and kept as the starting point of the next step.
///
/// The action space's object domain is replaced on every `reset` with the objects mentioned in the
/// reset observation.
///
/// # Example
/// ```no_run
/// use blocksim::environments::abstract_env::{AbstractBlocksEnv, AbstractEnvConfig};
/// use blocksim::environments::low_level_blocks_env::LowLevelBlocksEnvConfig;
///
/// let mut env = AbstractBlocksEnv::new_blocks_env(LowLevelBlocksEnvConfig::default(), AbstractEnvConfig::default()).unwrap();
/// let (obs, _) = env.reset().unwrap();
/// let action = env.action_space().all_ground_literals()[0].clone();
/// let (next_obs, reward, done, info) = env.step(&action).unwrap();
/// env.close().unwrap();
/// ```
pub struct AbstractBlocksEnv<E: LowLevelEnv> {
    low_level_env: E,
    controllers: BTreeMap<ActionKind, ActionController>,
    abstraction: ObservationAbstraction,
    action_space: LiteralSpace,
    observation_space: LiteralSetSpace,
    controller_max_steps: usize,
    previous_low_level_observation: Option<RawObservation>,
    problem_objects: Vec<String>
}
impl AbstractBlocksEnv<LowLevelBlocksEnv<KinematicPhysicsClient>> {
    /// The blocks world on the in-process kinematic backend, with every action controller registered.
    pub fn new_blocks_env(low_level_config: LowLevelBlocksEnvConfig, config: AbstractEnvConfig) -> Result<Self, BlocksimError> {
        let low_level_env = LowLevelBlocksEnv::new_kinematic(low_level_config)?;
        Ok(AbstractEnvBuilder::new(low_level_env).with_config(config).with_all_controllers().build())
    }
}
impl<E: LowLevelEnv> AbstractBlocksEnv<E> {
    pub fn reset(&mut self) -> Result<(SymbolicObservation, DebugInfo), BlocksimError> {
        self.check_open("reset")?;
        let low_level_observation = self.low_level_env.reset()?;
        let observation = self.abstraction.get_observation(&low_level_observation);
        self.previous_low_level_observation = Some(low_level_observation);

        self.problem_objects = objects_in_literals(&observation);
        self.action_space.update(&self.problem_objects);
        info!(objects = ?self.problem_objects, num_literals = observation.len(), "abstract env reset");

        Ok((observation, DebugInfo::default()))
    }
    pub fn step(&mut self, action: &Literal) -> Result<(SymbolicObservation, f64, bool, DebugInfo), BlocksimError> {
        self.check_open("step")?;
        let kind = ActionKind::from_predicate_name(action.predicate().name())?;
        let controller = match self.controllers.get(&kind) {
            None => { return Err(BlocksimError::new_unregistered_action_error(action.predicate().name(), file!(), line!())); }
            Some(c) => { c }
        };
        let mut low_level_observation = match &self.previous_low_level_observation {
            None => { return Err(BlocksimError::new_generic_error_str("step was called before reset.", file!(), line!())); }
            Some(o) => { o.clone() }
        };

        let mut reward = 0.0;
        let mut done = false;
        let mut termination = StepTermination::TickBudgetExhausted;
        let mut num_ticks = 0;
        for _ in 0..self.controller_max_steps {
            let (control, controller_done) = controller.step(action.variables(), &low_level_observation)?;
            if controller_done {
                termination = StepTermination::ControllerDone;
                break;
            }
            let low_level_step = self.low_level_env.step(&control)?;
            num_ticks += 1;
            reward += low_level_step.reward;
            low_level_observation = low_level_step.observation;
            done = low_level_step.done;
            if done {
                termination = StepTermination::LowLevelTerminal;
                break;
            }
        }

        if termination == StepTermination::TickBudgetExhausted {
            warn!(action = %action, num_ticks, "controller did not finish within its tick budget");
        } else {
            debug!(action = %action, num_ticks, ?termination, "abstract step finished");
        }

        let observation = self.abstraction.get_observation(&low_level_observation);
        self.previous_low_level_observation = Some(low_level_observation);

        Ok((observation, reward, done, DebugInfo { termination: Some(termination), num_ticks }))
    }
    pub fn render(&self) -> Result<PixelBuffer, BlocksimError> {
        self.low_level_env.render()
    }
    /// Reseeds both the low-level environment and action sampling.
    pub fn seed(&mut self, seed: Option<u64>) -> Result<u64, BlocksimError> {
        self.check_open("seed")?;
        let seed = self.low_level_env.seed(seed);
        self.action_space.seed(Some(seed));
        Ok(seed)
    }
    pub fn close(&mut self) -> Result<(), BlocksimError> {
        self.low_level_env.close()
    }
    pub fn action_space(&self) -> &LiteralSpace {
        &self.action_space
    }
    pub fn action_space_mut(&mut self) -> &mut LiteralSpace {
        &mut self.action_space
    }
    pub fn abstraction(&self) -> &ObservationAbstraction {
        &self.abstraction
    }
    pub fn observation_space(&self) -> &LiteralSetSpace {
        &self.observation_space
    }
    pub fn problem_objects(&self) -> &Vec<String> {
        &self.problem_objects
    }
    pub fn registered_action_kinds(&self) -> Vec<ActionKind> {
        self.controllers.keys().cloned().collect()
    }
    pub fn controller_max_steps(&self) -> usize {
        self.controller_max_steps
    }
    pub fn low_level_env(&self) -> &E {
        &self.low_level_env
    }
    pub fn low_level_env_mut(&mut self) -> &mut E {
        &mut self.low_level_env
    }

    /// Controllers that finish without ticking never reach the session, so a closed
    /// environment has to be caught here.
    fn check_open(&self, function_name: &str) -> Result<(), BlocksimError> {
        if self.low_level_env.is_closed() {
            return Err(BlocksimError::new_session_closed_error(function_name, file!(), line!()));
        }
        Ok(())
    }
}

/// Assembles an `AbstractBlocksEnv` from a low-level environment, the set of action kinds to
/// register controllers for, and configuration.
pub struct AbstractEnvBuilder<E: LowLevelEnv> {
    low_level_env: E,
    config: AbstractEnvConfig,
    action_kinds: Vec<ActionKind>
}
impl<E: LowLevelEnv> AbstractEnvBuilder<E> {
    pub fn new(low_level_env: E) -> Self {
        Self {
            low_level_env,
            config: AbstractEnvConfig::default(),
            action_kinds: vec![]
        }
    }
    pub fn with_config(mut self, config: AbstractEnvConfig) -> Self {
        self.config = config;
        self
    }
    pub fn with_controller(mut self, kind: ActionKind) -> Self {
        if !self.action_kinds.contains(&kind) { self.action_kinds.push(kind); }
        self
    }
    pub fn with_all_controllers(mut self) -> Self {
        for kind in EnumUtils::get_all_variants_of_enum::<ActionKind>() {
            self = self.with_controller(kind);
        }
        self
    }
    /// Also installs the configured log subscriber, unless one is already installed.
    pub fn build(self) -> AbstractBlocksEnv<E> {
        init_logging(&self.config.log);

        let c = &self.config;
        let controllers: BTreeMap<ActionKind, ActionController> = self.action_kinds.iter()
            .map(|k| (*k, ActionController::new(*k, &c.controller)))
            .collect();
        let action_predicates = controllers.keys().map(|k| k.predicate()).collect();

        AbstractBlocksEnv {
            controllers,
            abstraction: ObservationAbstraction::new(c.abstraction, c.controller.clone()).with_support_tolerance(c.support_tolerance),
            action_space: LiteralSpace::new(action_predicates),
            observation_space: ObservationPredicate::observation_space(),
            controller_max_steps: c.controller_max_steps,
            previous_low_level_observation: None,
            problem_objects: vec![],
            low_level_env: self.low_level_env
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AbstractEnvConfig {
    /// Largest number of low-level steps a single symbolic step may take.
    pub controller_max_steps: usize,
    pub abstraction: ObservationAbstractionMode,
    /// Largest gap between two blocks' faces for the upper one to count as resting on the lower.
    pub support_tolerance: f64,
    pub controller: ControllerConfig,
    pub log: LogConfig
}
impl Default for AbstractEnvConfig {
    fn default() -> Self {
        Self {
            controller_max_steps: 100,
            abstraction: ObservationAbstractionMode::default(),
            support_tolerance: 0.01,
            controller: ControllerConfig::default(),
            log: LogConfig::default()
        }
    }
}

/// Why a symbolic step stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepTermination {
    ControllerDone,
    LowLevelTerminal,
    TickBudgetExhausted
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DebugInfo {
    /// `None` for resets.
    pub termination: Option<StepTermination>,
    /// Low-level steps taken.
    pub num_ticks: usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;
    use crate::environments::controllers::ControlVector;
    use crate::environments::raw_observation::{BlockAttributes, GripperObservation};
    use crate::environments::LowLevelStep;

    /// Nothing ever moves, so a pickup never finishes.
    struct FrozenEnv {
        steps: usize,
        terminal_after: Option<usize>,
        closed: bool
    }
    impl FrozenEnv {
        fn observation() -> RawObservation {
            RawObservation::new(GripperObservation { position: Vector3::new(0.0, 0.0, 1.0), velocity: Vector3::zeros(), left_finger_position: 0.05 })
                .with_block("block0", BlockAttributes::new_cube(0.075, Vector3::new(1.0, 0.0, 0.5)))
        }
    }
    impl LowLevelEnv for FrozenEnv {
        fn reset(&mut self) -> Result<RawObservation, BlocksimError> { Ok(Self::observation()) }
        fn step(&mut self, _control: &ControlVector) -> Result<LowLevelStep, BlocksimError> {
            self.steps += 1;
            Ok(LowLevelStep { observation: Self::observation(), reward: 0.5, done: self.terminal_after == Some(self.steps) })
        }
        fn render(&self) -> Result<PixelBuffer, BlocksimError> { Ok(PixelBuffer::new(1, 1, [0, 0, 0])) }
        fn seed(&mut self, seed: Option<u64>) -> u64 { seed.unwrap_or(0) }
        fn close(&mut self) -> Result<(), BlocksimError> {
            self.closed = true;
            Ok(())
        }
        fn is_closed(&self) -> bool { self.closed }
    }

    fn frozen(terminal_after: Option<usize>, controller_max_steps: usize) -> AbstractBlocksEnv<FrozenEnv> {
        AbstractEnvBuilder::new(FrozenEnv { steps: 0, terminal_after, closed: false })
            .with_config(AbstractEnvConfig { controller_max_steps, ..Default::default() })
            .with_controller(ActionKind::Pickup)
            .build()
    }

    #[test]
    fn budget_exhaustion_is_reported_but_not_an_error() {
        let mut env = frozen(None, 7);
        env.reset().unwrap();
        let pickup = ActionKind::Pickup.predicate().ground(&["block0"]).unwrap();
        let (_, reward, done, info) = env.step(&pickup).unwrap();
        assert_eq!(info, DebugInfo { termination: Some(StepTermination::TickBudgetExhausted), num_ticks: 7 });
        assert_eq!(reward, 3.5);
        assert!(!done);
        assert_eq!(env.low_level_env().steps, 7);
    }

    #[test]
    fn low_level_terminal_stops_the_loop() {
        let mut env = frozen(Some(3), 100);
        env.reset().unwrap();
        let pickup = ActionKind::Pickup.predicate().ground(&["block0"]).unwrap();
        let (_, reward, done, info) = env.step(&pickup).unwrap();
        assert!(done);
        assert_eq!(reward, 1.5);
        assert_eq!(info.termination, Some(StepTermination::LowLevelTerminal));
        assert_eq!(info.num_ticks, 3);
    }

    #[test]
    fn unregistered_actions_are_configuration_errors() {
        let mut env = frozen(None, 5);
        env.reset().unwrap();
        let putontable = ActionKind::PutOnTable.predicate().ground(&[]).unwrap();
        assert!(matches!(env.step(&putontable), Err(BlocksimError::UnregisteredActionError(_))));
        assert_eq!(env.registered_action_kinds(), vec![ActionKind::Pickup]);
    }

    #[test]
    fn completed_controllers_do_not_advance_the_simulation() {
        let mut env = AbstractEnvBuilder::new(FrozenEnv { steps: 0, terminal_after: None, closed: false }).with_all_controllers().build();
        env.reset().unwrap();
        let puton = ActionKind::PutOn.predicate().ground(&["block0"]).unwrap();
        let (_, _, _, info) = env.step(&puton).unwrap();
        assert_eq!(info, DebugInfo { termination: Some(StepTermination::ControllerDone), num_ticks: 0 });
        assert_eq!(env.low_level_env().steps, 0);
    }

    #[test]
    fn closed_envs_refuse_steps_that_would_not_tick() {
        let mut env = AbstractEnvBuilder::new(FrozenEnv { steps: 0, terminal_after: None, closed: false }).with_all_controllers().build();
        env.reset().unwrap();
        env.close().unwrap();
        let puton = ActionKind::PutOn.predicate().ground(&["block0"]).unwrap();
        let putontable = ActionKind::PutOnTable.predicate().ground(&[]).unwrap();
        assert!(matches!(env.step(&puton), Err(BlocksimError::SessionClosedError(_))));
        assert!(matches!(env.step(&putontable), Err(BlocksimError::SessionClosedError(_))));
        assert!(matches!(env.seed(Some(1)), Err(BlocksimError::SessionClosedError(_))));
        assert!(matches!(env.reset(), Err(BlocksimError::SessionClosedError(_))));
    }

    #[test]
    fn step_before_reset_is_an_error() {
        let mut env = frozen(None, 5);
        let pickup = ActionKind::Pickup.predicate().ground(&["block0"]).unwrap();
        assert!(env.step(&pickup).is_err());
    }
}
