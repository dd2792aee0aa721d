use std::collections::VecDeque;
use nalgebra::Vector3;
use blocksim::environments::abstract_env::{AbstractBlocksEnv, AbstractEnvBuilder, AbstractEnvConfig, StepTermination};
use blocksim::environments::controllers::{ActionKind, ControlVector};
use blocksim::environments::low_level_blocks_env::LowLevelBlocksEnvConfig;
use blocksim::environments::raw_observation::{BlockAttributes, GripperObservation, RawObservation};
use blocksim::environments::symbolic::Predicate;
use blocksim::environments::{LowLevelEnv, LowLevelStep};
use blocksim::physics_modules::physics_client::PixelBuffer;
use blocksim::utils::utils_errors::BlocksimError;

/// Hands out a scripted scene on every reset.
struct ScriptedEnv {
    scenes: VecDeque<Vec<&'static str>>
}
impl ScriptedEnv {
    fn observation(block_names: &[&str]) -> RawObservation {
        let mut obs = RawObservation::new(GripperObservation { position: Vector3::new(1.0, 0.7, 0.9), velocity: Vector3::zeros(), left_finger_position: 0.05 });
        for (i, name) in block_names.iter().enumerate() {
            obs = obs.with_block(name, BlockAttributes::new_cube(0.075, Vector3::new(1.25, 0.5 + 0.2 * i as f64, 0.5375)));
        }
        obs
    }
}
impl LowLevelEnv for ScriptedEnv {
    fn reset(&mut self) -> Result<RawObservation, BlocksimError> {
        match self.scenes.pop_front() {
            None => { Err(BlocksimError::new_generic_error_str("out of scenes", file!(), line!())) }
            Some(s) => { Ok(Self::observation(&s)) }
        }
    }
    fn step(&mut self, _control: &ControlVector) -> Result<LowLevelStep, BlocksimError> {
        Ok(LowLevelStep { observation: Self::observation(&[]), reward: 0.0, done: false })
    }
    fn render(&self) -> Result<PixelBuffer, BlocksimError> { Ok(PixelBuffer::new(1, 1, [0, 0, 0])) }
    fn seed(&mut self, seed: Option<u64>) -> u64 { seed.unwrap_or(0) }
    fn close(&mut self) -> Result<(), BlocksimError> { Ok(()) }
    fn is_closed(&self) -> bool { false }
}

fn names<T: ToString>(items: &[T]) -> Vec<String> {
    items.iter().map(|i| i.to_string()).collect()
}

#[test]
fn reset_replaces_the_object_domain() {
    let scenes = vec![vec!["block0", "block1"], vec!["block7"]].into_iter().collect();
    let mut env = AbstractEnvBuilder::new(ScriptedEnv { scenes }).with_controller(ActionKind::Pickup).build();

    env.reset().unwrap();
    assert_eq!(env.problem_objects(), &vec!["block0".to_string(), "block1".to_string()]);
    assert_eq!(names(&env.action_space().all_ground_literals()), vec!["pickup(block0)", "pickup(block1)"]);

    env.reset().unwrap();
    assert_eq!(names(&env.action_space().all_ground_literals()), vec!["pickup(block7)"]);
    let stale = ActionKind::Pickup.predicate().ground(&["block0"]).unwrap();
    assert!(!env.action_space().contains(&stale));
}

#[test]
fn unregistered_or_unknown_actions_are_rejected() {
    let scenes = vec![vec!["block0"]].into_iter().collect();
    let mut env = AbstractEnvBuilder::new(ScriptedEnv { scenes }).with_controller(ActionKind::Pickup).build();
    env.reset().unwrap();

    let putontable = ActionKind::PutOnTable.predicate().ground(&[]).unwrap();
    assert!(matches!(env.step(&putontable), Err(BlocksimError::UnregisteredActionError(_))));

    let stack = Predicate::new("stack", vec![]).ground(&[]).unwrap();
    assert!(matches!(env.step(&stack), Err(BlocksimError::UnregisteredActionError(_))));
}

fn uniform_blocks_config(seed: u64) -> LowLevelBlocksEnvConfig {
    LowLevelBlocksEnvConfig { seed: Some(seed), block_size_std: 0.0, ..Default::default() }
}

#[test]
fn pickup_ends_with_the_block_held() {
    let mut env = AbstractBlocksEnv::new_blocks_env(uniform_blocks_config(11), AbstractEnvConfig::default()).unwrap();
    let (obs, info) = env.reset().unwrap();
    assert_eq!(info.termination, None);
    assert!(names(&obs.iter().collect::<Vec<_>>()).contains(&"ontable(block0)".to_string()));
    assert!(names(&obs.iter().collect::<Vec<_>>()).contains(&"handempty()".to_string()));

    let pickup = ActionKind::Pickup.predicate().ground(&["block0"]).unwrap();
    let (obs, reward, done, info) = env.step(&pickup).unwrap();
    assert_eq!(info.termination, Some(StepTermination::ControllerDone));
    assert!(info.num_ticks > 0 && info.num_ticks < env.controller_max_steps());
    assert_eq!(reward, 0.0);
    assert!(!done);

    let n = names(&obs.iter().collect::<Vec<_>>());
    assert!(n.contains(&"holding(block0)".to_string()), "{:?}", n);
    assert!(!n.contains(&"handempty()".to_string()));
    assert!(!n.contains(&"ontable(block0)".to_string()));
    env.close().unwrap();
}

#[test]
fn same_seed_same_symbolic_trajectory() {
    let run = || {
        let mut env = AbstractBlocksEnv::new_blocks_env(uniform_blocks_config(5), AbstractEnvConfig::default()).unwrap();
        let (first, _) = env.reset().unwrap();
        let pickup = ActionKind::Pickup.predicate().ground(&["block0"]).unwrap();
        let (second, _, _, info) = env.step(&pickup).unwrap();
        (first, second, info)
    };
    assert_eq!(run(), run());
}

#[test]
fn placing_actions_leave_the_scene_alone() {
    let mut env = AbstractBlocksEnv::new_blocks_env(uniform_blocks_config(2), AbstractEnvConfig::default()).unwrap();
    let (before, _) = env.reset().unwrap();
    let putontable = ActionKind::PutOnTable.predicate().ground(&[]).unwrap();
    let (after, _, _, info) = env.step(&putontable).unwrap();
    assert_eq!(info.num_ticks, 0);
    assert_eq!(before, after);
}

#[test]
fn collected_transitions_use_registered_actions_and_serialize() {
    use blocksim::environments::transitions::{collect_transitions, Transition, TransitionCollectionConfig};
    use blocksim::utils::utils_traits::ToAndFromJsonString;

    let mut env = AbstractBlocksEnv::new_blocks_env(uniform_blocks_config(9), AbstractEnvConfig::default()).unwrap();
    env.seed(Some(9)).unwrap();
    let transitions = collect_transitions(&mut env, &TransitionCollectionConfig { num_episodes: 2, episode_length: 3 }).unwrap();
    assert!(!transitions.is_empty() && transitions.len() <= 6);

    let action_names: Vec<String> = env.registered_action_kinds().iter().map(|k| k.predicate().name().to_string()).collect();
    for t in &transitions {
        assert!(action_names.contains(&t.action.predicate().name().to_string()));
        assert!(env.observation_space().contains(&t.state));
    }

    let json = transitions.convert_to_json_string().unwrap();
    let loaded = Vec::<Transition>::load_from_json_string(&json).unwrap();
    assert_eq!(loaded, transitions);
}
