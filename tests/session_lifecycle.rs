use blocksim::environments::abstract_env::{AbstractBlocksEnv, AbstractEnvConfig};
use blocksim::environments::controllers::{ActionKind, ControlVector};
use blocksim::environments::low_level_blocks_env::{LowLevelBlocksEnv, LowLevelBlocksEnvConfig};
use blocksim::environments::LowLevelEnv;
use blocksim::utils::utils_errors::BlocksimError;

fn low_level(seed: u64) -> LowLevelBlocksEnv<blocksim::physics_modules::kinematic_physics_client::KinematicPhysicsClient> {
    LowLevelBlocksEnv::new_kinematic(LowLevelBlocksEnvConfig { seed: Some(seed), ..Default::default() }).unwrap()
}

#[test]
fn closing_twice_is_a_lifecycle_error() {
    let mut env = low_level(0);
    env.reset().unwrap();
    env.close().unwrap();
    assert!(matches!(env.close(), Err(BlocksimError::SessionClosedError(_))));
    assert!(matches!(env.step(&ControlVector::zeros()), Err(BlocksimError::SessionClosedError(_))));
    assert!(matches!(env.get_state(), Err(BlocksimError::SessionClosedError(_))));
}

#[test]
fn dropping_an_open_env_is_fine() {
    let mut env = low_level(1);
    env.reset().unwrap();
    drop(env);
}

#[test]
fn environments_side_by_side_are_independent() {
    let mut a = low_level(3);
    let mut b = low_level(3);
    let obs_a = a.reset().unwrap();
    let obs_b = b.reset().unwrap();
    assert_eq!(obs_a, obs_b);

    a.close().unwrap();
    let step = b.step(&ControlVector::new(0.0, 0.0, 1.0, 0.0)).unwrap();
    assert!(step.observation.gripper.position.z > obs_b.gripper.position.z);
}

#[test]
fn abstract_env_forwards_the_closed_session() {
    let mut env = AbstractBlocksEnv::new_blocks_env(LowLevelBlocksEnvConfig { seed: Some(4), ..Default::default() }, AbstractEnvConfig::default()).unwrap();
    env.reset().unwrap();
    env.close().unwrap();
    let pickup = ActionKind::Pickup.predicate().ground(&["block0"]).unwrap();
    assert!(matches!(env.step(&pickup), Err(BlocksimError::SessionClosedError(_))));
    assert!(matches!(env.reset(), Err(BlocksimError::SessionClosedError(_))));
}

#[test]
fn closed_abstract_env_refuses_actions_that_finish_without_ticking() {
    let mut env = AbstractBlocksEnv::new_blocks_env(LowLevelBlocksEnvConfig { seed: Some(5), ..Default::default() }, AbstractEnvConfig::default()).unwrap();
    env.reset().unwrap();
    env.close().unwrap();
    assert!(env.low_level_env().is_closed());
    let putontable = ActionKind::PutOnTable.predicate().ground(&[]).unwrap();
    let puton = ActionKind::PutOn.predicate().ground(&["block0"]).unwrap();
    assert!(matches!(env.step(&putontable), Err(BlocksimError::SessionClosedError(_))));
    assert!(matches!(env.step(&puton), Err(BlocksimError::SessionClosedError(_))));
    assert!(matches!(env.seed(Some(5)), Err(BlocksimError::SessionClosedError(_))));
}
