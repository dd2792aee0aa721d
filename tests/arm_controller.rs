use std::collections::BTreeMap;
use nalgebra::Vector3;
use blocksim::environments::controllers::{pickup_policy, ControllerConfig};
use blocksim::environments::low_level_blocks_env::{LowLevelBlocksEnv, LowLevelBlocksEnvConfig};
use blocksim::environments::raw_observation::BlockAttributes;
use blocksim::environments::LowLevelEnv;

#[test]
fn pickup_lifts_a_single_block_to_pick_height() {
    let mut env = LowLevelBlocksEnv::new_kinematic(LowLevelBlocksEnvConfig { seed: Some(0), ..Default::default() }).unwrap();
    env.reset().unwrap();

    let mut state = BTreeMap::new();
    state.insert("block0".to_string(), BlockAttributes::new_cube(0.075, Vector3::new(1.25, 0.5, 0.5375)));
    let mut obs = env.set_block_states(&state).unwrap();
    assert_eq!(obs.block_names(), vec!["block0".to_string()]);

    let config = ControllerConfig::default();
    let mut finished = false;
    for _ in 0..100 {
        let (control, done) = pickup_policy(&config, &obs, "block0").unwrap();
        if done {
            finished = true;
            break;
        }
        obs = env.step(&control).unwrap().observation;
    }

    assert!(finished);
    let block = obs.get_block("block0").unwrap();
    assert!(block.position.z >= config.pick_height);
    // fingers rest against the block faces, short of fully closed
    assert!((obs.gripper.left_finger_position - 0.0325).abs() < 1e-3, "{}", obs.gripper.left_finger_position);
}

#[test]
fn pickup_of_a_block_on_another_block_leaves_the_lower_one_behind() {
    let mut env = LowLevelBlocksEnv::new_kinematic(LowLevelBlocksEnvConfig { seed: Some(0), ..Default::default() }).unwrap();
    env.reset().unwrap();

    let mut state = BTreeMap::new();
    state.insert("block0".to_string(), BlockAttributes::new_cube(0.075, Vector3::new(1.25, 0.6, 0.5375)));
    state.insert("block1".to_string(), BlockAttributes::new_cube(0.075, Vector3::new(1.25, 0.6, 0.6125)));
    let mut obs = env.set_block_states(&state).unwrap();

    let config = ControllerConfig::default();
    for _ in 0..100 {
        let (control, done) = pickup_policy(&config, &obs, "block1").unwrap();
        if done { break; }
        obs = env.step(&control).unwrap().observation;
    }

    assert!(obs.get_block("block1").unwrap().position.z >= config.pick_height);
    assert!((obs.get_block("block0").unwrap().position.z - 0.5375).abs() < 1e-9);
}
