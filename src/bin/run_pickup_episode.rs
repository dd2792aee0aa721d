extern crate blocksim;

use std::env;
use blocksim::environments::abstract_env::{AbstractBlocksEnv, AbstractEnvConfig};
use blocksim::environments::controllers::ActionKind;
use blocksim::environments::low_level_blocks_env::LowLevelBlocksEnvConfig;
use blocksim::environments::symbolic::Literal;
use blocksim::inverse_kinematics::KinematicSolver;
use blocksim::robot_modules::robot_model_module::RobotModelModule;
use blocksim::utils::utils_console::{blocksim_print, blocksim_print_labeled, PrintColor, PrintMode};
use blocksim::utils::utils_errors::BlocksimError;
use blocksim::utils::utils_logging::{LogConfig, LogLevel};

/// Usage: run_pickup_episode [seed] [--verbose]
fn main() -> Result<(), BlocksimError> {
    let args: Vec<String> = env::args().collect();
    let verbose = args.iter().any(|a| a == "--verbose");
    let seed = match args.iter().skip(1).find(|a| !a.starts_with("--")) {
        None => { None }
        Some(s) => { Some(s.parse::<u64>().map_err(|e| BlocksimError::new_generic_error_str(&format!("seed must be an integer ({})", e), file!(), line!()))?) }
    };

    let config = AbstractEnvConfig { log: LogConfig { level: LogLevel::Info, with_target: false }, ..Default::default() };
    let mut env = AbstractBlocksEnv::new_blocks_env(LowLevelBlocksEnvConfig { seed, ..Default::default() }, config)?;

    if verbose {
        RobotModelModule::new_gripper_arm()?.print_summary();
        let low_level_env = env.low_level_env();
        let limits = KinematicSolver::default().get_joint_ranges(low_level_env.client()?, low_level_env.robot(), low_level_env.kinematic_chain().arm_joint_idxs())?;
        limits.print_summary();
    }

    let (mut obs, _) = env.reset()?;
    blocksim_print_labeled("initial observation: ", &literal_strings(&obs), PrintColor::Blue);

    // Nothing puts blocks back down, so every pickup after the first starts with a full hand.
    for block in env.problem_objects().clone() {
        let action = ActionKind::Pickup.predicate().ground(&[block.as_str()])?;
        let (next_obs, reward, done, info) = env.step(&action)?;
        blocksim_print_labeled(&format!("{} ---> ", action), &format!("reward {}, done {}, {:?}", reward, done, info), PrintColor::Green);
        blocksim_print(&format!("   > {}", literal_strings(&next_obs)), PrintMode::Println, PrintColor::None, false);
        obs = next_obs;
    }

    blocksim_print(&format!("final observation has {} literals.", obs.len()), PrintMode::Println, PrintColor::Cyan, false);
    if verbose {
        env.low_level_env().get_state()?.print_summary();
    }
    env.close()
}

fn literal_strings<'a, I: IntoIterator<Item = &'a Literal>>(literals: I) -> String {
    format!("{:?}", literals.into_iter().map(|l| l.to_string()).collect::<Vec<_>>())
}
