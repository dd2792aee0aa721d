extern crate blocksim;

use std::env;
use std::fs;
use blocksim::environments::abstract_env::{AbstractBlocksEnv, AbstractEnvConfig};
use blocksim::environments::low_level_blocks_env::LowLevelBlocksEnvConfig;
use blocksim::environments::transitions::{collect_transitions, TransitionCollectionConfig};
use blocksim::utils::utils_console::{blocksim_print, PrintColor, PrintMode};
use blocksim::utils::utils_errors::BlocksimError;
use blocksim::utils::utils_traits::{ToAndFromJsonString, ToAndFromTomlString};

/// Usage: collect_transitions <output.json> [seed] [abstract_env_config.toml]
fn main() -> Result<(), BlocksimError> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        return Err(BlocksimError::new_generic_error_str("usage: collect_transitions <output.json> [seed] [abstract_env_config.toml]", file!(), line!()));
    }
    let output_path = &args[1];
    let seed = match args.get(2) {
        None => { 0 }
        Some(s) => { s.parse::<u64>().map_err(|e| BlocksimError::new_generic_error_str(&format!("seed must be an integer ({})", e), file!(), line!()))? }
    };

    let config = match args.get(3) {
        None => { AbstractEnvConfig::default() }
        Some(path) => {
            let toml_string = fs::read_to_string(path).map_err(|e| BlocksimError::new_generic_error_str(&format!("could not read {}: {}", path, e), file!(), line!()))?;
            AbstractEnvConfig::load_from_toml_string(&toml_string)?
        }
    };

    let mut env = AbstractBlocksEnv::new_blocks_env(LowLevelBlocksEnvConfig::default(), config)?;
    env.seed(Some(seed))?;

    let transitions = collect_transitions(&mut env, &TransitionCollectionConfig::default())?;
    env.close()?;

    let json = transitions.convert_to_json_string()?;
    fs::write(output_path, json).map_err(|e| BlocksimError::new_generic_error_str(&format!("could not write {}: {}", output_path, e), file!(), line!()))?;

    let num_with_effects = transitions.iter().filter(|t| !t.effects().is_empty()).count();
    blocksim_print(&format!("wrote {} transitions ({} with effects) to {}", transitions.len(), num_with_effects, output_path), PrintMode::Println, PrintColor::Green, true);
    Ok(())
}
