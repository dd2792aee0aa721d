use serde::{Serialize, Deserialize};
use crate::environments::controllers::ControlVector;
use crate::environments::raw_observation::RawObservation;
use crate::physics_modules::physics_client::PixelBuffer;
use crate::utils::utils_errors::BlocksimError;

pub mod raw_observation;
pub mod symbolic;
pub mod controllers;
pub mod observation_abstraction;
pub mod low_level_blocks_env;
pub mod abstract_env;
pub mod transitions;

/// A continuous environment driven by control vectors, one tick at a time.
pub trait LowLevelEnv {
    fn reset(&mut self) -> Result<RawObservation, BlocksimError>;
    /// Executes one control vector and returns the resulting observation.
    fn step(&mut self, control: &ControlVector) -> Result<LowLevelStep, BlocksimError>;
    fn render(&self) -> Result<PixelBuffer, BlocksimError>;
    /// Reseeds the environment's random generator and returns the seed used.
    fn seed(&mut self, seed: Option<u64>) -> u64;
    fn close(&mut self) -> Result<(), BlocksimError>;
    /// True once `close` has released the environment's resources.
    fn is_closed(&self) -> bool;
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LowLevelStep {
    pub observation: RawObservation,
    pub reward: f64,
    pub done: bool
}
