//! blocksim bridges a simulated robot arm working on a table of blocks and a symbolic
//! planning/learning layer.
//! It provides a local inverse kinematics solver over a body's kinematic chain, closed-loop grasp
//! controllers whose phase is inferred from each observation, and an action abstraction layer
//! that executes symbolic actions under a tick budget and abstracts the continuous world state
//! back into symbolic literals.
//! The physics engine is reached only through the `PhysicsClient` trait; an in-process kinematic
//! backend is included.

pub mod environments;
pub mod inverse_kinematics;
pub mod nonlinear_optimization;
pub mod physics_modules;
pub mod robot_modules;
pub mod utils;
