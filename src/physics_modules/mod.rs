pub mod physics_client;
pub mod kinematic_physics_client;
pub mod physics_session;
