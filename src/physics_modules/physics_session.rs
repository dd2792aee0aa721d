use tracing::debug;
use crate::physics_modules::physics_client::PhysicsClient;
use crate::utils::utils_errors::BlocksimError;

/// Exclusive owner of one physics client connection.
///
/// The connection is acquired when the session is created and released exactly once, either by an
/// explicit `close` or when the session is dropped.  Every access after `close` fails with a
/// `SessionClosedError`.  Sessions are not shared: two environments that need to run side by side
/// each own their own session.
///
/// # Example
/// ```
/// use blocksim::physics_modules::physics_session::PhysicsSession;
/// use blocksim::physics_modules::kinematic_physics_client::{ConnectionMode, KinematicPhysicsClient, KinematicPhysicsParameters};
/// use blocksim::physics_modules::physics_client::PhysicsClient;
///
/// let mut session = PhysicsSession::new(KinematicPhysicsClient::connect(ConnectionMode::Direct, KinematicPhysicsParameters::default()));
/// session.client_mut().unwrap().step_tick().unwrap();
/// session.close().unwrap();
/// assert!(session.client().is_err());
/// ```
#[derive(Debug)]
pub struct PhysicsSession<C: PhysicsClient> {
    client: Option<C>
}
impl<C: PhysicsClient> PhysicsSession<C> {
    pub fn new(client: C) -> Self {
        Self { client: Some(client) }
    }
    pub fn client(&self) -> Result<&C, BlocksimError> {
        return match &self.client {
            None => { Err(BlocksimError::new_session_closed_error("client", file!(), line!())) }
            Some(c) => { Ok(c) }
        }
    }
    pub fn client_mut(&mut self) -> Result<&mut C, BlocksimError> {
        return match &mut self.client {
            None => { Err(BlocksimError::new_session_closed_error("client_mut", file!(), line!())) }
            Some(c) => { Ok(c) }
        }
    }
    /// Disconnects the client.  Closing an already closed session is a lifecycle error.
    pub fn close(&mut self) -> Result<(), BlocksimError> {
        return match self.client.take() {
            None => { Err(BlocksimError::new_session_closed_error("close", file!(), line!())) }
            Some(mut c) => {
                debug!("closing physics session");
                c.disconnect()
            }
        }
    }
    pub fn is_closed(&self) -> bool {
        self.client.is_none()
    }
}
impl<C: PhysicsClient> Drop for PhysicsSession<C> {
    fn drop(&mut self) {
        if let Some(mut c) = self.client.take() {
            // Release failures cannot be reported from here.
            let _ = c.disconnect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use crate::physics_modules::kinematic_physics_client::{ConnectionMode, KinematicPhysicsClient, KinematicPhysicsParameters};

    fn session() -> PhysicsSession<KinematicPhysicsClient> {
        PhysicsSession::new(KinematicPhysicsClient::connect(ConnectionMode::Direct, KinematicPhysicsParameters::default()))
    }

    #[test]
    fn close_releases_exactly_once() {
        let mut s = session();
        assert!(!s.is_closed());
        s.close().unwrap();
        assert!(s.is_closed());
        assert!(matches!(s.close(), Err(BlocksimError::SessionClosedError(_))));
        assert!(matches!(s.client_mut(), Err(BlocksimError::SessionClosedError(_))));
    }

    /// Counts disconnects; everything else is forwarded to a kinematic client.
    struct CountingClient {
        inner: KinematicPhysicsClient,
        disconnects: Rc<Cell<usize>>
    }
    impl PhysicsClient for CountingClient {
        fn reset_simulation(&mut self) -> Result<(), BlocksimError> { self.inner.reset_simulation() }
        fn load_body(&mut self, spec: &crate::physics_modules::physics_client::BodySpec) -> Result<usize, BlocksimError> { self.inner.load_body(spec) }
        fn remove_body(&mut self, body: usize) -> Result<(), BlocksimError> { self.inner.remove_body(body) }
        fn set_base_pose(&mut self, body: usize, position: &nalgebra::Vector3<f64>, orientation: &nalgebra::UnitQuaternion<f64>) -> Result<(), BlocksimError> { self.inner.set_base_pose(body, position, orientation) }
        fn get_base_pose(&self, body: usize) -> Result<(nalgebra::Vector3<f64>, nalgebra::UnitQuaternion<f64>), BlocksimError> { self.inner.get_base_pose(body) }
        fn num_joints(&self, body: usize) -> Result<usize, BlocksimError> { self.inner.num_joints(body) }
        fn get_joint_info(&self, body: usize, joint_idx: usize) -> Result<crate::physics_modules::physics_client::JointInfo, BlocksimError> { self.inner.get_joint_info(body, joint_idx) }
        fn get_joint_state(&self, body: usize, joint_idx: usize) -> Result<f64, BlocksimError> { self.inner.get_joint_state(body, joint_idx) }
        fn reset_joint_state(&mut self, body: usize, joint_idx: usize, value: f64) -> Result<(), BlocksimError> { self.inner.reset_joint_state(body, joint_idx, value) }
        fn set_joint_target(&mut self, body: usize, joint_idx: usize, value: f64) -> Result<(), BlocksimError> { self.inner.set_joint_target(body, joint_idx, value) }
        fn get_link_state(&self, body: usize, link_idx: usize) -> Result<crate::physics_modules::physics_client::LinkState, BlocksimError> { self.inner.get_link_state(body, link_idx) }
        fn calculate_inverse_kinematics(&self, body: usize, end_effector_link_idx: usize, target_position: &nalgebra::Vector3<f64>, target_orientation: &nalgebra::UnitQuaternion<f64>, limits: &crate::inverse_kinematics::JointLimits) -> Result<Vec<f64>, BlocksimError> { self.inner.calculate_inverse_kinematics(body, end_effector_link_idx, target_position, target_orientation, limits) }
        fn step_tick(&mut self) -> Result<(), BlocksimError> { self.inner.step_tick() }
        fn save_snapshot(&mut self) -> Result<usize, BlocksimError> { self.inner.save_snapshot() }
        fn restore_snapshot(&mut self, snapshot: usize) -> Result<(), BlocksimError> { self.inner.restore_snapshot(snapshot) }
        fn has_display(&self) -> bool { self.inner.has_display() }
        fn render(&self, camera: &crate::physics_modules::physics_client::CameraSpec) -> Result<crate::physics_modules::physics_client::PixelBuffer, BlocksimError> { self.inner.render(camera) }
        fn disconnect(&mut self) -> Result<(), BlocksimError> {
            self.disconnects.set(self.disconnects.get() + 1);
            self.inner.disconnect()
        }
    }

    #[test]
    fn drop_releases_an_open_session_and_not_a_closed_one() {
        let counter = Rc::new(Cell::new(0));
        {
            let _s = PhysicsSession::new(CountingClient { inner: KinematicPhysicsClient::connect(ConnectionMode::Direct, KinematicPhysicsParameters::default()), disconnects: counter.clone() });
        }
        assert_eq!(counter.get(), 1);

        {
            let mut s = PhysicsSession::new(CountingClient { inner: KinematicPhysicsClient::connect(ConnectionMode::Direct, KinematicPhysicsParameters::default()), disconnects: counter.clone() });
            s.close().unwrap();
        }
        assert_eq!(counter.get(), 2);
    }
}
