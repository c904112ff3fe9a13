use farspace_common::Kinematics;
use std::collections::BTreeMap;

/// Opaque handle to a body owned by the physics collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub u64);

/// Everything the physics collaborator needs to create a circular body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDef {
    pub kinematics: Kinematics,
    pub radius: f32,
    pub density: f32,
}

/// The physics engine as seen from the core.
///
/// The core creates and destroys bodies and reads their state back; the
/// dynamics live behind this trait.
pub trait PhysicsWorld {
    fn create_body(&mut self, def: BodyDef) -> BodyHandle;

    /// Destroying an unknown or already destroyed handle is a no-op.
    fn destroy_body(&mut self, handle: BodyHandle);

    fn body(&self, handle: BodyHandle) -> Option<Kinematics>;

    fn step(&mut self, dt: f32);

    fn body_count(&self) -> usize;
}

/// Force-free stand-in for a physics engine: bodies drift with their
/// velocity and spin. Used by the headless simulation and by tests.
#[derive(Debug, Default)]
pub struct KinematicWorld {
    bodies: BTreeMap<BodyHandle, BodyDef>,
    next_handle: u64,
}

impl KinematicWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn radius(&self, handle: BodyHandle) -> Option<f32> {
        self.bodies.get(&handle).map(|b| b.radius)
    }
}

impl PhysicsWorld for KinematicWorld {
    fn create_body(&mut self, def: BodyDef) -> BodyHandle {
        let handle = BodyHandle(self.next_handle);
        self.next_handle += 1;
        self.bodies.insert(handle, def);
        handle
    }

    fn destroy_body(&mut self, handle: BodyHandle) {
        self.bodies.remove(&handle);
    }

    fn body(&self, handle: BodyHandle) -> Option<Kinematics> {
        self.bodies.get(&handle).map(|b| b.kinematics)
    }

    fn step(&mut self, dt: f32) {
        for body in self.bodies.values_mut() {
            body.kinematics.integrate(dt);
        }
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }
}
