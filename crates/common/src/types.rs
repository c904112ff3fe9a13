use glam::Vec2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an entity in the world.
///
/// The id is stable across Near/Far conversions: an entity keeps its id while
/// its representation changes, so external trackers should key on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First eight hex digits, for log lines and debug output.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

/// Planar motion state: position, velocity, angle and spin.
///
/// Angles are in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Kinematics {
    pub position: Vec2,
    pub velocity: Vec2,
    pub angle: f32,
    pub angular_velocity: f32,
}

impl Kinematics {
    /// A body at rest at `position`.
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_angular_velocity(mut self, angular_velocity: f32) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    /// Advance by `dt` seconds without any forces.
    pub fn integrate(&mut self, dt: f32) {
        self.position += self.velocity * dt;
        self.angle += self.angular_velocity * dt;
    }

    /// Whether position, velocity and angle agree with `other` within `eps`.
    pub fn approx_eq(&self, other: &Kinematics, eps: f32) -> bool {
        self.position.abs_diff_eq(other.position, eps)
            && self.velocity.abs_diff_eq(other.velocity, eps)
            && (self.angle - other.angle).abs() <= eps
    }
}

impl Default for Kinematics {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            angle: 0.0,
            angular_velocity: 0.0,
        }
    }
}
