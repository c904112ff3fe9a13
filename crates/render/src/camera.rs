use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Viewpoint state read by the draw and streaming phases.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Camera position in world space.
    pub position: Vec2,
    /// Rotation in radians.
    pub angle: f32,
    /// Distance from the centre to the farthest visible point in the
    /// simulated plane.
    pub view_distance: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            angle: 0.0,
            view_distance: 10.0,
        }
    }
}

impl Camera {
    pub fn new(position: Vec2, view_distance: f32) -> Self {
        Self {
            position,
            view_distance,
            ..Self::default()
        }
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    /// Screen-plane position of a point on a layer at `depth`. Deeper layers
    /// scroll slower relative to the camera.
    pub fn parallax(&self, pos: Vec2, depth: f32) -> Vec2 {
        (pos - self.position) / depth + self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_default() {
        let cam = Camera::default();
        assert_eq!(cam.position, Vec2::ZERO);
        assert_eq!(cam.view_distance, 10.0);
    }

    #[test]
    fn parallax_pulls_deep_layers_towards_camera() {
        let cam = Camera::new(Vec2::new(10.0, 0.0), 5.0);
        assert_eq!(cam.parallax(Vec2::new(20.0, 0.0), 1.0), Vec2::new(20.0, 0.0));
        assert_eq!(cam.parallax(Vec2::new(20.0, 0.0), 2.0), Vec2::new(15.0, 0.0));
        assert_eq!(cam.parallax(cam.position, 10.0), cam.position);
    }
}
