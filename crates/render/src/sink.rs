use std::fmt::Write as _;

use farspace_common::{DrawLevel, TextureId};
use glam::{Vec2, Vec4};

use crate::camera::Camera;

/// One sprite to put on screen, already projected for parallax.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCommand {
    pub level: DrawLevel,
    pub texture: TextureId,
    pub position: Vec2,
    pub angle: f32,
    /// Texture size after depth scaling.
    pub size: f32,
    /// Pivot offset from the sprite corner, in world units after depth scaling.
    pub origin: Vec2,
    pub tint: Vec4,
    pub additive: bool,
}

/// Debug outline primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugCircle {
    pub center: Vec2,
    pub radius: f32,
    pub color: Vec4,
}

/// Backend-agnostic output of the draw phase. Sinks only receive commands;
/// they never see or mutate the object registry.
pub trait DrawSink {
    fn begin_frame(&mut self, _camera: &Camera) {}

    fn sprite(&mut self, cmd: &DrawCommand);

    fn circle(&mut self, _circle: &DebugCircle) {}

    fn end_frame(&mut self) {}
}

/// Keeps every command in order; used by tests and the CLI draw dump.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub frames: usize,
    pub sprites: Vec<DrawCommand>,
    pub circles: Vec<DebugCircle>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.sprites.clear();
        self.circles.clear();
    }

    /// Levels in the order they were first drawn.
    pub fn level_order(&self) -> Vec<DrawLevel> {
        let mut order: Vec<DrawLevel> = Vec::new();
        for cmd in &self.sprites {
            if order.last() != Some(&cmd.level) {
                order.push(cmd.level);
            }
        }
        order
    }
}

impl DrawSink for RecordingSink {
    fn begin_frame(&mut self, _camera: &Camera) {
        self.frames += 1;
    }

    fn sprite(&mut self, cmd: &DrawCommand) {
        self.sprites.push(*cmd);
    }

    fn circle(&mut self, circle: &DebugCircle) {
        self.circles.push(*circle);
    }
}

/// Human-readable frame dump for the CLI and logs.
#[derive(Debug, Default)]
pub struct TextSink {
    out: String,
    current_level: Option<DrawLevel>,
}

impl TextSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output(&self) -> &str {
        &self.out
    }

    pub fn into_string(self) -> String {
        self.out
    }
}

impl DrawSink for TextSink {
    fn begin_frame(&mut self, camera: &Camera) {
        self.current_level = None;
        let _ = writeln!(
            self.out,
            "=== Frame (camera=({:.1}, {:.1}), view={:.1}) ===",
            camera.position.x, camera.position.y, camera.view_distance
        );
    }

    fn sprite(&mut self, cmd: &DrawCommand) {
        if self.current_level != Some(cmd.level) {
            self.current_level = Some(cmd.level);
            let _ = writeln!(self.out, "[{:?}]", cmd.level);
        }
        let _ = writeln!(
            self.out,
            "  tex={} pos=({:.2}, {:.2}) size={:.2} alpha={:.2}{}",
            cmd.texture.0,
            cmd.position.x,
            cmd.position.y,
            cmd.size,
            cmd.tint.w,
            if cmd.additive { " additive" } else { "" }
        );
    }

    fn circle(&mut self, circle: &DebugCircle) {
        let _ = writeln!(
            self.out,
            "  circle at ({:.2}, {:.2}) r={:.2}",
            circle.center.x, circle.center.y, circle.radius
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(level: DrawLevel, texture: u32) -> DrawCommand {
        DrawCommand {
            level,
            texture: TextureId(texture),
            position: Vec2::new(1.0, 2.0),
            angle: 0.0,
            size: 0.5,
            origin: Vec2::ZERO,
            tint: Vec4::ONE,
            additive: false,
        }
    }

    #[test]
    fn text_sink_groups_by_level() {
        let mut sink = TextSink::new();
        sink.begin_frame(&Camera::default());
        sink.sprite(&cmd(DrawLevel::Deco, 3));
        sink.sprite(&cmd(DrawLevel::Deco, 4));
        sink.sprite(&cmd(DrawLevel::Bodies, 5));
        let out = sink.into_string();

        assert!(out.contains("=== Frame"));
        assert_eq!(out.matches("[Deco]").count(), 1);
        assert!(out.contains("[Bodies]"));
        assert!(out.contains("tex=5 pos=(1.00, 2.00)"));
    }

    #[test]
    fn recording_sink_level_order() {
        let mut sink = RecordingSink::new();
        sink.begin_frame(&Camera::default());
        sink.sprite(&cmd(DrawLevel::FarDeco2, 1));
        sink.sprite(&cmd(DrawLevel::FarDeco2, 1));
        sink.sprite(&cmd(DrawLevel::Bodies, 2));
        assert_eq!(sink.frames, 1);
        assert_eq!(sink.level_order(), vec![DrawLevel::FarDeco2, DrawLevel::Bodies]);
    }
}
