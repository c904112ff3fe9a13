use farspace_kernel::ObjectRegistry;
use farspace_render::{DebugCircle, DrawLevelManager, DrawSink, drawable_circle};
use glam::Vec4;

pub const VISIBLE_COLOR: Vec4 = Vec4::new(0.0, 1.0, 0.0, 0.5);
pub const CULLED_COLOR: Vec4 = Vec4::new(1.0, 0.0, 0.0, 0.5);

/// Outlines every registered drawable with its bounding circle, coloured by
/// whether it is in the visible set. Returns the number of circles emitted.
pub fn draw_bounds(
    draw: &DrawLevelManager,
    registry: &ObjectRegistry,
    sink: &mut dyn DrawSink,
) -> usize {
    let mut emitted = 0;
    for (_, key) in draw.registered() {
        let Some(owner) = registry.get(key.entity) else {
            continue;
        };
        let Some((center, radius)) = drawable_circle(owner, key) else {
            continue;
        };
        let color = if draw.is_in_cam(key) {
            VISIBLE_COLOR
        } else {
            CULLED_COLOR
        };
        sink.circle(&DebugCircle {
            center,
            radius,
            color,
        });
        emitted += 1;
    }
    emitted
}
