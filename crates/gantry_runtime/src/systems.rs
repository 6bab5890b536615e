//! Per-entity systems: movement with wall bounces, and drawing.

use crate::components::{Drawing, Physics};
use gantry_services::{Rect, Stopwatch, Viewport};
use glam::DVec2;

/// Distance a body is pushed back inside the window after touching a wall.
const WALL_PUSHBACK: f64 = 5.0;

/// Milliseconds-to-displacement scale applied to velocities.
const DELTA_SCALE: f64 = 4.5e6;

/// Move a body, bouncing it off the viewport walls.
pub fn physics_system(
    (physics,): &mut (Physics,),
    (viewport, stopwatch): &mut (Viewport, Stopwatch),
) {
    physics.angle = normalize_angle(physics.angle);

    let half = physics.size.as_dvec2() / 2.0;
    let (sin, cos) = physics.angle.to_radians().sin_cos();
    let corners = [
        DVec2::new(-half.x, -half.y),
        DVec2::new(half.x, -half.y),
        DVec2::new(-half.x, half.y),
        DVec2::new(half.x, half.y),
    ]
    .map(|corner| {
        DVec2::new(
            corner.x * cos - corner.y * sin,
            corner.x * sin + corner.y * cos,
        ) + physics.position
    });

    let bounds = viewport.size().as_dvec2();
    let mut offset = DVec2::ZERO;
    let mut collides_x = false;
    let mut collides_y = false;

    for corner in corners {
        if let Some(push) = wall_offset(corner.x, bounds.x) {
            collides_x = true;
            if push.abs() > offset.x.abs() {
                offset.x = push;
            }
        }
        if let Some(push) = wall_offset(corner.y, bounds.y) {
            collides_y = true;
            if push.abs() > offset.y.abs() {
                offset.y = push;
            }
        }
    }

    if collides_x {
        physics.velocity.x = -physics.velocity.x;
    }
    if collides_y {
        physics.velocity.y = -physics.velocity.y;
    }

    let delta = stopwatch.milliseconds() as f64 / DELTA_SCALE;
    physics.position += physics.velocity * delta + offset;
}

/// Queue a body's image and its label below it. Only runs on draw frames.
pub fn drawing_system(
    (drawing, physics): &mut (Drawing, Physics),
    (viewport,): &mut (Viewport,),
) {
    if !viewport.on_draw_frame() {
        return;
    }

    let image = drawing.image_size.as_dvec2();
    let text = drawing.text_size.as_dvec2();
    let position = physics.position;

    let image_rect = Rect {
        x: (position.x - image.x / 2.0) as i32,
        y: (position.y - image.y / 2.0) as i32,
        w: drawing.image_size.x,
        h: drawing.image_size.y,
    };

    // Below the image's bounding circle, so rotation never overlaps it.
    let text_rect = Rect {
        x: (image_rect.x as f64 + (image.x - text.x) / 2.0) as i32,
        y: (position.y + image.length() / 2.0) as i32,
        w: drawing.text_size.x,
        h: drawing.text_size.y,
    };

    viewport.push_texture(drawing.image, image_rect, physics.angle);
    viewport.push_texture(drawing.text, text_rect, 0.0);
}

/// Fold an angle in degrees into [0, 360).
pub fn normalize_angle(angle: f64) -> f64 {
    if (0.0..360.0).contains(&angle) {
        angle
    } else {
        angle.rem_euclid(360.0)
    }
}

/// Push needed to bring `coord` back inside `[0, limit]`, if it is outside.
fn wall_offset(coord: f64, limit: f64) -> Option<f64> {
    if coord < 0.0 {
        Some(-coord + WALL_PUSHBACK)
    } else if coord > limit {
        Some(limit - coord - WALL_PUSHBACK)
    } else {
        None
    }
}
