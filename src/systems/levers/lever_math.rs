use bevy::prelude::*;

const SPAN_EPSILON: f32 = 1e-6;

/// Linear interpolation with `t` clamped to [0, 1].
pub fn lerp_clamped(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t.clamp(0.0, 1.0)
}

/// Angle shown for `value` across `[min_angle, max_angle]`.
pub fn value_to_angle(min_angle: f32, max_angle: f32, value: f32) -> f32 {
    lerp_clamped(min_angle, max_angle, value)
}

/// Position of `angle` inside the range, unclamped. A zero-width range maps to 0.
pub fn angle_to_value(min_angle: f32, max_angle: f32, angle: f32) -> f32 {
    let span = max_angle - min_angle;
    if span.abs() <= SPAN_EPSILON {
        return 0.0;
    }
    (angle - min_angle) / span
}

/// Signed shortest distance in degrees from `from` to `to`, in (-180, 180].
pub fn delta_angle(from: f32, to: f32) -> f32 {
    let wrapped = (to - from).rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Angle in the local YZ plane, measured from +Y towards +Z. X is ignored.
pub fn planar_angle(local_direction: Vec3) -> f32 {
    local_direction.z.atan2(local_direction.y).to_degrees()
}

/// Angle a handle pivoting at `pivot` must take to point at `attach_point`.
///
/// The direction is expressed in the lever's own frame (rotation only) before
/// the planar angle is taken, so a rotated lever mount still reads its input
/// relative to its own hinge axis.
pub fn drag_angle(frame_rotation: Quat, pivot: Vec3, attach_point: Vec3) -> f32 {
    let mut local = frame_rotation.inverse() * (attach_point - pivot);
    local.x = 0.0;
    planar_angle(local)
}

pub fn step_size(min_angle: f32, max_angle: f32, increments: u32) -> Option<f32> {
    if increments <= 1 {
        return None;
    }
    Some((max_angle - min_angle) / (increments - 1) as f32)
}

/// Rounds `angle` to the nearest of `increments` evenly spaced stops.
pub fn snap_to_increment(angle: f32, min_angle: f32, max_angle: f32, increments: u32) -> f32 {
    let Some(step) = step_size(min_angle, max_angle, increments) else {
        return angle;
    };
    if step.abs() <= SPAN_EPSILON {
        return min_angle;
    }
    ((angle - min_angle) / step).round_ties_even() * step + min_angle
}

pub fn handle_rotation(angle: f32) -> Quat {
    Quat::from_rotation_x(angle.to_radians())
}
