//! Pose math for aligning a character to a surface.
//!
//! Pure functions over [`Transform`]s and vectors. The locomotion loop applies
//! their results through the physics backend.
//!
//! Axes follow Bevy: local `-Z` is forward, `+X` is right, `+Y` is up.

use bevy::prelude::*;

/// Per-component tolerance for vector equality checks.
pub const VECTOR_TOLERANCE: f32 = 1e-4;

/// Tolerance on the origin-to-surface distance when checking alignment.
pub const ALIGN_DISTANCE_TOLERANCE: f32 = 0.1;

/// Component-wise vector equality within [`VECTOR_TOLERANCE`].
#[inline]
pub fn nearly_equal(a: Vec3, b: Vec3) -> bool {
    a.abs_diff_eq(b, VECTOR_TOLERANCE)
}

/// Where the character origin sits when standing on `point` with surface `normal`.
#[inline]
pub fn stick_location(point: Vec3, normal: Vec3, feet_offset: f32) -> Vec3 {
    point + normal * feet_offset
}

/// Whether a character at `position` with up axis `up` already stands on `query_point`.
///
/// Requires the up axis to equal `normal` and the distance from the query
/// point to the origin to be within 0.1 of `feet_offset`.
pub fn is_aligned(up: Vec3, position: Vec3, query_point: Vec3, normal: Vec3, feet_offset: f32) -> bool {
    if !nearly_equal(up, normal) {
        return false;
    }

    let distance = query_point.distance(position);
    (distance - feet_offset).abs() <= ALIGN_DISTANCE_TOLERANCE
}

/// Build a rotation from orthonormal forward, right and up axes.
pub fn rotation_from_axes(forward: Vec3, right: Vec3, up: Vec3) -> Quat {
    Quat::from_mat3(&Mat3::from_cols(right, up, -forward)).normalize()
}

/// Build a rotation facing `forward` with the given `up`, re-orthogonalizing `forward`.
///
/// Returns `None` when the two are parallel or degenerate.
pub fn rotation_from_forward_up(forward: Vec3, up: Vec3) -> Option<Quat> {
    let up = up.try_normalize()?;
    let right = forward.cross(up).try_normalize()?;
    let forward = up.cross(right);
    Some(rotation_from_axes(forward, right, up))
}

/// Rotation aligning the up axis to `normal` while keeping the current right axis as closely as possible.
///
/// forward = normal × right, then right = forward × normal. When the current
/// right axis is parallel to the normal, the current forward is projected onto
/// the surface instead.
pub fn surface_rotation(current: Quat, normal: Vec3) -> Quat {
    let Some(up) = normal.try_normalize() else {
        return current;
    };

    let right = current * Vec3::X;
    let forward = up
        .cross(right)
        .try_normalize()
        .or_else(|| {
            let current_forward = current * Vec3::NEG_Z;
            current_forward.reject_from_normalized(up).try_normalize()
        })
        .unwrap_or_else(|| up.any_orthonormal_vector());

    let right = forward.cross(up);
    rotation_from_axes(forward, right, up)
}

/// Instantaneous transition: a transform at `position` whose up axis is `normal`.
///
/// Scale is kept from `current`. No collision sweep is implied.
pub fn snap_transform(current: &Transform, position: Vec3, normal: Vec3) -> Transform {
    Transform {
        translation: position,
        rotation: surface_rotation(current.rotation, normal),
        scale: current.scale,
    }
}

/// Frame-rate independent interpolation of `current` toward `target`.
///
/// Moves `clamp(delta * speed, 0, 1)` of the remaining distance; a speed of
/// zero or less jumps straight to the target.
pub fn interp_to(current: Vec3, target: Vec3, delta: f32, speed: f32) -> Vec3 {
    if speed <= 0.0 {
        return target;
    }

    let remaining = target - current;
    if remaining.length_squared() < VECTOR_TOLERANCE {
        return target;
    }

    current + remaining * (delta * speed).clamp(0.0, 1.0)
}

/// Up axis partway between `up` and `target`, normalized.
///
/// Falls back to `target` when the interpolation passes through zero
/// (opposite vectors).
pub fn interpolated_normal(up: Vec3, target: Vec3, delta: f32, speed: f32) -> Vec3 {
    interp_to(up, target, delta, speed)
        .try_normalize()
        .unwrap_or(target)
}

/// Turn rate vector: `degrees_per_second` around `up`.
#[inline]
pub fn rotation_rate(up: Vec3, degrees_per_second: f32) -> Vec3 {
    up * degrees_per_second
}

/// Rotation that turns the character toward its movement direction.
///
/// The velocity is taken into the local frame, its vertical component is
/// dropped and the local forward axis is interpolated toward the result.
/// The up axis is kept. Returns `None` when velocity is zero or purely vertical.
pub fn rotate_toward_movement(rotation: Quat, velocity: Vec3, delta: f32, rate: f32) -> Option<Quat> {
    if velocity == Vec3::ZERO {
        return None;
    }

    let direction = velocity.try_normalize()?;
    let local = rotation.inverse() * direction;
    let desired = Vec3::new(local.x, 0.0, local.z);
    if desired.length_squared() < VECTOR_TOLERANCE {
        return None;
    }

    let alpha = (delta * rate).clamp(0.0, 1.0);
    let local_forward = Vec3::NEG_Z.lerp(desired, alpha).try_normalize()?;

    let world_forward = rotation * local_forward;
    let up = rotation * Vec3::Y;
    rotation_from_forward_up(world_forward, up)
}
