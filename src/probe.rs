//! Geometry probes.
//!
//! Each probe is a ray whose origin and direction derive from the walker's
//! current pose and configuration. Probes are cast synchronously through the
//! physics backend; a miss is reported as data, never as an error.

use bevy::prelude::*;

use crate::backend::{RaycastRequest, SurfaceWalkerBackend};
use crate::config::{ReferenceDistances, SurfaceWalkerConfig};
use crate::detection::{ClassifiedCast, SensorCast};
use crate::events::ProbeTraced;

/// Length of the downward cast used to find a surface at initialization.
pub const INITIAL_STICK_DISTANCE: f32 = 100_000_000.0;

/// The canonical probes of a surface walker.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeKind {
    /// From the eye, down tilted toward facing.
    Forward,
    /// From the eye, down tilted away from facing.
    Backward,
    /// Straight down from a point offset along forward.
    Bottom,
    /// Like `Bottom`, offset further; used to confirm planes.
    BottomAssistor,
    /// Short straight-down probe from the origin, used for sticking.
    Center,
    /// Very long straight-down probe cast once at initialization.
    Initial,
}

/// Pose axes of a walker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeFrame {
    pub position: Vec3,
    pub forward: Vec3,
    pub right: Vec3,
    pub up: Vec3,
}

impl ProbeFrame {
    pub fn from_transform(transform: &Transform) -> Self {
        Self {
            position: transform.translation,
            forward: *transform.forward(),
            right: *transform.right(),
            up: *transform.up(),
        }
    }

    #[inline]
    pub fn down(&self) -> Vec3 {
        -self.up
    }

    /// Eye position: `position + up * eye_offset`.
    #[inline]
    pub fn eye_position(&self, config: &SurfaceWalkerConfig) -> Vec3 {
        self.position + self.up * config.eye_offset
    }

    #[inline]
    pub fn bottom_location(&self, config: &SurfaceWalkerConfig) -> Vec3 {
        self.position + self.forward * config.bottom_offset
    }

    #[inline]
    pub fn bottom_assistor_location(&self, config: &SurfaceWalkerConfig) -> Vec3 {
        self.position + self.forward * (config.bottom_offset + config.bottom_assistor_offset)
    }

    /// Down vector rotated toward facing by the forward/backward angle.
    pub fn forward_direction(&self, config: &SurfaceWalkerConfig) -> Vec3 {
        let (sin, cos) = config.forward_backward_radians().sin_cos();
        self.down() * cos + self.forward * sin
    }

    /// Down vector rotated away from facing by the forward/backward angle.
    pub fn backward_direction(&self, config: &SurfaceWalkerConfig) -> Vec3 {
        let (sin, cos) = config.forward_backward_radians().sin_cos();
        self.down() * cos - self.forward * sin
    }

    /// Down vector rotated toward the left by the left/right angle.
    pub fn left_direction(&self, config: &SurfaceWalkerConfig) -> Vec3 {
        let (sin, cos) = config.left_right_radians().sin_cos();
        self.down() * cos - self.right * sin
    }

    /// Down vector rotated toward the right by the left/right angle.
    pub fn right_direction(&self, config: &SurfaceWalkerConfig) -> Vec3 {
        let (sin, cos) = config.left_right_radians().sin_cos();
        self.down() * cos + self.right * sin
    }

    /// Ray for one of the canonical probes.
    pub fn ray(&self, kind: ProbeKind, config: &SurfaceWalkerConfig) -> RaycastRequest {
        let (origin, direction, length) = match kind {
            ProbeKind::Forward => (
                self.eye_position(config),
                self.forward_direction(config),
                config.surface_distance,
            ),
            ProbeKind::Backward => (
                self.eye_position(config),
                self.backward_direction(config),
                config.surface_distance,
            ),
            ProbeKind::Bottom => (
                self.bottom_location(config),
                self.down(),
                config.surface_distance,
            ),
            ProbeKind::BottomAssistor => (
                self.bottom_assistor_location(config),
                self.down(),
                config.surface_distance,
            ),
            ProbeKind::Center => (self.position, self.down(), config.stick_distance),
            ProbeKind::Initial => (self.position, self.down(), INITIAL_STICK_DISTANCE),
        };

        RaycastRequest::new(origin, direction, length).with_filter(config.filter.clone())
    }
}

/// Intersection of the segment `start..end` with a plane, if the segment reaches it.
pub fn segment_plane_intersection(start: Vec3, end: Vec3, plane_point: Vec3, plane_normal: Vec3) -> Option<Vec3> {
    let segment = end - start;
    let denominator = segment.dot(plane_normal);
    if denominator.abs() <= f32::EPSILON {
        return None;
    }

    let t = (plane_point - start).dot(plane_normal) / denominator;
    (0.0..=1.0).contains(&t).then(|| start + segment * t)
}

/// Compute the session-constant reference distances for a walker.
///
/// The surface reference is where the forward probe meets the plane through
/// the feet, perpendicular to the up axis. It is zero when the probe is too
/// short to reach that plane.
pub fn reference_distances(frame: &ProbeFrame, config: &SurfaceWalkerConfig, feet_offset: f32) -> ReferenceDistances {
    let eye = frame.eye_position(config);
    let end = eye + frame.forward_direction(config) * config.surface_distance;
    let feet = frame.position - frame.up * feet_offset;

    let surface_sq = segment_plane_intersection(eye, end, feet, frame.up)
        .map(|point| (point - eye).length_squared())
        .unwrap_or(0.0);

    ReferenceDistances {
        surface_sq,
        transition_sq: (feet - frame.position).length_squared(),
    }
}

/// Cast one probe for `entity`.
///
/// Degenerate rays and non-finite hits are reported as misses. When
/// `debug` is set, a [`ProbeTraced`] event records the ray.
pub fn cast_probe<B: SurfaceWalkerBackend>(
    world: &mut World,
    entity: Entity,
    kind: ProbeKind,
    request: RaycastRequest,
    debug: bool,
) -> SensorCast {
    let request = request.excluding(entity);
    let origin = request.origin;
    let end = request.end();

    let cast = if request.is_degenerate() {
        warn!("Degenerate {:?} probe for {:?}, treating as miss", kind, entity);
        SensorCast::miss(origin, end)
    } else {
        let data = B::raycast(world, &request)
            .filter(|hit| hit.point.is_finite() && hit.normal.is_finite() && hit.distance.is_finite());
        SensorCast::from_collision(origin, end, data)
    };

    if debug {
        world.send_event(ProbeTraced {
            entity,
            kind,
            origin,
            end,
            impact: cast.hit.then_some((cast.point, cast.normal)),
        });
    }

    cast
}

/// Cast a classification probe and compare it against the surface reference.
pub fn classify_probe<B: SurfaceWalkerBackend>(
    world: &mut World,
    entity: Entity,
    kind: ProbeKind,
    frame: &ProbeFrame,
    config: &SurfaceWalkerConfig,
    reference: &ReferenceDistances,
) -> ClassifiedCast {
    let cast = cast_probe::<B>(world, entity, kind, frame.ray(kind, config), config.debug_probes);
    ClassifiedCast::classify(cast, reference.surface_sq, config.distance_tolerance_sq)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    fn upright_frame() -> ProbeFrame {
        ProbeFrame::from_transform(&Transform::from_xyz(0.0, 10.0, 0.0))
    }

    #[test]
    fn frame_axes_follow_transform() {
        let frame = upright_frame();
        assert!(approx(frame.forward, Vec3::NEG_Z));
        assert!(approx(frame.right, Vec3::X));
        assert!(approx(frame.up, Vec3::Y));
        assert!(approx(frame.down(), Vec3::NEG_Y));
    }

    #[test]
    fn anchor_points() {
        let frame = upright_frame();
        let config = SurfaceWalkerConfig::default();
        assert!(approx(frame.eye_position(&config), Vec3::new(0.0, 25.0, 0.0)));
        // Negative bottom offset lies behind the character
        assert!(approx(frame.bottom_location(&config), Vec3::new(0.0, 10.0, 5.0)));
        assert!(approx(frame.bottom_assistor_location(&config), Vec3::new(0.0, 10.0, 8.0)));
    }

    #[test]
    fn forward_and_backward_directions_mirror() {
        let frame = upright_frame();
        let config = SurfaceWalkerConfig::default();
        let h = std::f32::consts::FRAC_1_SQRT_2;

        assert!(approx(frame.forward_direction(&config), Vec3::new(0.0, -h, -h)));
        assert!(approx(frame.backward_direction(&config), Vec3::new(0.0, -h, h)));
        assert!(approx(frame.left_direction(&config), Vec3::new(-h, -h, 0.0)));
        assert!(approx(frame.right_direction(&config), Vec3::new(h, -h, 0.0)));
    }

    #[test]
    fn probe_rays() {
        let frame = upright_frame();
        let config = SurfaceWalkerConfig::default();

        let forward = frame.ray(ProbeKind::Forward, &config);
        assert!(approx(forward.origin, Vec3::new(0.0, 25.0, 0.0)));
        assert_eq!(forward.max_distance, config.surface_distance);

        let center = frame.ray(ProbeKind::Center, &config);
        assert!(approx(center.origin, frame.position));
        assert!(approx(center.direction, Vec3::NEG_Y));
        assert_eq!(center.max_distance, config.stick_distance);

        let initial = frame.ray(ProbeKind::Initial, &config);
        assert_eq!(initial.max_distance, INITIAL_STICK_DISTANCE);
    }

    #[test]
    fn segment_plane_hits_within_segment() {
        let hit = segment_plane_intersection(Vec3::new(0.0, 10.0, 0.0), Vec3::new(0.0, -10.0, 0.0), Vec3::ZERO, Vec3::Y);
        assert_eq!(hit, Some(Vec3::ZERO));
    }

    #[test]
    fn segment_plane_misses_when_short_or_parallel() {
        let short = segment_plane_intersection(Vec3::new(0.0, 10.0, 0.0), Vec3::new(0.0, 5.0, 0.0), Vec3::ZERO, Vec3::Y);
        assert_eq!(short, None);

        let parallel = segment_plane_intersection(Vec3::new(0.0, 1.0, 0.0), Vec3::new(5.0, 1.0, 0.0), Vec3::ZERO, Vec3::Y);
        assert_eq!(parallel, None);
    }

    #[test]
    fn reference_distances_upright() {
        let frame = upright_frame();
        let config = SurfaceWalkerConfig::default();
        let reference = reference_distances(&frame, &config, 10.0);

        // Eye is 25 above the feet plane; the 45 degree probe travels 25 * sqrt(2)
        assert!((reference.surface_sq - 1250.0).abs() < 0.1);
        assert!((reference.transition_sq - 100.0).abs() < 1e-3);
    }

    #[test]
    fn reference_zero_when_probe_too_short() {
        let frame = upright_frame();
        let config = SurfaceWalkerConfig::default().with_distances(50.0, 20.0);
        let reference = reference_distances(&frame, &config, 10.0);
        assert_eq!(reference.surface_sq, 0.0);
    }

    #[test]
    fn reference_independent_of_pose() {
        let config = SurfaceWalkerConfig::default();
        let upright = reference_distances(&upright_frame(), &config, 10.0);
        let on_wall = ProbeFrame::from_transform(
            &Transform::from_xyz(5.0, 3.0, -2.0).with_rotation(Quat::from_rotation_x(1.2)),
        );
        let tilted = reference_distances(&on_wall, &config, 10.0);
        assert!((upright.surface_sq - tilted.surface_sq).abs() < 0.1);
    }
}
