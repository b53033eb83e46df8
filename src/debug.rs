//! Probe visualization.
//!
//! Draws every [`ProbeTraced`] event with gizmos. Walkers only emit those
//! events when [`crate::config::SurfaceWalkerConfig::debug_probes`] is set.
//! Requires Bevy's gizmo plugin (part of `DefaultPlugins`).

use bevy::prelude::*;

use crate::events::ProbeTraced;
use crate::probe::ProbeKind;

/// Radius of the sphere drawn at each impact point.
const IMPACT_RADIUS: f32 = 1.0;

/// Length of the drawn impact normal.
const NORMAL_LENGTH: f32 = 10.0;

/// Plugin drawing probe rays, impacts and impact normals.
pub struct SurfaceWalkerDebugPlugin;

impl Plugin for SurfaceWalkerDebugPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ProbeTraced>();
        app.add_systems(Update, draw_probes);
    }
}

/// Colour used for each probe kind.
pub fn probe_color(kind: ProbeKind) -> Color {
    match kind {
        ProbeKind::Forward => Color::srgb(1.0, 0.0, 0.0),
        ProbeKind::Backward => Color::srgb(0.0, 1.0, 0.0),
        ProbeKind::Center => Color::srgb(0.0, 0.0, 1.0),
        ProbeKind::Bottom => Color::srgb(1.0, 1.0, 0.0),
        ProbeKind::BottomAssistor => Color::srgb(0.0, 1.0, 1.0),
        ProbeKind::Initial => Color::WHITE,
    }
}

fn draw_probes(mut gizmos: Gizmos, mut traces: EventReader<ProbeTraced>) {
    for trace in traces.read() {
        let color = probe_color(trace.kind);

        let Some((point, normal)) = trace.impact else {
            gizmos.line(trace.origin, trace.end, color);
            continue;
        };

        gizmos.line(trace.origin, point, color);
        gizmos.sphere(Isometry3d::from_translation(point), IMPACT_RADIUS, color);
        gizmos.arrow(point, point + normal * NORMAL_LENGTH, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_colors_are_distinct() {
        let kinds = [
            ProbeKind::Forward,
            ProbeKind::Backward,
            ProbeKind::Center,
            ProbeKind::Bottom,
            ProbeKind::BottomAssistor,
            ProbeKind::Initial,
        ];
        for (i, a) in kinds.iter().enumerate() {
            for b in &kinds[i + 1..] {
                assert_ne!(probe_color(*a), probe_color(*b));
            }
        }
    }
}
