use std::time::Duration;

use bevy::{
    ecs::{lifecycle::HookContext, world::DeferredWorld},
    prelude::*,
};

use super::{lever_math, Lever, LeverBehavior, TweenRequest};

pub const RETURN_DURATION: Duration = Duration::from_millis(300);
pub const SNAP_DURATION: Duration = Duration::from_millis(200);
pub const MIN_INCREMENTS: u32 = 2;

/// Follows the agent directly.
#[derive(Component, Debug, Default, Clone, Copy)]
#[require(Lever)]
pub struct DirectLever;

impl LeverBehavior for DirectLever {}

/// Springs back to the angle it started at, the short way round.
#[derive(Component, Debug, Clone, Copy)]
#[require(Lever)]
#[component(on_insert = ReturningLever::on_insert)]
pub struct ReturningLever {
    pub original_angle: f32,
    pub duration: Duration,
}

impl Default for ReturningLever {
    fn default() -> Self {
        Self {
            original_angle: 0.0,
            duration: RETURN_DURATION,
        }
    }
}

impl ReturningLever {
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Records the lever's current resting angle as the return target.
    pub fn recapture(&mut self, lever: &Lever) {
        self.original_angle = lever.value_to_angle();
    }

    fn on_insert(mut world: DeferredWorld, HookContext { entity, .. }: HookContext) {
        let Some(lever) = world.get::<Lever>(entity).cloned() else {
            warn!("Returning lever {entity:?} has no Lever to read its resting angle from.");
            return;
        };
        if let Some(mut returning) = world.get_mut::<ReturningLever>(entity) {
            returning.recapture(&lever);
        }
    }
}

impl LeverBehavior for ReturningLever {
    fn release_tween(&self, lever: &Lever) -> Option<TweenRequest> {
        let offset = lever_math::delta_angle(lever.angle, self.original_angle);
        Some(TweenRequest {
            to: lever.angle + offset,
            land: self.original_angle,
            land_value: Some(0.0),
            duration: self.duration,
        })
    }
}

fn floor_increments(increments: u32) -> u32 {
    increments.max(MIN_INCREMENTS)
}

/// Moves smoothly while held and settles on the nearest increment when let go.
#[derive(Component, Debug, Clone, Copy)]
#[require(Lever)]
pub struct SteppedLever {
    increments: u32,
    pub duration: Duration,
}

impl Default for SteppedLever {
    fn default() -> Self {
        Self::new(MIN_INCREMENTS)
    }
}

impl SteppedLever {
    pub fn new(increments: u32) -> Self {
        Self {
            increments: floor_increments(increments),
            duration: SNAP_DURATION,
        }
    }

    pub fn increments(&self) -> u32 {
        self.increments
    }

    pub fn set_increments(&mut self, increments: u32) {
        self.increments = floor_increments(increments);
    }

    pub fn snap(&self, lever: &Lever, angle: f32) -> f32 {
        lever_math::snap_to_increment(angle, lever.min_angle, lever.max_angle, self.increments)
    }
}

impl LeverBehavior for SteppedLever {
    fn release_tween(&self, lever: &Lever) -> Option<TweenRequest> {
        let target = self.snap(lever, lever.angle);
        Some(TweenRequest {
            to: target,
            land: target,
            land_value: None,
            duration: self.duration,
        })
    }
}

/// Only ever rests on an increment, even mid-drag.
#[derive(Component, Debug, Clone, Copy)]
#[require(Lever)]
pub struct SteppedSnapLever {
    increments: u32,
}

impl Default for SteppedSnapLever {
    fn default() -> Self {
        Self::new(MIN_INCREMENTS)
    }
}

impl SteppedSnapLever {
    pub fn new(increments: u32) -> Self {
        Self {
            increments: floor_increments(increments),
        }
    }

    pub fn increments(&self) -> u32 {
        self.increments
    }

    pub fn set_increments(&mut self, increments: u32) {
        self.increments = floor_increments(increments);
    }
}

impl LeverBehavior for SteppedSnapLever {
    fn drag_angle(&self, lever: &Lever, clamped_angle: f32) -> f32 {
        lever_math::snap_to_increment(
            clamped_angle,
            lever.min_angle,
            lever.max_angle,
            self.increments,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increments_are_floored_to_two() {
        assert_eq!(SteppedLever::new(0).increments(), 2);
        assert_eq!(SteppedSnapLever::new(1).increments(), 2);

        let mut stepped = SteppedLever::new(5);
        stepped.set_increments(1);
        assert_eq!(stepped.increments(), 2);
    }

    #[test]
    fn stepped_release_targets_nearest_stop() {
        let mut lever = Lever::new(-70.0, 70.0);
        lever.follow_angle(40.0);
        let request = SteppedLever::new(3).release_tween(&lever).expect("tween");
        assert_eq!(request.land, 70.0);
        assert_eq!(request.duration, SNAP_DURATION);

        lever.follow_angle(20.0);
        let request = SteppedLever::new(3).release_tween(&lever).expect("tween");
        assert_eq!(request.land, 0.0);
    }

    #[test]
    fn returning_release_takes_shortest_path() {
        let mut lever = Lever::new(-180.0, 180.0);
        lever.follow_angle(170.0);
        let returning = ReturningLever {
            original_angle: -170.0,
            ..default()
        };

        let request = returning.release_tween(&lever).expect("tween");
        assert!((request.to - 190.0).abs() < 1e-4);
        assert_eq!(request.land, -170.0);
        assert_eq!(request.land_value, Some(0.0));
        assert_eq!(request.duration, RETURN_DURATION);
    }

    #[test]
    fn direct_and_snap_levers_do_not_animate_on_release() {
        let lever = Lever::default();
        assert!(DirectLever.release_tween(&lever).is_none());
        assert!(SteppedSnapLever::new(4).release_tween(&lever).is_none());
    }

    #[test]
    fn returning_lever_records_resting_angle_on_insert() {
        let mut world = World::new();
        let entity = world
            .spawn((Lever::new(-70.0, 70.0).with_value(0.0), ReturningLever::default()))
            .id();
        let returning = world.get::<ReturningLever>(entity).expect("returning");
        assert_eq!(returning.original_angle, -70.0);
    }
}
