use std::time::Duration;

use bevy::prelude::*;

use super::{lever_math::lerp_clamped, Lever, LeverValueChanged};

/// What a lever settles to once a release animation lands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TweenRequest {
    /// End of the interpolated path. May lie outside (-180, 180] when the
    /// shortest way round crosses the wrap.
    pub to: f32,
    /// Exact resting angle applied on landing.
    pub land: f32,
    /// Value stored on landing; `None` derives it from `land`.
    pub land_value: Option<f32>,
    pub duration: Duration,
}

/// Timed angle animation driven by the frame clock.
#[derive(Component, Debug, Clone, Default)]
pub enum AngleTween {
    #[default]
    Idle,
    Animating {
        from: f32,
        request: TweenRequest,
        timer: Timer,
    },
}

impl AngleTween {
    pub fn is_animating(&self) -> bool {
        matches!(self, Self::Animating { .. })
    }

    /// Starts (or restarts) an animation from `from`.
    pub fn start(&mut self, from: f32, request: TweenRequest) {
        *self = Self::Animating {
            from,
            request,
            timer: Timer::new(request.duration, TimerMode::Once),
        };
    }

    /// Advances by `delta`. Returns the angle to show this frame and whether
    /// the animation just landed.
    pub fn advance(&mut self, delta: Duration) -> Option<(f32, bool)> {
        let Self::Animating {
            from,
            request,
            timer,
        } = self
        else {
            return None;
        };

        timer.tick(delta);
        if timer.is_finished() {
            let land = request.land;
            *self = Self::Idle;
            return Some((land, true));
        }
        Some((lerp_clamped(*from, request.to, timer.fraction()), false))
    }

    pub fn landing(&self) -> Option<TweenRequest> {
        match self {
            Self::Animating { request, .. } => Some(*request),
            Self::Idle => None,
        }
    }

    pub fn enact(
        time: Res<Time>,
        mut changed: MessageWriter<LeverValueChanged>,
        mut query: Query<(Entity, &mut AngleTween, &mut Lever)>,
    ) {
        for (entity, mut tween, mut lever) in query.iter_mut() {
            if !tween.is_animating() {
                continue;
            }
            let landing = tween.landing();
            let Some((angle, landed)) = tween.advance(time.delta()) else {
                continue;
            };
            lever.set_angle(angle);

            if landed {
                let value = landing
                    .and_then(|request| request.land_value)
                    .unwrap_or_else(|| lever.angle_to_value(angle));
                let value = lever.set_value(value);
                changed.write(LeverValueChanged {
                    lever: entity,
                    value,
                });
                debug!("Lever {entity:?} settled at {angle:.1} degrees.");
            }
        }
    }
}
