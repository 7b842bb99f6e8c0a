//! Rotating levers.
//!
//! [`Lever`] holds the state every lever shares: a value in [0, 1], the angle
//! range it maps onto, and the agent currently holding it. How a drag turns
//! into an angle, and what happens on release, is decided by one behaviour
//! component per lever ([`DirectLever`], [`ReturningLever`], [`SteppedLever`],
//! [`SteppedSnapLever`]).
use bevy::{
    ecs::{lifecycle::HookContext, world::DeferredWorld},
    prelude::*,
};

use crate::{
    data::config::LeverSettings,
    systems::interaction::{
        attach_point, AttachOffset, ForceRelease, GrabRange, Interactable, Interactor,
        InteractionPlugin, InteractionSystem, SelectEntered, SelectExited,
    },
};

pub mod lever_math;
pub mod tween;
pub mod variants;

pub use tween::{AngleTween, TweenRequest};
pub use variants::{DirectLever, ReturningLever, SteppedLever, SteppedSnapLever};

macro_rules! register_lever_systems {
    ($app:expr, $behavior:ty) => {
        $app.add_systems(
            Update,
            (
                drag_levers::<$behavior>.in_set(InteractionSystem::Process),
                animate_release::<$behavior>
                    .in_set(InteractionSystem::Exit)
                    .after(Lever::end_grabs),
            )
                .run_if(any_with_component::<$behavior>),
        );
    };
}

pub struct LeverPlugin;

impl Plugin for LeverPlugin {
    fn build(&self, app: &mut App) {
        if !app.is_plugin_added::<InteractionPlugin>() {
            app.add_plugins(InteractionPlugin);
        }

        app.add_message::<LeverValueChanged>()
            .add_message::<SetLeverValue>()
            .add_systems(
                Update,
                (
                    Lever::start_grabs.in_set(InteractionSystem::Enter),
                    Lever::apply_value_requests.in_set(InteractionSystem::Process),
                    Lever::end_grabs.in_set(InteractionSystem::Exit),
                    (AngleTween::enact, Lever::sync_handles)
                        .chain()
                        .in_set(InteractionSystem::Animate),
                )
                    .run_if(any_with_component::<Lever>),
            );

        register_lever_systems!(app, DirectLever);
        register_lever_systems!(app, ReturningLever);
        register_lever_systems!(app, SteppedLever);
        register_lever_systems!(app, SteppedSnapLever);
    }
}

#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct LeverValueChanged {
    pub lever: Entity,
    pub value: f32,
}

/// Sets a lever's value from outside and moves its handle to match.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct SetLeverValue {
    pub lever: Entity,
    pub value: f32,
}

#[derive(Component, Debug, Clone, PartialEq)]
#[require(Interactable, GrabRange, AngleTween)]
#[component(on_insert = Lever::on_insert)]
pub struct Lever {
    /// Visual part rotated about its local X axis. Missing handles are skipped.
    pub handle: Option<Entity>,
    value: f32,
    clamped_motion: bool,
    min_angle: f32,
    max_angle: f32,
    /// Angle currently shown, in degrees.
    pub angle: f32,
    pub grabbing_agent: Option<Entity>,
}

impl Default for Lever {
    fn default() -> Self {
        Self::from_settings(&LeverSettings::default())
    }
}

impl Lever {
    pub fn new(min_angle: f32, max_angle: f32) -> Self {
        let mut lever = Self {
            handle: None,
            value: 0.5,
            clamped_motion: true,
            min_angle,
            max_angle,
            angle: 0.0,
            grabbing_agent: None,
        };
        lever.normalize();
        lever
    }

    pub fn from_settings(settings: &LeverSettings) -> Self {
        let settings = settings.clone().validated();
        Self::new(settings.min_angle, settings.max_angle)
            .with_clamped_motion(settings.clamped_motion)
            .with_value(settings.value)
    }

    pub fn with_value(mut self, value: f32) -> Self {
        self.set_value(value);
        self.angle = self.value_to_angle();
        self
    }

    pub fn with_clamped_motion(mut self, clamped_motion: bool) -> Self {
        self.set_clamped_motion(clamped_motion);
        self
    }

    pub fn with_handle(mut self, handle: Entity) -> Self {
        self.handle = Some(handle);
        self
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn min_angle(&self) -> f32 {
        self.min_angle
    }

    pub fn max_angle(&self) -> f32 {
        self.max_angle
    }

    pub fn clamped_motion(&self) -> bool {
        self.clamped_motion
    }

    /// Replaces the angle range and moves the handle to the current value.
    pub fn set_range(&mut self, min_angle: f32, max_angle: f32) {
        self.min_angle = min_angle;
        self.max_angle = max_angle;
        self.normalize();
    }

    /// Switches clamping, re-clamping the value and moving the handle to it.
    pub fn set_clamped_motion(&mut self, clamped_motion: bool) {
        self.clamped_motion = clamped_motion;
        self.normalize();
    }

    /// Stores `value`, clamped to [0, 1] when motion is clamped. The shown
    /// angle is left alone.
    pub(crate) fn set_value(&mut self, value: f32) -> f32 {
        self.value = if self.clamped_motion {
            value.clamp(0.0, 1.0)
        } else {
            value
        };
        self.value
    }

    /// Sets the value and moves the handle to match.
    pub fn set_value_and_sync(&mut self, value: f32) -> f32 {
        let value = self.set_value(value);
        self.angle = self.value_to_angle();
        value
    }

    pub fn value_to_angle(&self) -> f32 {
        lever_math::value_to_angle(self.min_angle, self.max_angle, self.value)
    }

    pub fn angle_to_value(&self, angle: f32) -> f32 {
        lever_math::angle_to_value(self.min_angle, self.max_angle, angle)
    }

    pub fn clamp_angle(&self, angle: f32) -> f32 {
        angle.clamp(self.min_angle, self.max_angle)
    }

    pub fn set_angle(&mut self, angle: f32) {
        self.angle = angle;
    }

    /// Shows `angle` and back-derives the value from it.
    pub fn follow_angle(&mut self, angle: f32) -> f32 {
        self.set_angle(angle);
        self.set_value(self.angle_to_value(angle))
    }

    pub fn is_grabbed(&self) -> bool {
        self.grabbing_agent.is_some()
    }

    pub fn start_grab(&mut self, agent: Entity) {
        self.grabbing_agent = Some(agent);
    }

    pub fn end_grab(&mut self, agent: Entity) -> bool {
        if self.grabbing_agent != Some(agent) {
            return false;
        }
        self.grabbing_agent = None;
        true
    }

    /// Orders the angle range and resyncs the shown angle to the value.
    pub fn normalize(&mut self) {
        if self.min_angle > self.max_angle {
            std::mem::swap(&mut self.min_angle, &mut self.max_angle);
        }
        self.set_value(self.value);
        self.angle = self.value_to_angle();
    }

    fn on_insert(mut world: DeferredWorld, HookContext { entity, .. }: HookContext) {
        if let Some(mut lever) = world.get_mut::<Lever>(entity) {
            lever.normalize();
        }
    }

    pub fn start_grabs(
        mut entered: MessageReader<SelectEntered>,
        mut levers: Query<&mut Lever>,
    ) {
        for grab in entered.read() {
            if let Ok(mut lever) = levers.get_mut(grab.target) {
                lever.start_grab(grab.agent);
                debug!("Lever {:?} grabbed by {:?}.", grab.target, grab.agent);
            }
        }
    }

    pub fn end_grabs(mut exited: MessageReader<SelectExited>, mut levers: Query<&mut Lever>) {
        for exit in exited.read() {
            if let Ok(mut lever) = levers.get_mut(exit.target) {
                if lever.end_grab(exit.agent) {
                    debug!(
                        "Lever {:?} released by {:?} ({:?}).",
                        exit.target, exit.agent, exit.reason
                    );
                }
            }
        }
    }

    pub fn apply_value_requests(
        mut requests: MessageReader<SetLeverValue>,
        mut changed: MessageWriter<LeverValueChanged>,
        mut levers: Query<&mut Lever>,
    ) {
        for request in requests.read() {
            let Ok(mut lever) = levers.get_mut(request.lever) else {
                warn!("Value requested for {:?}, which is not a lever.", request.lever);
                continue;
            };
            let value = lever.set_value_and_sync(request.value);
            changed.write(LeverValueChanged {
                lever: request.lever,
                value,
            });
        }
    }

    pub fn sync_handles(
        levers: Query<&Lever, Changed<Lever>>,
        mut transforms: Query<&mut Transform, Without<Lever>>,
    ) {
        for lever in levers.iter() {
            let Some(handle) = lever.handle else {
                continue;
            };
            if let Ok(mut transform) = transforms.get_mut(handle) {
                transform.rotation = lever_math::handle_rotation(lever.angle);
            }
        }
    }
}

/// Per-variant lever response.
pub trait LeverBehavior: Component {
    /// Angle to show for a drag already clamped to the lever's range.
    fn drag_angle(&self, lever: &Lever, clamped_angle: f32) -> f32 {
        let _ = lever;
        clamped_angle
    }

    /// Animation to run once the lever is let go.
    fn release_tween(&self, lever: &Lever) -> Option<TweenRequest> {
        let _ = lever;
        None
    }
}

/// Per-frame update of held levers: enforce reach, then follow the agent.
pub fn drag_levers<B: LeverBehavior>(
    mut force_release: MessageWriter<ForceRelease>,
    mut changed: MessageWriter<LeverValueChanged>,
    mut levers: Query<(
        Entity,
        &mut Lever,
        &B,
        &AngleTween,
        &GrabRange,
        &GlobalTransform,
    )>,
    agents: Query<(&GlobalTransform, Option<&AttachOffset>), With<Interactor>>,
    transforms: Query<&GlobalTransform>,
) {
    for (entity, mut lever, behavior, tween, range, lever_transform) in levers.iter_mut() {
        let Some(agent) = lever.grabbing_agent else {
            continue;
        };

        let Ok((agent_transform, offset)) = agents.get(agent) else {
            warn!("Lever {entity:?} lost its grabbing agent {agent:?}.");
            force_release.write(ForceRelease {
                agent,
                target: entity,
            });
            continue;
        };
        let attach = attach_point(agent_transform, offset);

        let grip_point = range.grip_point(lever_transform, &transforms);
        if !range.within_reach(grip_point, attach) {
            debug!("Lever {entity:?} pulled out of reach of {agent:?}.");
            force_release.write(ForceRelease {
                agent,
                target: entity,
            });
            continue;
        }

        // Release animations own the handle until they land.
        if tween.is_animating() {
            continue;
        }

        let pivot = lever
            .handle
            .and_then(|handle| transforms.get(handle).ok())
            .map_or_else(|| lever_transform.translation(), GlobalTransform::translation);
        let raw = lever_math::drag_angle(lever_transform.rotation(), pivot, attach);
        let angle = behavior.drag_angle(&lever, lever.clamp_angle(raw));
        let value = lever.follow_angle(angle);
        changed.write(LeverValueChanged {
            lever: entity,
            value,
        });
    }
}

pub fn animate_release<B: LeverBehavior>(
    mut exited: MessageReader<SelectExited>,
    mut levers: Query<(&Lever, &B, &mut AngleTween)>,
) {
    for exit in exited.read() {
        let Ok((lever, behavior, mut tween)) = levers.get_mut(exit.target) else {
            continue;
        };
        if lever.is_grabbed() {
            continue;
        }
        if let Some(request) = behavior.release_tween(lever) {
            tween.start(lever.angle, request);
        }
    }
}
