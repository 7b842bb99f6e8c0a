//! Grab selection primitives shared by every control.
//!
//! Agents (hands, controllers) carry an [`Interactor`]; anything that can be
//! held carries an [`Interactable`]. Input glue writes [`SelectIntent`] and
//! [`ReleaseIntent`]; this module turns them into [`SelectEntered`] and
//! [`SelectExited`] notifications in a fixed per-frame order so that controls
//! always observe grab start, their dynamic update, and grab end in sequence.
//!
//! Controls may also request a [`ForceRelease`] during [`InteractionSystem::Process`];
//! it is resolved in the same frame, before [`InteractionSystem::Exit`].
use bevy::prelude::*;
use smallvec::SmallVec;

#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum InteractionSystem {
    Select,
    Enter,
    Process,
    Release,
    Exit,
    Animate,
}

pub struct InteractionPlugin;

impl Plugin for InteractionPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<SelectIntent>()
            .add_message::<ReleaseIntent>()
            .add_message::<ForceRelease>()
            .add_message::<SelectEntered>()
            .add_message::<SelectExited>()
            .configure_sets(
                Update,
                (
                    InteractionSystem::Select,
                    InteractionSystem::Enter,
                    InteractionSystem::Process,
                    InteractionSystem::Release,
                    InteractionSystem::Exit,
                    InteractionSystem::Animate,
                )
                    .chain(),
            )
            .add_systems(
                Update,
                resolve_select_intents.in_set(InteractionSystem::Select),
            )
            .add_systems(
                Update,
                resolve_release_requests.in_set(InteractionSystem::Release),
            );
    }
}

/// An agent able to grab interactables.
#[derive(Component, Debug, Default, Clone)]
#[require(Transform)]
pub struct Interactor {
    /// Grip input is held, whether or not it landed on anything.
    pub select_active: bool,
    pub selected: SmallVec<[Entity; 2]>,
}

impl Interactor {
    pub fn is_selecting(&self) -> bool {
        self.select_active && !self.selected.is_empty()
    }

    fn forget(&mut self, target: Entity) {
        self.selected.retain(|selected| *selected != target);
    }
}

/// Offset of the grab point in the agent's local space.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct AttachOffset(pub Vec3);

pub fn attach_point(agent: &GlobalTransform, offset: Option<&AttachOffset>) -> Vec3 {
    match offset {
        Some(offset) => agent.transform_point(offset.0),
        None => agent.translation(),
    }
}

#[derive(Component, Debug, Default, Clone, Copy)]
#[require(Transform)]
pub struct Interactable {
    pub selected_by: Option<Entity>,
}

impl Interactable {
    pub fn is_selected(&self) -> bool {
        self.selected_by.is_some()
    }
}

/// Physical reach of an interactable: agents farther than `max_distance`
/// from the grip point can neither start nor keep a grab.
#[derive(Component, Debug, Clone, Copy)]
pub struct GrabRange {
    pub max_distance: f32,
    pub grip: Option<Entity>,
}

impl Default for GrabRange {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_GRAB_DISTANCE)
    }
}

pub const DEFAULT_MAX_GRAB_DISTANCE: f32 = 0.17;

impl GrabRange {
    pub fn new(max_distance: f32) -> Self {
        Self {
            max_distance: max_distance.abs(),
            grip: None,
        }
    }

    pub fn with_grip(mut self, grip: Entity) -> Self {
        self.grip = Some(grip);
        self
    }

    /// World position of the grip, falling back to the owner when no grip is set
    /// or the grip entity is gone.
    pub fn grip_point(&self, owner: &GlobalTransform, transforms: &Query<&GlobalTransform>) -> Vec3 {
        self.grip
            .and_then(|grip| transforms.get(grip).ok())
            .map_or_else(|| owner.translation(), GlobalTransform::translation)
    }

    pub fn within_reach(&self, grip_point: Vec3, attach_point: Vec3) -> bool {
        grip_point.distance(attach_point) <= self.max_distance
    }
}

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectIntent {
    pub agent: Entity,
    pub target: Entity,
}

/// Grip input let go: releases everything the agent holds.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseIntent {
    pub agent: Entity,
}

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForceRelease {
    pub agent: Entity,
    pub target: Entity,
}

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectEntered {
    pub agent: Entity,
    pub target: Entity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseReason {
    Released,
    OutOfReach,
}

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectExited {
    pub agent: Entity,
    pub target: Entity,
    pub reason: ReleaseReason,
}

pub fn resolve_select_intents(
    mut intents: MessageReader<SelectIntent>,
    mut entered: MessageWriter<SelectEntered>,
    mut interactors: Query<(&mut Interactor, &GlobalTransform, Option<&AttachOffset>)>,
    mut interactables: Query<(&mut Interactable, &GlobalTransform, Option<&GrabRange>)>,
    transforms: Query<&GlobalTransform>,
) {
    for intent in intents.read() {
        let Ok((mut interactor, agent_transform, offset)) = interactors.get_mut(intent.agent)
        else {
            warn!("Select intent from {:?}, which is not an interactor.", intent.agent);
            continue;
        };
        interactor.select_active = true;

        let Ok((mut interactable, target_transform, range)) = interactables.get_mut(intent.target)
        else {
            debug!("Select intent on {:?}, which is not interactable.", intent.target);
            continue;
        };

        if let Some(holder) = interactable.selected_by {
            if holder != intent.agent {
                debug!("{:?} is already held by {:?}.", intent.target, holder);
            }
            continue;
        }

        if let Some(range) = range {
            let grip_point = range.grip_point(target_transform, &transforms);
            if !range.within_reach(grip_point, attach_point(agent_transform, offset)) {
                debug!("{:?} is out of reach of {:?}.", intent.target, intent.agent);
                continue;
            }
        }

        interactable.selected_by = Some(intent.agent);
        interactor.selected.push(intent.target);
        entered.write(SelectEntered {
            agent: intent.agent,
            target: intent.target,
        });
    }
}

pub fn resolve_release_requests(
    mut intents: MessageReader<ReleaseIntent>,
    mut forced: MessageReader<ForceRelease>,
    mut exited: MessageWriter<SelectExited>,
    mut interactors: Query<&mut Interactor>,
    mut interactables: Query<&mut Interactable>,
) {
    let mut requests: Vec<(Entity, Entity, ReleaseReason)> = forced
        .read()
        .map(|request| (request.agent, request.target, ReleaseReason::OutOfReach))
        .collect();

    for intent in intents.read() {
        let Ok(mut interactor) = interactors.get_mut(intent.agent) else {
            continue;
        };
        interactor.select_active = false;
        requests.extend(
            interactor
                .selected
                .iter()
                .map(|target| (intent.agent, *target, ReleaseReason::Released)),
        );
    }

    for (agent, target, reason) in requests {
        if let Ok(mut interactor) = interactors.get_mut(agent) {
            interactor.forget(target);
        }
        let Ok(mut interactable) = interactables.get_mut(target) else {
            continue;
        };
        if interactable.selected_by != Some(agent) {
            continue;
        }
        interactable.selected_by = None;
        exited.write(SelectExited {
            agent,
            target,
            reason,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::test_support::{record_messages, spawn_agent, Recorded};

    fn make_interaction_test_app() -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, InteractionPlugin));
        record_messages::<SelectEntered>(&mut app);
        record_messages::<SelectExited>(&mut app);
        app
    }

    fn spawn_target(app: &mut App, range: Option<GrabRange>) -> Entity {
        let mut target = app.world_mut().spawn((
            Interactable::default(),
            Transform::IDENTITY,
            GlobalTransform::IDENTITY,
        ));
        if let Some(range) = range {
            target.insert(range);
        }
        target.id()
    }

    #[test]
    fn select_within_reach_enters() {
        let mut app = make_interaction_test_app();
        let target = spawn_target(&mut app, Some(GrabRange::new(0.2)));
        let agent = spawn_agent(&mut app, Vec3::new(0.0, 0.1, 0.0));

        app.world_mut().write_message(SelectIntent { agent, target });
        app.update();

        let entered = &app.world().resource::<Recorded<SelectEntered>>().0;
        assert_eq!(entered.as_slice(), &[SelectEntered { agent, target }]);
        assert_eq!(
            app.world().get::<Interactable>(target).and_then(|i| i.selected_by),
            Some(agent)
        );
        let interactor = app.world().get::<Interactor>(agent).expect("interactor");
        assert!(interactor.is_selecting());
    }

    #[test]
    fn select_out_of_reach_is_ignored_but_grip_stays_active() {
        let mut app = make_interaction_test_app();
        let target = spawn_target(&mut app, Some(GrabRange::new(0.17)));
        let agent = spawn_agent(&mut app, Vec3::new(0.0, 0.5, 0.0));

        app.world_mut().write_message(SelectIntent { agent, target });
        app.update();

        assert!(app.world().resource::<Recorded<SelectEntered>>().0.is_empty());
        assert!(!app.world().get::<Interactable>(target).expect("target").is_selected());
        let interactor = app.world().get::<Interactor>(agent).expect("interactor");
        assert!(interactor.select_active);
        assert!(!interactor.is_selecting());
    }

    #[test]
    fn grip_point_defines_reach() {
        let mut app = make_interaction_test_app();
        let grip = app
            .world_mut()
            .spawn((Transform::default(), GlobalTransform::from_xyz(0.0, 1.0, 0.0)))
            .id();
        let target = spawn_target(&mut app, Some(GrabRange::new(0.17).with_grip(grip)));
        let agent = spawn_agent(&mut app, Vec3::new(0.0, 1.1, 0.0));

        app.world_mut().write_message(SelectIntent { agent, target });
        app.update();

        assert_eq!(app.world().resource::<Recorded<SelectEntered>>().0.len(), 1);
    }

    #[test]
    fn held_target_cannot_be_taken_by_another_agent() {
        let mut app = make_interaction_test_app();
        let target = spawn_target(&mut app, None);
        let first = spawn_agent(&mut app, Vec3::ZERO);
        let second = spawn_agent(&mut app, Vec3::ZERO);

        app.world_mut().write_message(SelectIntent { agent: first, target });
        app.update();
        app.world_mut().write_message(SelectIntent { agent: second, target });
        app.update();

        assert_eq!(app.world().resource::<Recorded<SelectEntered>>().0.len(), 1);
        assert_eq!(
            app.world().get::<Interactable>(target).and_then(|i| i.selected_by),
            Some(first)
        );
    }

    #[test]
    fn release_intent_exits_every_held_target() {
        let mut app = make_interaction_test_app();
        let left = spawn_target(&mut app, None);
        let right = spawn_target(&mut app, None);
        let agent = spawn_agent(&mut app, Vec3::ZERO);

        app.world_mut().write_message(SelectIntent { agent, target: left });
        app.world_mut().write_message(SelectIntent { agent, target: right });
        app.update();
        app.world_mut().write_message(ReleaseIntent { agent });
        app.update();

        let exited = &app.world().resource::<Recorded<SelectExited>>().0;
        assert_eq!(exited.len(), 2);
        assert!(exited.iter().all(|exit| exit.reason == ReleaseReason::Released));
        let interactor = app.world().get::<Interactor>(agent).expect("interactor");
        assert!(!interactor.select_active);
        assert!(interactor.selected.is_empty());
    }

    #[test]
    fn force_release_reports_out_of_reach() {
        let mut app = make_interaction_test_app();
        let target = spawn_target(&mut app, None);
        let agent = spawn_agent(&mut app, Vec3::ZERO);

        app.world_mut().write_message(SelectIntent { agent, target });
        app.update();
        app.world_mut().write_message(ForceRelease { agent, target });
        app.update();

        let exited = &app.world().resource::<Recorded<SelectExited>>().0;
        assert_eq!(
            exited.as_slice(),
            &[SelectExited {
                agent,
                target,
                reason: ReleaseReason::OutOfReach
            }]
        );
        // Grip input is still held after a forced release.
        assert!(app.world().get::<Interactor>(agent).expect("interactor").select_active);
    }
}
