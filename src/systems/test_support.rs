use std::time::Duration;

use bevy::{prelude::*, time::TimeUpdateStrategy};

use crate::{systems::interaction::Interactor, XrControlsPlugin};

pub const FRAME: Duration = Duration::from_millis(20);

#[derive(Resource)]
pub struct Recorded<M: Message>(pub Vec<M>);

fn record<M: Message + Clone>(mut reader: MessageReader<M>, mut recorded: ResMut<Recorded<M>>) {
    recorded.0.extend(reader.read().cloned());
}

pub fn record_messages<M: Message + Clone>(app: &mut App) {
    app.insert_resource(Recorded::<M>(Vec::new()))
        .add_systems(Last, record::<M>);
}

pub fn make_controls_test_app() -> App {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, XrControlsPlugin));
    app.insert_resource(TimeUpdateStrategy::ManualDuration(FRAME));
    app
}

pub fn spawn_agent(app: &mut App, position: Vec3) -> Entity {
    app.world_mut()
        .spawn((
            Interactor::default(),
            Transform::from_translation(position),
            GlobalTransform::from_translation(position),
        ))
        .id()
}

/// Moves an agent without relying on transform propagation.
pub fn move_agent(app: &mut App, agent: Entity, position: Vec3) {
    let mut entity = app.world_mut().entity_mut(agent);
    if let Some(mut transform) = entity.get_mut::<Transform>() {
        transform.translation = position;
    }
    if let Some(mut global) = entity.get_mut::<GlobalTransform>() {
        *global = GlobalTransform::from_translation(position);
    }
}

pub fn run_frames(app: &mut App, frames: usize) {
    for _ in 0..frames {
        app.update();
    }
}
