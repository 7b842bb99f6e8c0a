//! Desktop stand-in for an XR rig: one keyboard-driven hand and a bench of
//! every control.
use bevy::prelude::*;

use xr_controls::systems::{
    buttons::{ButtonPressed, ButtonReleased},
    interaction::InteractionSystem,
    levers::LeverValueChanged,
};

mod hand;
mod scene;

pub struct DemoPlugin;

impl Plugin for DemoPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, scene::spawn_scene)
            .add_systems(
                Update,
                (hand::move_hand, hand::grab_input)
                    .chain()
                    .before(InteractionSystem::Select),
            )
            .add_systems(
                Update,
                log_notifications.after(InteractionSystem::Animate),
            )
            .add_systems(Update, quit_on_escape);
    }
}

fn label(names: &Query<&Name>, entity: Entity) -> String {
    names
        .get(entity)
        .map_or_else(|_| format!("{entity:?}"), |name| name.to_string())
}

fn log_notifications(
    mut values: MessageReader<LeverValueChanged>,
    mut pressed: MessageReader<ButtonPressed>,
    mut released: MessageReader<ButtonReleased>,
    names: Query<&Name>,
) {
    for changed in values.read() {
        debug!("{} -> {:.2}", label(&names, changed.lever), changed.value);
    }
    for press in pressed.read() {
        info!("{} pressed", label(&names, press.button));
    }
    for release in released.read() {
        info!("{} released", label(&names, release.button));
    }
}

fn quit_on_escape(keys: Res<ButtonInput<KeyCode>>, mut exit: MessageWriter<AppExit>) {
    if keys.just_pressed(KeyCode::Escape) {
        info!("Leaving the control bench.");
        exit.write(AppExit::Success);
    }
}
