use bevy::prelude::*;

use xr_controls::systems::interaction::{
    GrabRange, Interactable, ReleaseIntent, SelectIntent,
};

/// Keyboard-driven agent: arrows move in the horizontal plane, PageUp and
/// PageDown move vertically, Space grips.
#[derive(Component, Debug, Clone, Copy)]
pub struct DemoHand {
    pub speed: f32,
}

impl Default for DemoHand {
    fn default() -> Self {
        Self { speed: 0.4 }
    }
}

pub fn move_hand(
    time: Res<Time>,
    keys: Res<ButtonInput<KeyCode>>,
    mut hands: Query<(&DemoHand, &mut Transform)>,
) {
    let bindings = [
        (KeyCode::ArrowLeft, Vec3::NEG_X),
        (KeyCode::ArrowRight, Vec3::X),
        (KeyCode::ArrowUp, Vec3::NEG_Z),
        (KeyCode::ArrowDown, Vec3::Z),
        (KeyCode::PageUp, Vec3::Y),
        (KeyCode::PageDown, Vec3::NEG_Y),
    ];
    let direction: Vec3 = bindings
        .iter()
        .filter(|(key, _)| keys.pressed(*key))
        .map(|(_, direction)| *direction)
        .sum();
    if direction == Vec3::ZERO {
        return;
    }

    for (hand, mut transform) in hands.iter_mut() {
        transform.translation += direction.normalize() * hand.speed * time.delta_secs();
    }
}

pub fn grab_input(
    keys: Res<ButtonInput<KeyCode>>,
    hands: Query<(Entity, &GlobalTransform), With<DemoHand>>,
    targets: Query<(Entity, &GlobalTransform, Option<&GrabRange>), With<Interactable>>,
    transforms: Query<&GlobalTransform>,
    mut select: MessageWriter<SelectIntent>,
    mut release: MessageWriter<ReleaseIntent>,
) {
    for (agent, hand) in hands.iter() {
        if keys.just_pressed(KeyCode::Space) {
            let nearest = targets
                .iter()
                .map(|(target, transform, range)| {
                    let point = range.map_or_else(
                        || transform.translation(),
                        |range| range.grip_point(transform, &transforms),
                    );
                    (target, point.distance(hand.translation()))
                })
                .min_by(|a, b| a.1.total_cmp(&b.1));

            if let Some((target, distance)) = nearest {
                debug!("Hand reaching for {target:?} at {distance:.3} m.");
                select.write(SelectIntent { agent, target });
            }
        }
        if keys.just_released(KeyCode::Space) {
            release.write(ReleaseIntent { agent });
        }
    }
}
