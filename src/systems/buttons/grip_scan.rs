use bevy::prelude::*;

use super::{
    ButtonPressed, ButtonReleased, PressLatch, PressMode, PressPolicy, PressTransition,
    PushButton, SelectPhase,
};
use crate::systems::interaction::{attach_point, AttachOffset, GrabRange, Interactable, Interactor};

/// Button pressed by grabbing it, which also watches for grips that began
/// outside its own volume.
///
/// Every frame the registered interactors are scanned for one that is
/// actively selecting something within reach of the cap. The first match is
/// kept in `external_grip`. With `track_external_grip` off (the default) this
/// is purely diagnostic; with it on, that agent pushes the cap directly.
/// Reach comes from the button's [`GrabRange`] when it has one. While the
/// button itself is held, the grab lifecycle owns it and nothing is tracked.
#[derive(Component, Debug, Clone, Copy, Default)]
#[require(PushButton)]
pub struct ClickPressButton {
    pub latch: PressLatch,
    pub gripping_agent: Option<Entity>,
    pub external_grip: Option<Entity>,
    pub track_external_grip: bool,
    /// The current press came from a tracked grip, not the grab lifecycle.
    pressed_by_grip: bool,
}

impl ClickPressButton {
    pub fn new(mode: PressMode) -> Self {
        Self {
            latch: PressLatch::new(mode),
            ..default()
        }
    }

    pub fn with_grip_tracking(mut self, track_external_grip: bool) -> Self {
        self.track_external_grip = track_external_grip;
        self
    }

    pub fn scan_for_external_grips(
        interactors: Query<(Entity, &Interactor, &GlobalTransform, Option<&AttachOffset>)>,
        mut buttons: Query<(
            Entity,
            &mut ClickPressButton,
            &PushButton,
            &Interactable,
            &GlobalTransform,
            Option<&GrabRange>,
        )>,
        transforms: Query<&GlobalTransform>,
    ) {
        for (entity, mut click, button, interactable, button_transform, range) in
            buttons.iter_mut()
        {
            let gripping = if interactable.is_selected() {
                None
            } else {
                let range = range.copied().unwrap_or_default();
                let cap_point = button.cap_point(button_transform, &transforms);
                interactors
                    .iter()
                    .filter(|(_, interactor, ..)| interactor.is_selecting())
                    .find(|(_, _, agent_transform, offset)| {
                        range.within_reach(cap_point, attach_point(agent_transform, *offset))
                    })
                    .map(|(agent, ..)| agent)
            };

            if click.external_grip == gripping {
                continue;
            }
            match gripping {
                Some(agent) => debug!("Button {entity:?} sees an existing grip from {agent:?}."),
                None => debug!("Button {entity:?} no longer sees any grip."),
            }
            click.external_grip = gripping;
        }
    }

    pub fn track_external_grips(
        mut pressed: MessageWriter<ButtonPressed>,
        mut released: MessageWriter<ButtonReleased>,
        mut buttons: Query<(Entity, &mut ClickPressButton, &mut PushButton, &GlobalTransform)>,
        agents: Query<(&GlobalTransform, Option<&AttachOffset>), With<Interactor>>,
        transforms: Query<&GlobalTransform>,
    ) {
        for (entity, mut click, mut button, button_transform) in buttons.iter_mut() {
            if !click.track_external_grip {
                continue;
            }
            let Some((agent_transform, offset)) =
                click.external_grip.and_then(|agent| agents.get(agent).ok())
            else {
                if click.pressed_by_grip {
                    click.pressed_by_grip = false;
                    if button.apply(PressTransition::Release) {
                        released.write(ButtonReleased { button: entity });
                    }
                } else if button.travel.is_some() {
                    button.travel = None;
                }
                continue;
            };

            let reach = attach_point(agent_transform, offset)
                - button.cap_point(button_transform, &transforms);
            let height = cap_travel(button_transform, reach, button.press_distance);

            let now_pressed = height <= -button.press_distance;
            if now_pressed != button.pressed && button.apply(press_transition(now_pressed)) {
                click.pressed_by_grip = now_pressed;
                if now_pressed {
                    pressed.write(ButtonPressed { button: entity });
                } else {
                    released.write(ButtonReleased { button: entity });
                }
            }
            button.travel = Some(height);
        }
    }
}

fn press_transition(pressed: bool) -> PressTransition {
    if pressed {
        PressTransition::Press
    } else {
        PressTransition::Release
    }
}

/// Cap offset for a world-space reach vector, clamped to the press travel.
pub fn cap_travel(button_transform: &GlobalTransform, reach: Vec3, press_distance: f32) -> f32 {
    let local = button_transform.affine().inverse().transform_vector3(reach);
    local.y.clamp(-press_distance, 0.0)
}

impl PressPolicy for ClickPressButton {
    fn on_select(&mut self, phase: SelectPhase) -> Option<PressTransition> {
        self.pressed_by_grip = false;
        if self.latch.mode == PressMode::Momentary {
            self.gripping_agent = match phase {
                SelectPhase::Entered { agent } => Some(agent),
                SelectPhase::Exited { .. } => None,
            };
        }
        self.latch.on_select(phase)
    }
}
