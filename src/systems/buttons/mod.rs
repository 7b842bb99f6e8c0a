//! Push-buttons.
//!
//! [`PushButton`] owns the pressed state and the cap's height offset. A press
//! policy ([`ClickPressButton`], [`GripButton`]) decides how select
//! notifications turn into presses and releases, through the single
//! [`PressPolicy::on_select`] entry point.
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    data::config::ButtonSettings,
    systems::interaction::{Interactable, InteractionPlugin, InteractionSystem, SelectEntered, SelectExited},
};

pub mod grip_scan;

pub use grip_scan::ClickPressButton;

macro_rules! register_press_systems {
    ($app:expr, $policy:ty) => {
        $app.add_systems(
            Update,
            (
                press_on_enter::<$policy>.in_set(InteractionSystem::Enter),
                press_on_exit::<$policy>.in_set(InteractionSystem::Exit),
            )
                .run_if(any_with_component::<$policy>),
        );
    };
}

pub struct ButtonPlugin;

impl Plugin for ButtonPlugin {
    fn build(&self, app: &mut App) {
        if !app.is_plugin_added::<InteractionPlugin>() {
            app.add_plugins(InteractionPlugin);
        }

        app.add_message::<ButtonPressed>()
            .add_message::<ButtonReleased>()
            .add_systems(
                Update,
                (
                    ClickPressButton::scan_for_external_grips.in_set(InteractionSystem::Process),
                    ClickPressButton::track_external_grips
                        .in_set(InteractionSystem::Process)
                        .after(ClickPressButton::scan_for_external_grips),
                )
                    .run_if(any_with_component::<ClickPressButton>),
            )
            .add_systems(
                Update,
                PushButton::sync_caps
                    .in_set(InteractionSystem::Animate)
                    .run_if(any_with_component::<PushButton>),
            );

        register_press_systems!(app, ClickPressButton);
        register_press_systems!(app, GripButton);
    }
}

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonPressed {
    pub button: Entity,
}

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonReleased {
    pub button: Entity,
}

pub const DEFAULT_PRESS_DISTANCE: f32 = 0.1;

#[derive(Component, Debug, Clone, PartialEq)]
#[require(Interactable)]
pub struct PushButton {
    /// Moving part, offset along its local Y. Missing caps are skipped.
    pub cap: Option<Entity>,
    pub press_distance: f32,
    pub pressed: bool,
    /// Continuous cap offset while a grip drives the cap directly.
    pub travel: Option<f32>,
}

impl Default for PushButton {
    fn default() -> Self {
        Self::new(DEFAULT_PRESS_DISTANCE)
    }
}

impl PushButton {
    pub fn new(press_distance: f32) -> Self {
        Self {
            cap: None,
            press_distance: press_distance.abs(),
            pressed: false,
            travel: None,
        }
    }

    pub fn from_settings(settings: &ButtonSettings) -> Self {
        Self::new(settings.clone().validated().press_distance)
    }

    pub fn with_cap(mut self, cap: Entity) -> Self {
        self.cap = Some(cap);
        self
    }

    pub fn height_for(&self, pressed: bool) -> f32 {
        if pressed {
            -self.press_distance
        } else {
            0.0
        }
    }

    /// Cap offset currently shown.
    pub fn height(&self) -> f32 {
        self.travel.unwrap_or_else(|| self.height_for(self.pressed))
    }

    /// Overrides the shown cap offset, clamped to the press travel.
    pub fn set_height(&mut self, height: f32) {
        self.travel = Some(height.clamp(-self.press_distance, 0.0));
    }

    /// Applies a transition and drops any height override; returns false
    /// when the pressed state is unchanged.
    pub fn apply(&mut self, transition: PressTransition) -> bool {
        let pressed = transition == PressTransition::Press;
        let changed = self.pressed != pressed;
        self.pressed = pressed;
        self.travel = None;
        changed
    }

    /// World position of the cap, or of the button when it has none.
    pub fn cap_point(&self, owner: &GlobalTransform, transforms: &Query<&GlobalTransform>) -> Vec3 {
        self.cap
            .and_then(|cap| transforms.get(cap).ok())
            .map_or_else(|| owner.translation(), GlobalTransform::translation)
    }

    pub fn sync_caps(
        buttons: Query<&PushButton, Changed<PushButton>>,
        mut transforms: Query<&mut Transform, Without<PushButton>>,
    ) {
        for button in buttons.iter() {
            let Some(cap) = button.cap else {
                continue;
            };
            if let Ok(mut transform) = transforms.get_mut(cap) {
                transform.translation.y = button.height();
            }
        }
    }
}

/// Select notification handed to a press policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectPhase {
    Entered { agent: Entity },
    Exited { agent: Entity },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressTransition {
    Press,
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PressMode {
    /// Held while selected.
    #[default]
    Momentary,
    /// Flips on every grab.
    Toggle,
}

/// Momentary/toggle state machine shared by the button policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PressLatch {
    pub mode: PressMode,
    pub toggled: bool,
}

impl PressLatch {
    pub fn new(mode: PressMode) -> Self {
        Self {
            mode,
            toggled: false,
        }
    }

    pub fn on_select(&mut self, phase: SelectPhase) -> Option<PressTransition> {
        match (self.mode, phase) {
            (PressMode::Momentary, SelectPhase::Entered { .. }) => Some(PressTransition::Press),
            (PressMode::Momentary, SelectPhase::Exited { .. }) => Some(PressTransition::Release),
            (PressMode::Toggle, SelectPhase::Entered { .. }) => {
                self.toggled = !self.toggled;
                Some(if self.toggled {
                    PressTransition::Press
                } else {
                    PressTransition::Release
                })
            }
            (PressMode::Toggle, SelectPhase::Exited { .. }) => None,
        }
    }
}

pub trait PressPolicy: Component<Mutability = bevy::ecs::component::Mutable> {
    fn on_select(&mut self, phase: SelectPhase) -> Option<PressTransition>;
}

/// Press behaviour driven purely by the grab lifecycle.
#[derive(Component, Debug, Clone, Copy, Default)]
#[require(PushButton)]
pub struct GripButton {
    pub latch: PressLatch,
}

impl GripButton {
    pub fn new(mode: PressMode) -> Self {
        Self {
            latch: PressLatch::new(mode),
        }
    }
}

impl PressPolicy for GripButton {
    fn on_select(&mut self, phase: SelectPhase) -> Option<PressTransition> {
        self.latch.on_select(phase)
    }
}

fn apply_transition(
    entity: Entity,
    button: &mut PushButton,
    transition: PressTransition,
    pressed: &mut MessageWriter<ButtonPressed>,
    released: &mut MessageWriter<ButtonReleased>,
) {
    if !button.apply(transition) {
        return;
    }
    match transition {
        PressTransition::Press => {
            pressed.write(ButtonPressed { button: entity });
        }
        PressTransition::Release => {
            released.write(ButtonReleased { button: entity });
        }
    }
    debug!("Button {entity:?}: {transition:?}.");
}

pub fn press_on_enter<P: PressPolicy>(
    mut entered: MessageReader<SelectEntered>,
    mut pressed: MessageWriter<ButtonPressed>,
    mut released: MessageWriter<ButtonReleased>,
    mut buttons: Query<(&mut P, &mut PushButton)>,
) {
    for grab in entered.read() {
        let Ok((mut policy, mut button)) = buttons.get_mut(grab.target) else {
            continue;
        };
        if let Some(transition) = policy.on_select(SelectPhase::Entered { agent: grab.agent }) {
            apply_transition(grab.target, &mut button, transition, &mut pressed, &mut released);
        }
    }
}

pub fn press_on_exit<P: PressPolicy>(
    mut exited: MessageReader<SelectExited>,
    mut pressed: MessageWriter<ButtonPressed>,
    mut released: MessageWriter<ButtonReleased>,
    mut buttons: Query<(&mut P, &mut PushButton)>,
) {
    for exit in exited.read() {
        let Ok((mut policy, mut button)) = buttons.get_mut(exit.target) else {
            continue;
        };
        if let Some(transition) = policy.on_select(SelectPhase::Exited { agent: exit.agent }) {
            apply_transition(exit.target, &mut button, transition, &mut pressed, &mut released);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::{
        interaction::{ReleaseIntent, SelectIntent},
        test_support::{make_controls_test_app, record_messages, spawn_agent, Recorded},
    };

    fn spawn_button(app: &mut App, policy: impl Bundle) -> (Entity, Entity) {
        let cap = app
            .world_mut()
            .spawn((Transform::IDENTITY, GlobalTransform::IDENTITY))
            .id();
        let button = app
            .world_mut()
            .spawn((
                PushButton::new(0.1).with_cap(cap),
                Transform::IDENTITY,
                GlobalTransform::IDENTITY,
                policy,
            ))
            .id();
        (button, cap)
    }

    fn make_button_test_app() -> App {
        let mut app = make_controls_test_app();
        record_messages::<ButtonPressed>(&mut app);
        record_messages::<ButtonReleased>(&mut app);
        app
    }

    fn counts(app: &App) -> (usize, usize) {
        (
            app.world().resource::<Recorded<ButtonPressed>>().0.len(),
            app.world().resource::<Recorded<ButtonReleased>>().0.len(),
        )
    }

    fn cap_height(app: &App, cap: Entity) -> f32 {
        app.world().get::<Transform>(cap).expect("cap").translation.y
    }

    fn grab(app: &mut App, agent: Entity, target: Entity) {
        app.world_mut().write_message(SelectIntent { agent, target });
        app.update();
    }

    fn let_go(app: &mut App, agent: Entity) {
        app.world_mut().write_message(ReleaseIntent { agent });
        app.update();
    }

    #[test]
    fn set_height_is_clamped_and_shown_on_the_cap() {
        let mut app = make_button_test_app();
        let (button, cap) = spawn_button(&mut app, GripButton::default());

        app.world_mut()
            .get_mut::<PushButton>(button)
            .expect("button")
            .set_height(-0.4);
        app.update();

        assert_eq!(cap_height(&app, cap), -0.1);
        assert_eq!(counts(&app), (0, 0));
    }

    #[test]
    fn grabbing_after_a_height_override_shows_the_pressed_cap() {
        let mut app = make_button_test_app();
        let (button, cap) = spawn_button(&mut app, GripButton::default());
        let agent = spawn_agent(&mut app, Vec3::new(0.0, 0.05, 0.0));

        app.world_mut()
            .get_mut::<PushButton>(button)
            .expect("button")
            .set_height(-0.03);
        app.update();
        assert_eq!(cap_height(&app, cap), -0.03);

        grab(&mut app, agent, button);
        assert_eq!(cap_height(&app, cap), -0.1);
        assert_eq!(counts(&app), (1, 0));

        let_go(&mut app, agent);
        assert_eq!(cap_height(&app, cap), 0.0);
        assert_eq!(counts(&app), (1, 1));
    }

    #[test]
    fn momentary_latch_follows_the_grab() {
        let agent = Entity::from_bits(7);
        let mut latch = PressLatch::new(PressMode::Momentary);
        assert_eq!(
            latch.on_select(SelectPhase::Entered { agent }),
            Some(PressTransition::Press)
        );
        assert_eq!(
            latch.on_select(SelectPhase::Exited { agent }),
            Some(PressTransition::Release)
        );
    }

    #[test]
    fn toggle_latch_flips_on_enter_and_ignores_exit() {
        let agent = Entity::from_bits(7);
        let mut latch = PressLatch::new(PressMode::Toggle);
        assert_eq!(
            latch.on_select(SelectPhase::Entered { agent }),
            Some(PressTransition::Press)
        );
        assert_eq!(latch.on_select(SelectPhase::Exited { agent }), None);
        assert!(latch.toggled);
        assert_eq!(
            latch.on_select(SelectPhase::Entered { agent }),
            Some(PressTransition::Release)
        );
        assert!(!latch.toggled);
    }

    #[test]
    fn height_tracks_pressed_state() {
        let mut button = PushButton::new(0.1);
        assert_eq!(button.height(), 0.0);
        assert!(button.apply(PressTransition::Press));
        assert_eq!(button.height(), -0.1);
        assert!(!button.apply(PressTransition::Press));
        button.travel = Some(-0.04);
        assert_eq!(button.height(), -0.04);
    }

    #[test]
    fn negative_press_distance_is_made_positive() {
        assert_eq!(PushButton::new(-0.2).press_distance, 0.2);
    }

    #[test]
    fn momentary_grip_button_presses_for_the_grab_duration() {
        let mut app = make_button_test_app();
        let (button, cap) = spawn_button(&mut app, GripButton::new(PressMode::Momentary));
        let agent = spawn_agent(&mut app, Vec3::ZERO);

        grab(&mut app, agent, button);
        assert_eq!(counts(&app), (1, 0));
        assert!(app.world().get::<PushButton>(button).expect("button").pressed);
        assert_eq!(cap_height(&app, cap), -0.1);

        let_go(&mut app, agent);
        assert_eq!(counts(&app), (1, 1));
        assert!(!app.world().get::<PushButton>(button).expect("button").pressed);
        assert_eq!(cap_height(&app, cap), 0.0);
    }

    #[test]
    fn toggle_click_button_alternates_on_successive_grabs() {
        let mut app = make_button_test_app();
        let (button, cap) = spawn_button(&mut app, ClickPressButton::new(PressMode::Toggle));
        let agent = spawn_agent(&mut app, Vec3::ZERO);

        grab(&mut app, agent, button);
        let_go(&mut app, agent);
        assert_eq!(counts(&app), (1, 0));
        assert_eq!(cap_height(&app, cap), -0.1);

        grab(&mut app, agent, button);
        assert_eq!(counts(&app), (1, 1));
        assert_eq!(cap_height(&app, cap), 0.0);
        let_go(&mut app, agent);

        grab(&mut app, agent, button);
        assert_eq!(counts(&app), (2, 1));
        assert!(app.world().get::<PushButton>(button).expect("button").pressed);
    }

    #[test]
    fn button_without_cap_still_reports_presses() {
        let mut app = make_button_test_app();
        let button = app
            .world_mut()
            .spawn((
                PushButton::new(0.1),
                Transform::IDENTITY,
                GlobalTransform::IDENTITY,
                GripButton::default(),
            ))
            .id();
        let agent = spawn_agent(&mut app, Vec3::ZERO);

        grab(&mut app, agent, button);
        assert_eq!(counts(&app), (1, 0));
    }
}
