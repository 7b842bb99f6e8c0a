use bevy::prelude::*;
use enum_map::{Enum, EnumMap};

use xr_controls::{
    data::config::{ControlsConfig, LeverSettings},
    systems::{
        buttons::{ClickPressButton, GripButton, PressMode, PushButton},
        interaction::{AttachOffset, GrabRange, Interactor},
        levers::{DirectLever, Lever, ReturningLever, SteppedLever, SteppedSnapLever},
    },
};

use super::hand::DemoHand;

#[derive(Enum, Debug, Clone, Copy, PartialEq, Eq)]
enum Part {
    Mount,
    Stick,
    Knob,
    ButtonBase,
    ButtonCap,
    Hand,
}

impl Part {
    fn color(self) -> Color {
        match self {
            Part::Mount => Color::srgb(0.25, 0.25, 0.28),
            Part::Stick => Color::srgb(0.7, 0.7, 0.72),
            Part::Knob => Color::srgb(0.85, 0.2, 0.15),
            Part::ButtonBase => Color::srgb(0.2, 0.2, 0.22),
            Part::ButtonCap => Color::srgb(0.15, 0.55, 0.9),
            Part::Hand => Color::srgb(0.95, 0.8, 0.6),
        }
    }

    fn mesh(self) -> Mesh {
        match self {
            Part::Mount => Cuboid::new(0.08, 0.04, 0.08).into(),
            Part::Stick => Cylinder::new(0.008, 0.24).into(),
            Part::Knob => Sphere::new(0.02).into(),
            Part::ButtonBase => Cuboid::new(0.12, 0.04, 0.12).into(),
            Part::ButtonCap => Cylinder::new(0.04, 0.02).into(),
            Part::Hand => Sphere::new(0.025).into(),
        }
    }
}

struct Parts {
    meshes: EnumMap<Part, Handle<Mesh>>,
    materials: EnumMap<Part, Handle<StandardMaterial>>,
}

impl Parts {
    fn visual(&self, part: Part) -> (Mesh3d, MeshMaterial3d<StandardMaterial>) {
        (
            Mesh3d(self.meshes[part].clone()),
            MeshMaterial3d(self.materials[part].clone()),
        )
    }
}

pub fn spawn_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    config: Res<ControlsConfig>,
) {
    let parts = Parts {
        meshes: EnumMap::from_fn(|part: Part| meshes.add(part.mesh())),
        materials: EnumMap::from_fn(|part: Part| materials.add(part.color())),
    };

    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, 0.55, 0.9).looking_at(Vec3::new(0.0, 0.1, 0.0), Vec3::Y),
    ));
    commands.spawn((
        PointLight {
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(0.8, 1.6, 0.8),
    ));

    let settings = &config.lever;
    spawn_lever(&mut commands, &parts, "Direct lever", -0.45, settings, DirectLever);
    spawn_lever(
        &mut commands,
        &parts,
        "Returning lever",
        -0.15,
        settings,
        ReturningLever::default(),
    );
    spawn_lever(
        &mut commands,
        &parts,
        "Stepped lever",
        0.15,
        settings,
        SteppedLever::new(settings.increments),
    );
    spawn_lever(
        &mut commands,
        &parts,
        "Snap lever",
        0.45,
        settings,
        SteppedSnapLever::new(settings.increments),
    );

    let button = PushButton::from_settings(&config.button);
    spawn_button(
        &mut commands,
        &parts,
        "Grip button",
        Vec3::new(-0.2, 0.0, 0.3),
        button.clone(),
        GripButton::new(config.button.mode),
    );
    spawn_button(
        &mut commands,
        &parts,
        "Toggle button",
        Vec3::new(0.2, 0.0, 0.3),
        button,
        ClickPressButton::new(PressMode::Toggle),
    );

    commands.spawn((
        Name::new("Hand"),
        DemoHand::default(),
        Interactor::default(),
        AttachOffset::default(),
        Transform::from_xyz(0.0, 0.3, 0.15),
        parts.visual(Part::Hand),
    ));

    info!("Arrows/PageUp/PageDown move the hand, Space grips, Escape quits.");
}

fn spawn_lever(
    commands: &mut Commands,
    parts: &Parts,
    name: &str,
    x: f32,
    settings: &LeverSettings,
    behavior: impl Bundle,
) -> Entity {
    let root = commands
        .spawn((
            Name::new(name.to_string()),
            Transform::from_xyz(x, 0.0, 0.0),
            parts.visual(Part::Mount),
        ))
        .id();
    let handle = commands
        .spawn((ChildOf(root), Transform::default(), Visibility::default()))
        .id();
    commands.spawn((
        ChildOf(handle),
        Transform::from_xyz(0.0, 0.12, 0.0),
        parts.visual(Part::Stick),
    ));
    let grip = commands
        .spawn((
            ChildOf(handle),
            Transform::from_xyz(0.0, 0.24, 0.0),
            parts.visual(Part::Knob),
        ))
        .id();

    commands.entity(root).insert((
        Lever::from_settings(settings).with_handle(handle),
        GrabRange::new(settings.max_grab_distance).with_grip(grip),
        behavior,
    ));
    root
}

fn spawn_button(
    commands: &mut Commands,
    parts: &Parts,
    name: &str,
    position: Vec3,
    button: PushButton,
    policy: impl Bundle,
) -> Entity {
    let root = commands
        .spawn((
            Name::new(name.to_string()),
            Transform::from_translation(position),
            parts.visual(Part::ButtonBase),
        ))
        .id();
    let cap = commands
        .spawn((
            ChildOf(root),
            Transform::default(),
            parts.visual(Part::ButtonCap),
        ))
        .id();

    commands
        .entity(root)
        .insert((button.with_cap(cap), policy));
    root
}
