use bevy::prelude::*;
use xr_controls::XrControlsPlugin;

mod demo;

use demo::DemoPlugin;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins)
        .add_plugins((XrControlsPlugin, DemoPlugin))
        .run();
}
