//! Grabbable VR controls for Bevy: push-buttons and rotating levers.
use bevy::prelude::*;

pub mod data;
pub mod systems;

use data::config::ConfigPlugin;
use systems::{buttons::ButtonPlugin, interaction::InteractionPlugin, levers::LeverPlugin};

pub struct XrControlsPlugin;

impl Plugin for XrControlsPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(ConfigPlugin);
        if !app.is_plugin_added::<InteractionPlugin>() {
            app.add_plugins(InteractionPlugin);
        }
        app.add_plugins((LeverPlugin, ButtonPlugin));
    }
}
