use bevy::prelude::*;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::systems::{buttons::PressMode, interaction::DEFAULT_MAX_GRAB_DISTANCE};

const CONTROLS_JSON: &str = include_str!("./content/controls.json");

static EMBEDDED_CONFIG: Lazy<Result<ControlsConfig, ControlsConfigError>> =
    Lazy::new(|| parse_controls_config(CONTROLS_JSON));

pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<ControlsConfig>() {
            app.insert_resource(embedded_controls_config());
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LeverSettings {
    pub min_angle: f32,
    pub max_angle: f32,
    pub value: f32,
    pub clamped_motion: bool,
    pub max_grab_distance: f32,
    pub increments: u32,
}

impl Default for LeverSettings {
    fn default() -> Self {
        Self {
            min_angle: -70.0,
            max_angle: 70.0,
            value: 0.5,
            clamped_motion: true,
            max_grab_distance: DEFAULT_MAX_GRAB_DISTANCE,
            increments: 2,
        }
    }
}

impl LeverSettings {
    /// Repairs anything [`validate_lever`] would flag.
    pub fn validated(mut self) -> Self {
        if self.min_angle > self.max_angle {
            std::mem::swap(&mut self.min_angle, &mut self.max_angle);
        }
        if self.clamped_motion {
            self.value = self.value.clamp(0.0, 1.0);
        }
        self.max_grab_distance = self.max_grab_distance.abs();
        self.increments = self.increments.max(2);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ButtonSettings {
    pub press_distance: f32,
    pub mode: PressMode,
}

impl Default for ButtonSettings {
    fn default() -> Self {
        Self {
            press_distance: 0.1,
            mode: PressMode::Momentary,
        }
    }
}

impl ButtonSettings {
    pub fn validated(mut self) -> Self {
        self.press_distance = self.press_distance.abs();
        self
    }
}

#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ControlsConfig {
    pub lever: LeverSettings,
    pub button: ButtonSettings,
}

impl ControlsConfig {
    pub fn validated(self) -> Self {
        Self {
            lever: self.lever.validated(),
            button: self.button.validated(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SettingsIssue {
    SwappedAngleRange { min_angle: f32, max_angle: f32 },
    ValueOutOfRange { value: f32 },
    NegativeDistance { field: &'static str, value: f32 },
    TooFewIncrements { increments: u32 },
}

impl std::fmt::Display for SettingsIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SwappedAngleRange {
                min_angle,
                max_angle,
            } => write!(f, "min_angle {min_angle} is above max_angle {max_angle}"),
            Self::ValueOutOfRange { value } => {
                write!(f, "value {value} lies outside [0, 1] with clamped motion")
            }
            Self::NegativeDistance { field, value } => write!(f, "{field} is negative ({value})"),
            Self::TooFewIncrements { increments } => {
                write!(f, "increments must be at least 2, got {increments}")
            }
        }
    }
}

pub fn validate_lever(settings: &LeverSettings) -> Vec<SettingsIssue> {
    let mut issues = Vec::new();
    if settings.min_angle > settings.max_angle {
        issues.push(SettingsIssue::SwappedAngleRange {
            min_angle: settings.min_angle,
            max_angle: settings.max_angle,
        });
    }
    if settings.clamped_motion && !(0.0..=1.0).contains(&settings.value) {
        issues.push(SettingsIssue::ValueOutOfRange {
            value: settings.value,
        });
    }
    if settings.max_grab_distance < 0.0 {
        issues.push(SettingsIssue::NegativeDistance {
            field: "max_grab_distance",
            value: settings.max_grab_distance,
        });
    }
    if settings.increments < 2 {
        issues.push(SettingsIssue::TooFewIncrements {
            increments: settings.increments,
        });
    }
    issues
}

pub fn validate_button(settings: &ButtonSettings) -> Vec<SettingsIssue> {
    let mut issues = Vec::new();
    if settings.press_distance < 0.0 {
        issues.push(SettingsIssue::NegativeDistance {
            field: "press_distance",
            value: settings.press_distance,
        });
    }
    issues
}

pub fn validate_config(config: &ControlsConfig) -> Vec<SettingsIssue> {
    let mut issues = validate_lever(&config.lever);
    issues.extend(validate_button(&config.button));
    issues
}

#[derive(Debug, Clone)]
pub enum ControlsConfigError {
    Parse(String),
    Validation(Vec<SettingsIssue>),
}

impl std::fmt::Display for ControlsConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(message) => write!(f, "{message}"),
            Self::Validation(issues) => {
                write!(f, "controls config failed validation with {} issue(s)", issues.len())
            }
        }
    }
}

impl std::error::Error for ControlsConfigError {}

pub fn parse_controls_config(json: &str) -> Result<ControlsConfig, ControlsConfigError> {
    let config: ControlsConfig = serde_json::from_str(json).map_err(|error| {
        ControlsConfigError::Parse(format!("failed to parse controls config: {error}"))
    })?;

    let issues = validate_config(&config);
    if !issues.is_empty() {
        return Err(ControlsConfigError::Validation(issues));
    }

    Ok(config)
}

/// The config shipped with the crate, or defaults if it fails to load.
pub fn embedded_controls_config() -> ControlsConfig {
    match EMBEDDED_CONFIG.as_ref() {
        Ok(config) => config.clone(),
        Err(error) => {
            warn!("{error}; falling back to default control settings.");
            if let ControlsConfigError::Validation(issues) = error {
                for issue in issues {
                    warn!("  {issue}");
                }
            }
            ControlsConfig::default()
        }
    }
}
