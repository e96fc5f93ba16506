// Operator display preferences persisted between runs

mod storage;

pub use storage::PreferenceStore;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key under which overlay calibrations are stored
pub const OVERLAYS_KEY: &str = "buildingMapOverlays";

/// Overlay calibrations keyed by floor number
pub type OverlayMap = BTreeMap<i32, OverlayCalibration>;

/// Placement of a floor-plan image under the live map
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayCalibration {
    /// Image source (URL or data URL)
    pub url: String,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub offset_x: f64,
    #[serde(default)]
    pub offset_y: f64,
    /// Degrees, one of 0, 90, 180, 270
    #[serde(default)]
    pub rotation: u16,
}

fn default_opacity() -> f64 {
    0.5
}

fn default_scale() -> f64 {
    1.0
}

impl OverlayCalibration {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            opacity: default_opacity(),
            scale: default_scale(),
            offset_x: 0.0,
            offset_y: 0.0,
            rotation: 0,
        }
    }

    pub fn rotate_quarter(&mut self) {
        self.rotation = (self.rotation + 90) % 360;
    }

    /// Reset placement. Image and opacity are kept.
    pub fn reset_transform(&mut self) {
        self.scale = default_scale();
        self.offset_x = 0.0;
        self.offset_y = 0.0;
        self.rotation = 0;
    }

    pub fn set_opacity(&mut self, opacity: f64) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }
}

/// Preference storage configuration
#[derive(Clone, Debug, Deserialize)]
pub struct PreferencesConfig {
    /// SQLite database file
    #[serde(default = "default_preferences_path")]
    pub path: String,
}

fn default_preferences_path() -> String {
    "firewatch.db".to_string()
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            path: default_preferences_path(),
        }
    }
}
