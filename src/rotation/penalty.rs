//! Recency penalty curve.

use serde::Serialize;

use crate::config::RotationSettings;

/// Maps an item's age in a history window to a weight multiplier in `[0, 1]`.
///
/// Absent items score 1.0. Present items decay linearly from the newest
/// slot (`recency_floor`) toward 1.0 at the window edge. Hot items are scaled
/// by `hot_multiplier` first and may sink to the lower `hot_floor`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PenaltyCurve {
    pub recency_floor: f64,
    pub hot_multiplier: f64,
    pub hot_floor: f64,
}

impl PenaltyCurve {
    pub fn from_settings(settings: &RotationSettings) -> Self {
        Self {
            recency_floor: settings.recency_floor,
            hot_multiplier: settings.hot_multiplier,
            hot_floor: settings.hot_floor,
        }
    }

    pub fn multiplier(&self, age: Option<usize>, window: usize, hot: bool) -> f64 {
        let Some(age) = age else {
            return 1.0;
        };
        let window = window.max(1);
        let freshness = age.min(window) as f64 / window as f64;
        let decay = self.recency_floor + (1.0 - self.recency_floor) * freshness;
        let (base, floor) = if hot {
            (self.hot_multiplier, self.hot_floor)
        } else {
            (1.0, self.recency_floor)
        };
        (base * decay).max(floor).clamp(0.0, 1.0)
    }
}

impl Default for PenaltyCurve {
    fn default() -> Self {
        Self::from_settings(&RotationSettings::default())
    }
}
