//! Player preferences
//!
//! Storage is owned by the host; this module only defines the shape and the
//! JSON encoding.

use serde::{Deserialize, Serialize};

/// World speed multiplier presets, cycled by the speed button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SpeedPreset {
    #[default]
    Normal,
    Fast,
    Turbo,
    Relaxed,
}

impl SpeedPreset {
    /// Cycle order
    pub const ALL: [SpeedPreset; 4] = [
        SpeedPreset::Normal,
        SpeedPreset::Fast,
        SpeedPreset::Turbo,
        SpeedPreset::Relaxed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SpeedPreset::Normal => "Normal",
            SpeedPreset::Fast => "Fast",
            SpeedPreset::Turbo => "Turbo",
            SpeedPreset::Relaxed => "Relaxed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "normal" | "1x" => Some(SpeedPreset::Normal),
            "fast" => Some(SpeedPreset::Fast),
            "turbo" => Some(SpeedPreset::Turbo),
            "relaxed" | "slow" => Some(SpeedPreset::Relaxed),
            _ => None,
        }
    }

    /// Multiplier applied to the effective world speed
    pub fn multiplier(&self) -> f32 {
        match self {
            SpeedPreset::Normal => 1.0,
            SpeedPreset::Fast => 1.2,
            SpeedPreset::Turbo => 1.4,
            SpeedPreset::Relaxed => 0.8,
        }
    }

    /// Next preset in the cycle (wraps)
    pub fn next(&self) -> Self {
        let idx = Self::ALL.iter().position(|p| p == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub speed: SpeedPreset,
    /// Pre-launch rumble and other camera shake
    pub screen_shake: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            speed: SpeedPreset::Normal,
            screen_shake: true,
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Advance to the next speed preset, returning the new multiplier
    pub fn cycle_speed(&mut self) -> f32 {
        self.speed = self.speed.next();
        log::info!("Speed preset: {}", self.speed.as_str());
        self.speed.multiplier()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_cycle_wraps() {
        let mut settings = Settings::default();
        let seen: Vec<f32> = (0..4).map(|_| settings.cycle_speed()).collect();
        assert_eq!(seen, vec![1.2, 1.4, 0.8, 1.0]);
        assert_eq!(settings.speed, SpeedPreset::Normal);
    }

    #[test]
    fn test_from_str_aliases() {
        assert_eq!(SpeedPreset::from_str("SLOW"), Some(SpeedPreset::Relaxed));
        assert_eq!(SpeedPreset::from_str("warp"), None);
    }

    #[test]
    fn test_missing_fields_default() {
        let settings = Settings::from_json(r#"{ "speed": "Turbo" }"#).unwrap();
        assert_eq!(settings.speed, SpeedPreset::Turbo);
        assert!(settings.screen_shake);
    }
}
