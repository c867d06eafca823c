//! Data-driven game balance
//!
//! Every field has a default matching the shipped balance, so a tuning file
//! only needs to list the values it overrides.

use serde::{Deserialize, Serialize};

/// Spawner pacing. The defaults are the "calm start" balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTuning {
    /// Minimum gap between packs at score 0 (world units)
    pub gap_base: f32,
    /// Floor the minimum gap shrinks to
    pub gap_min: f32,
    /// Gap shrink per point of score
    pub gap_slope: f32,
    /// Extra random gap added on top of the minimum
    pub gap_jitter: f32,
    /// Close back-to-back hazards are not allowed before this score
    pub close_gap_start_score: u32,
    /// Chance of a close follow-up hazard once allowed
    pub close_gap_chance_max: f32,
    pub staircase_chance: f32,
    pub staircase_min: u32,
    pub staircase_max: u32,
    pub collectibles_scale: f32,
    pub animals_scale: f32,
    /// Countdown before the first pack
    pub initial_countdown: f32,
    /// Extra countdown after a pack spawned inside a safe window
    pub safe_extra_gap: f32,
    /// Tunnels join the slot roll from this score on
    pub tunnel_start_score: u32,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            gap_base: 300.0,
            gap_min: 200.0,
            gap_slope: 1.1,
            gap_jitter: 105.0,
            close_gap_start_score: 70,
            close_gap_chance_max: 0.05,
            staircase_chance: 0.36,
            staircase_min: 2,
            staircase_max: 3,
            collectibles_scale: 0.80,
            animals_scale: 0.82,
            initial_countdown: 260.0,
            safe_extra_gap: 120.0,
            tunnel_start_score: 40,
        }
    }
}

/// Run-wide balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub start_lives: u8,
    pub max_lives: u8,
    /// Added to every beat speed curve (the run plays at roughly double the
    /// curve's nominal speed)
    pub base_speed_boost: f32,
    /// A life pickup is offered every this many points
    pub bonus_life_interval: u32,
    /// A checkpoint blanket is offered every this many points
    pub checkpoint_interval: u32,
    /// Frames between losing the last life and the restart
    pub restart_delay: u32,
    /// Score at which the home/finish sequence starts (None = endless)
    pub home_score: Option<u32>,
    pub spawn: SpawnTuning,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            start_lives: 7,
            max_lives: 7,
            base_speed_boost: 2.35,
            bonus_life_interval: 60,
            checkpoint_interval: 150,
            restart_delay: 27,
            home_score: None,
            spawn: SpawnTuning::default(),
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) tuning document
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut tuning: Tuning = serde_json::from_str(json)?;
        tuning.sanitize();
        Ok(tuning)
    }

    /// Parse a tuning document, falling back to the defaults on bad input
    pub fn from_json_or_default(json: &str) -> Self {
        match Self::from_json(json) {
            Ok(tuning) => {
                log::info!("Loaded tuning overrides");
                tuning
            }
            Err(e) => {
                log::warn!("Invalid tuning ({e}), using defaults");
                Self::default()
            }
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Pull out-of-range values back into something playable
    fn sanitize(&mut self) {
        self.max_lives = self.max_lives.max(1);
        self.start_lives = self.start_lives.clamp(1, self.max_lives);
        self.bonus_life_interval = self.bonus_life_interval.max(1);
        self.checkpoint_interval = self.checkpoint_interval.max(1);
        let spawn = &mut self.spawn;
        spawn.gap_min = spawn.gap_min.max(1.0);
        spawn.gap_base = spawn.gap_base.max(spawn.gap_min);
        spawn.staircase_min = spawn.staircase_min.max(1);
        spawn.staircase_max = spawn.staircase_max.max(spawn.staircase_min);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "start_lives": 3, "spawn": { "gap_base": 320.0 } }"#)
            .unwrap();
        assert_eq!(tuning.start_lives, 3);
        assert_eq!(tuning.max_lives, 7);
        assert_eq!(tuning.spawn.gap_base, 320.0);
        assert_eq!(tuning.spawn.gap_min, 200.0);
    }

    #[test]
    fn test_invalid_json_falls_back() {
        let tuning = Tuning::from_json_or_default("{ not json");
        assert_eq!(tuning, Tuning::default());
    }

    #[test]
    fn test_sanitize_clamps_lives() {
        let tuning = Tuning::from_json(r#"{ "start_lives": 12, "max_lives": 5 }"#).unwrap();
        assert_eq!(tuning.start_lives, 5);
    }

    #[test]
    fn test_round_trip() {
        let tuning = Tuning {
            home_score: Some(280),
            ..Default::default()
        };
        let json = tuning.to_json().unwrap();
        assert_eq!(Tuning::from_json(&json).unwrap(), tuning);
    }
}
