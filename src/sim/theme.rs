//! Theme table: labels, bird variants and spawn weighting per theme and band

use serde::{Deserialize, Serialize};

use super::state::Band;

/// Theme identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ThemeKey {
    #[default]
    Forest,
    Ocean,
    Island,
    Mars,
    Mountain,
    Jungle,
    Cliff,
    City,
    Desert,
}

impl ThemeKey {
    pub const ALL: [ThemeKey; 9] = [
        ThemeKey::Forest,
        ThemeKey::Ocean,
        ThemeKey::Island,
        ThemeKey::Mars,
        ThemeKey::Mountain,
        ThemeKey::Jungle,
        ThemeKey::Cliff,
        ThemeKey::City,
        ThemeKey::Desert,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeKey::Forest => "forest",
            ThemeKey::Ocean => "ocean",
            ThemeKey::Island => "island",
            ThemeKey::Mars => "mars",
            ThemeKey::Mountain => "mountain",
            ThemeKey::Jungle => "jungle",
            ThemeKey::Cliff => "cliff",
            ThemeKey::City => "city",
            ThemeKey::Desert => "desert",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.to_lowercase();
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }

    pub fn theme(&self) -> &'static Theme {
        match self {
            ThemeKey::Forest => &FOREST,
            ThemeKey::Ocean => &OCEAN,
            ThemeKey::Island => &ISLAND,
            ThemeKey::Mars => &MARS,
            ThemeKey::Mountain => &MOUNTAIN,
            ThemeKey::Jungle => &JUNGLE,
            ThemeKey::Cliff => &CLIFF,
            ThemeKey::City => &CITY,
            ThemeKey::Desert => &DESERT,
        }
    }
}

/// Bird skins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BirdVariant {
    Crow,
    Seagull,
    Pigeon,
    Parrot,
    Drone,
    Eagle,
    Hawk,
    Bat,
}

/// Multipliers for each spawnable slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnWeights {
    pub fence: f32,
    pub dog: f32,
    pub bird: f32,
    pub yarn: f32,
    pub tunnel: f32,
    pub mouse: f32,
    pub fish: f32,
    pub catnip: f32,
}

impl SpawnWeights {
    pub const NEUTRAL: SpawnWeights = SpawnWeights::uniform(1.0);

    pub const fn uniform(w: f32) -> Self {
        Self {
            fence: w,
            dog: w,
            bird: w,
            yarn: w,
            tunnel: w,
            mouse: w,
            fish: w,
            catnip: w,
        }
    }

    /// Component-wise product
    pub fn scaled(&self, other: &SpawnWeights) -> SpawnWeights {
        SpawnWeights {
            fence: self.fence * other.fence,
            dog: self.dog * other.dog,
            bird: self.bird * other.bird,
            yarn: self.yarn * other.yarn,
            tunnel: self.tunnel * other.tunnel,
            mouse: self.mouse * other.mouse,
            fish: self.fish * other.fish,
            catnip: self.catnip * other.catnip,
        }
    }
}

/// Per-band weights a theme may override
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneWeights {
    pub ground: SpawnWeights,
    pub mid: SpawnWeights,
    pub air: SpawnWeights,
}

impl ZoneWeights {
    pub fn for_band(&self, band: Band) -> &SpawnWeights {
        match band {
            Band::Ground => &self.ground,
            Band::Mid => &self.mid,
            Band::Air => &self.air,
        }
    }
}

/// What the "dog" slot turns into under this theme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DogSlot {
    Dog,
    Car,
    Monkey,
    Goat,
    Scorpion,
}

/// Static theme description
#[derive(Debug)]
pub struct Theme {
    pub key: ThemeKey,
    pub label: &'static str,
    pub bird_variant: BirdVariant,
    pub dog_slot: DogSlot,
    pub spawns: SpawnWeights,
    pub zones: Option<ZoneWeights>,
}

impl Theme {
    /// Band weights for this theme (neutral if the theme defines none)
    pub fn zone(&self, band: Band) -> SpawnWeights {
        self.zones
            .as_ref()
            .map(|z| *z.for_band(band))
            .unwrap_or(SpawnWeights::NEUTRAL)
    }
}

const fn w(
    fence: f32,
    dog: f32,
    bird: f32,
    yarn: f32,
    mouse: f32,
    fish: f32,
    catnip: f32,
) -> SpawnWeights {
    SpawnWeights {
        fence,
        dog,
        bird,
        yarn,
        tunnel: fence,
        mouse,
        fish,
        catnip,
    }
}

static FOREST: Theme = Theme {
    key: ThemeKey::Forest,
    label: "Forest",
    bird_variant: BirdVariant::Crow,
    dog_slot: DogSlot::Dog,
    spawns: SpawnWeights::NEUTRAL,
    zones: Some(ZoneWeights {
        ground: w(1.15, 1.00, 0.75, 1.00, 1.00, 1.00, 1.00),
        mid: w(0.55, 0.25, 1.35, 0.45, 1.05, 1.05, 1.05),
        air: w(0.00, 0.00, 0.35, 0.00, 0.90, 0.90, 0.90),
    }),
};

static OCEAN: Theme = Theme {
    key: ThemeKey::Ocean,
    label: "Ocean",
    bird_variant: BirdVariant::Seagull,
    dog_slot: DogSlot::Dog,
    spawns: w(0.95, 0.80, 1.05, 0.95, 0.95, 1.20, 0.95),
    zones: Some(ZoneWeights {
        ground: w(0.95, 0.70, 0.95, 0.95, 1.05, 1.10, 1.00),
        mid: w(0.35, 0.15, 1.55, 0.35, 1.10, 1.10, 1.05),
        air: w(0.00, 0.00, 0.40, 0.00, 0.95, 0.95, 0.95),
    }),
};

static ISLAND: Theme = Theme {
    key: ThemeKey::Island,
    label: "Island",
    bird_variant: BirdVariant::Seagull,
    dog_slot: DogSlot::Dog,
    spawns: w(0.95, 0.85, 1.05, 1.00, 1.05, 1.10, 1.05),
    zones: None,
};

static MARS: Theme = Theme {
    key: ThemeKey::Mars,
    label: "Mars",
    bird_variant: BirdVariant::Drone,
    dog_slot: DogSlot::Dog,
    spawns: w(0.95, 0.00, 0.55, 1.05, 0.65, 0.55, 0.60),
    zones: None,
};

static MOUNTAIN: Theme = Theme {
    key: ThemeKey::Mountain,
    label: "Mountains",
    bird_variant: BirdVariant::Eagle,
    dog_slot: DogSlot::Goat,
    spawns: w(1.10, 0.75, 0.95, 1.05, 0.95, 1.00, 1.05),
    zones: Some(ZoneWeights {
        ground: w(1.10, 0.95, 0.85, 1.00, 1.00, 1.00, 1.00),
        mid: w(0.65, 0.25, 1.25, 0.55, 1.05, 1.05, 1.05),
        air: w(0.00, 0.00, 0.45, 0.00, 0.90, 0.90, 0.90),
    }),
};

static JUNGLE: Theme = Theme {
    key: ThemeKey::Jungle,
    label: "Jungle",
    bird_variant: BirdVariant::Parrot,
    dog_slot: DogSlot::Monkey,
    spawns: w(0.95, 1.05, 1.15, 1.05, 1.05, 0.95, 1.05),
    zones: Some(ZoneWeights {
        ground: w(1.05, 1.00, 0.85, 1.05, 1.05, 1.00, 1.10),
        mid: w(0.55, 0.25, 1.45, 0.55, 1.10, 1.05, 1.10),
        air: w(0.00, 0.00, 0.45, 0.00, 0.95, 0.95, 0.95),
    }),
};

static CLIFF: Theme = Theme {
    key: ThemeKey::Cliff,
    label: "Cliffs",
    bird_variant: BirdVariant::Eagle,
    dog_slot: DogSlot::Goat,
    spawns: w(0.90, 0.85, 1.25, 0.95, 1.05, 0.85, 0.95),
    zones: Some(ZoneWeights {
        ground: w(0.85, 0.80, 0.95, 0.95, 0.95, 0.85, 0.90),
        mid: w(0.55, 0.20, 1.70, 0.55, 1.10, 0.95, 1.00),
        air: w(0.00, 0.00, 0.75, 0.00, 1.05, 0.90, 0.95),
    }),
};

static CITY: Theme = Theme {
    key: ThemeKey::City,
    label: "City",
    bird_variant: BirdVariant::Pigeon,
    dog_slot: DogSlot::Car,
    spawns: w(1.05, 1.00, 1.10, 0.95, 1.00, 1.05, 0.95),
    zones: None,
};

static DESERT: Theme = Theme {
    key: ThemeKey::Desert,
    label: "Desert",
    bird_variant: BirdVariant::Hawk,
    dog_slot: DogSlot::Scorpion,
    spawns: w(0.90, 0.85, 1.20, 0.95, 0.95, 0.90, 1.15),
    zones: None,
};
