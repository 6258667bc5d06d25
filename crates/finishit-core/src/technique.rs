//! Breathing technique tags.
//!
//! A task may carry one technique. The tag only partitions mastery
//! statistics and drives display; the lifecycle engine never looks at it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreathingTechnique {
    Water,
    Flame,
    Thunder,
    Insect,
    Stone,
    Wind,
    Mist,
    Serpent,
    Flower,
    Sound,
    Love,
    Sun,
}

/// Guided breathing rhythm in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BreathingCadence {
    pub inhale: u8,
    pub hold: u8,
    pub exhale: u8,
}

impl BreathingCadence {
    pub fn cycle_secs(&self) -> u32 {
        u32::from(self.inhale) + u32::from(self.hold) + u32::from(self.exhale)
    }
}

struct TechniqueEntry {
    key: &'static str,
    name: &'static str,
    kanji: &'static str,
    description: &'static str,
    cadence: BreathingCadence,
}

const fn cadence(inhale: u8, hold: u8, exhale: u8) -> BreathingCadence {
    BreathingCadence {
        inhale,
        hold,
        exhale,
    }
}

// Indexed by discriminant; keep in enum order.
const TABLE: [TechniqueEntry; 12] = [
    TechniqueEntry {
        key: "water",
        name: "Water Breathing",
        kanji: "水",
        description: "Fluid and adaptable, like flowing water that shapes itself to any container",
        cadence: cadence(4, 2, 6),
    },
    TechniqueEntry {
        key: "flame",
        name: "Flame Breathing",
        kanji: "炎",
        description: "Passionate and intense, burning away obstacles with unwavering determination",
        cadence: cadence(3, 1, 4),
    },
    TechniqueEntry {
        key: "thunder",
        name: "Thunder Breathing",
        kanji: "雷",
        description: "Swift and decisive, striking with the speed and power of lightning",
        cadence: cadence(2, 1, 3),
    },
    TechniqueEntry {
        key: "insect",
        name: "Insect Breathing",
        kanji: "蟲",
        description: "Graceful and precise, dancing through challenges like a butterfly",
        cadence: cadence(3, 2, 5),
    },
    TechniqueEntry {
        key: "stone",
        name: "Stone Breathing",
        kanji: "岩",
        description: "Steadfast and unbreakable, enduring like the eternal mountains",
        cadence: cadence(6, 4, 8),
    },
    TechniqueEntry {
        key: "wind",
        name: "Wind Breathing",
        kanji: "風",
        description: "Free and untamed, cutting through obstacles like a fierce gale",
        cadence: cadence(4, 1, 5),
    },
    TechniqueEntry {
        key: "mist",
        name: "Mist Breathing",
        kanji: "霞",
        description: "Elusive and mysterious, obscuring truth like morning fog",
        cadence: cadence(5, 3, 7),
    },
    TechniqueEntry {
        key: "serpent",
        name: "Serpent Breathing",
        kanji: "蛇",
        description: "Flexible and cunning, striking with the precision of a viper",
        cadence: cadence(4, 3, 6),
    },
    TechniqueEntry {
        key: "flower",
        name: "Flower Breathing",
        kanji: "花",
        description: "Beautiful and graceful, blooming with elegant strength",
        cadence: cadence(4, 2, 6),
    },
    TechniqueEntry {
        key: "sound",
        name: "Sound Breathing",
        kanji: "音",
        description: "Explosive and rhythmic, resonating with thunderous power",
        cadence: cadence(3, 1, 4),
    },
    TechniqueEntry {
        key: "love",
        name: "Love Breathing",
        kanji: "恋",
        description: "Passionate and flexible, bending without breaking like the heart",
        cadence: cadence(4, 2, 6),
    },
    TechniqueEntry {
        key: "sun",
        name: "Sun Breathing",
        kanji: "日",
        description: "The original and most powerful, burning with the intensity of the sun",
        cadence: cadence(4, 4, 8),
    },
];

impl BreathingTechnique {
    pub const ALL: [BreathingTechnique; 12] = [
        Self::Water,
        Self::Flame,
        Self::Thunder,
        Self::Insect,
        Self::Stone,
        Self::Wind,
        Self::Mist,
        Self::Serpent,
        Self::Flower,
        Self::Sound,
        Self::Love,
        Self::Sun,
    ];

    fn entry(self) -> &'static TechniqueEntry {
        &TABLE[self as usize]
    }

    pub fn key(self) -> &'static str {
        self.entry().key
    }

    pub fn name(self) -> &'static str {
        self.entry().name
    }

    pub fn kanji(self) -> &'static str {
        self.entry().kanji
    }

    pub fn description(self) -> &'static str {
        self.entry().description
    }

    pub fn cadence(self) -> BreathingCadence {
        self.entry().cadence
    }
}

impl fmt::Display for BreathingTechnique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for BreathingTechnique {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.key() == needle)
            .ok_or_else(|| format!("unknown technique: {s}"))
    }
}
