use strum::{Display, EnumString};

use crate::{ReadError, Section};

pub trait SettingsService: Send + Sync + 'static {
    fn get_settings(&self) -> Result<SelectionSettings, ReadError>;
}

pub trait SettingsRepository: Send + Sync + 'static {
    fn read_settings(&self) -> Result<SelectionSettings, ReadError>;
}

/// Tunables of muscle targeting and selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionSettings {
    /// Weekly volume (sets x reps) each muscle group should receive.
    pub base_volume: u32,
    /// Volume credited to a muscle group for every selected exercise that strengthens it.
    pub exercise_volume: u32,
    /// Secondary involvement of a muscle counts as its volume divided by this value.
    pub secondary_divisor: u32,
    /// Share of the target kept for core muscles when the core adjustment is applied.
    pub core_weight_percent: u32,
    /// Logged volume older than this is not credited.
    pub history_days: u32,
    /// Length of the period in which a sent variation is repeated.
    pub refresh_days: u32,
    pub unique_muscles: UniqueMuscles,
    pub precedence: RankingPrecedence,
}

impl Default for SelectionSettings {
    fn default() -> Self {
        Self {
            base_volume: 100,
            exercise_volume: 30,
            secondary_divisor: 2,
            core_weight_percent: 50,
            history_days: 7,
            refresh_days: 7,
            unique_muscles: UniqueMuscles::default(),
            precedence: RankingPrecedence::default(),
        }
    }
}

/// Minimum number of still-unworked muscles a selected exercise must target at first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniqueMuscles {
    pub mobility: u32,
    pub accessory: u32,
    pub flexibility: u32,
    pub other: u32,
}

impl UniqueMuscles {
    #[must_use]
    pub fn for_section(&self, section: Option<Section>) -> u32 {
        let threshold = match section {
            Some(s) if s.has_any(Section::WARMUP_ANY | Section::MOBILITY) => self.mobility,
            Some(s) if s.has_any(Section::COOLDOWN_ANY | Section::FLEXIBILITY) => {
                self.flexibility
            }
            Some(s) if s.has_any(Section::ACCESSORY | Section::CORE | Section::PREHAB) => {
                self.accessory
            }
            _ => self.other,
        };
        threshold.max(1)
    }
}

impl Default for UniqueMuscles {
    fn default() -> Self {
        Self {
            mobility: 3,
            accessory: 2,
            flexibility: 3,
            other: 1,
        }
    }
}

/// Which criterion decides first when candidates compete for a slot.
#[derive(Debug, Default, Display, EnumString, Clone, Copy, PartialEq, Eq)]
#[strum(serialize_all = "snake_case")]
pub enum RankingPrecedence {
    /// Variations matching the user's progression win over larger muscle deficits.
    #[default]
    ProgressionFirst,
    /// Larger muscle deficits win over progression eligibility.
    DeficitFirst,
}
