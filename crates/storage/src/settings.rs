use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use fitnews_domain as domain;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Selection settings stored as a JSON file.
///
/// A missing file yields the default settings. Fields missing from the file take their
/// default values.
pub struct FileSettings {
    path: PathBuf,
}

impl FileSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_settings(
        &self,
        settings: &domain::SelectionSettings,
    ) -> Result<(), domain::StorageError> {
        let json = serde_json::to_string_pretty(&Settings::from(settings))
            .map_err(|err| domain::StorageError::Other(Box::new(err)))?;
        fs::write(&self.path, json).map_err(|err| domain::StorageError::Other(Box::new(err)))
    }
}

impl domain::SettingsRepository for FileSettings {
    fn read_settings(&self) -> Result<domain::SelectionSettings, domain::ReadError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(
                    "settings file {} not found, using defaults",
                    self.path.display()
                );
                return Ok(domain::SelectionSettings::default());
            }
            Err(err) => return Err(domain::StorageError::Other(Box::new(err)).into()),
        };
        let settings = serde_json::from_str::<Settings>(&content).map_err(|err| {
            warn!("invalid settings file {}: {err}", self.path.display());
            domain::ReadError::Other(Box::new(err))
        })?;
        domain::SelectionSettings::try_from(settings).map_err(|err| {
            warn!("invalid settings file {}: {err}", self.path.display());
            domain::ReadError::Other(Box::new(err))
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub base_volume: u32,
    pub exercise_volume: u32,
    pub secondary_divisor: u32,
    pub core_weight_percent: u32,
    pub history_days: u32,
    pub refresh_days: u32,
    pub unique_muscles: UniqueMuscles,
    /// Name of a [`domain::RankingPrecedence`] variant, e.g. `deficit_first`.
    pub precedence: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from(&domain::SelectionSettings::default())
    }
}

impl From<&domain::SelectionSettings> for Settings {
    fn from(value: &domain::SelectionSettings) -> Self {
        Self {
            base_volume: value.base_volume,
            exercise_volume: value.exercise_volume,
            secondary_divisor: value.secondary_divisor,
            core_weight_percent: value.core_weight_percent,
            history_days: value.history_days,
            refresh_days: value.refresh_days,
            unique_muscles: value.unique_muscles.into(),
            precedence: value.precedence.to_string(),
        }
    }
}

impl TryFrom<Settings> for domain::SelectionSettings {
    type Error = strum::ParseError;

    fn try_from(value: Settings) -> Result<Self, Self::Error> {
        Ok(Self {
            base_volume: value.base_volume,
            exercise_volume: value.exercise_volume,
            secondary_divisor: value.secondary_divisor,
            core_weight_percent: value.core_weight_percent,
            history_days: value.history_days,
            refresh_days: value.refresh_days,
            unique_muscles: value.unique_muscles.into(),
            precedence: value.precedence.parse()?,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct UniqueMuscles {
    pub mobility: u32,
    pub accessory: u32,
    pub flexibility: u32,
    pub other: u32,
}

impl Default for UniqueMuscles {
    fn default() -> Self {
        domain::UniqueMuscles::default().into()
    }
}

impl From<domain::UniqueMuscles> for UniqueMuscles {
    fn from(value: domain::UniqueMuscles) -> Self {
        Self {
            mobility: value.mobility,
            accessory: value.accessory,
            flexibility: value.flexibility,
            other: value.other,
        }
    }
}

impl From<UniqueMuscles> for domain::UniqueMuscles {
    fn from(value: UniqueMuscles) -> Self {
        Self {
            mobility: value.mobility,
            accessory: value.accessory,
            flexibility: value.flexibility,
            other: value.other,
        }
    }
}
