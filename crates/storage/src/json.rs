//! Serialized form of catalog snapshots and user state.
//!
//! Flag sets are stored as their raw bits. Unknown bits are dropped on load.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use fitnews_domain as domain;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Catalog {
    pub exercises: Vec<Exercise>,
    pub variations: Vec<Variation>,
}

impl Catalog {
    /// Join every variation with its exercise, ordered by exercise ID and variation ID.
    pub fn into_combos(self) -> Result<Vec<domain::ExerciseVariation>, CatalogError> {
        let exercises = self
            .exercises
            .into_iter()
            .map(|e| domain::Exercise::try_from(e).map(|e| (e.id, e)))
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        let mut combos = self
            .variations
            .into_iter()
            .map(|v| -> Result<_, CatalogError> {
                let variation = domain::Variation::try_from(v)?;
                let exercise = exercises
                    .get(&variation.exercise_id)
                    .ok_or(CatalogError::UnknownExercise(*variation.exercise_id))?;
                Ok(domain::ExerciseVariation::new(exercise.clone(), variation)?)
            })
            .collect::<Result<Vec<_>, CatalogError>>()?;
        combos.sort_by_key(|c| (c.exercise.id, c.variation.id));

        Ok(combos)
    }
}

impl From<&[domain::ExerciseVariation]> for Catalog {
    fn from(value: &[domain::ExerciseVariation]) -> Self {
        let exercises = value
            .iter()
            .map(|c| (c.exercise.id, &c.exercise))
            .collect::<BTreeMap<_, _>>();
        Self {
            exercises: exercises.into_values().map(Exercise::from).collect(),
            variations: value.iter().map(|c| Variation::from(&c.variation)).collect(),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum CatalogError {
    #[error("invalid name: {0}")]
    InvalidName(#[from] domain::NameError),
    #[error("invalid progression: {0}")]
    InvalidProgression(#[from] domain::ProgressionError),
    #[error("invalid progression range: {0}")]
    InvalidProgressionRange(#[from] domain::ProgressionRangeError),
    #[error("unknown exercise {0}")]
    UnknownExercise(Uuid),
    #[error(transparent)]
    ExerciseMismatch(#[from] domain::ExerciseVariationError),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Exercise {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub prerequisites: Vec<Prerequisite>,
}

impl From<&domain::Exercise> for Exercise {
    fn from(value: &domain::Exercise) -> Self {
        Self {
            id: *value.id,
            name: value.name.to_string(),
            prerequisites: value
                .prerequisites
                .iter()
                .map(|p| Prerequisite {
                    exercise_id: *p.exercise_id,
                    proficiency: p.proficiency.value(),
                })
                .collect(),
        }
    }
}

impl TryFrom<Exercise> for domain::Exercise {
    type Error = CatalogError;

    fn try_from(value: Exercise) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id.into(),
            name: domain::Name::new(&value.name)?,
            prerequisites: value
                .prerequisites
                .into_iter()
                .map(|p| -> Result<_, CatalogError> {
                    Ok(domain::Prerequisite {
                        exercise_id: p.exercise_id.into(),
                        proficiency: domain::Progression::new(p.proficiency)?,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Prerequisite {
    pub exercise_id: Uuid,
    pub proficiency: u8,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Variation {
    pub id: Uuid,
    pub exercise_id: Uuid,
    pub name: String,
    pub strengthens: u32,
    #[serde(default)]
    pub stretches: u32,
    #[serde(default)]
    pub stabilizes: u32,
    #[serde(default)]
    pub movement_pattern: u16,
    pub section: u16,
    #[serde(default)]
    pub exercise_focus: u16,
    #[serde(default)]
    pub sports_focus: u16,
    #[serde(default)]
    pub muscle_movement: u8,
    #[serde(default)]
    pub progression_min: Option<u8>,
    #[serde(default)]
    pub progression_max: Option<u8>,
    #[serde(default)]
    pub instructions: Vec<Instruction>,
}

impl From<&domain::Variation> for Variation {
    fn from(value: &domain::Variation) -> Self {
        Self {
            id: *value.id,
            exercise_id: *value.exercise_id,
            name: value.name.to_string(),
            strengthens: value.strengthens.bits(),
            stretches: value.stretches.bits(),
            stabilizes: value.stabilizes.bits(),
            movement_pattern: value.movement_pattern.bits(),
            section: value.section.bits(),
            exercise_focus: value.exercise_focus.bits(),
            sports_focus: value.sports_focus.bits(),
            muscle_movement: value.muscle_movement.bits(),
            progression_min: value.progression.min().map(domain::Progression::value),
            progression_max: value.progression.max().map(domain::Progression::value),
            instructions: value.instructions.iter().map(Instruction::from).collect(),
        }
    }
}

impl TryFrom<Variation> for domain::Variation {
    type Error = CatalogError;

    fn try_from(value: Variation) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id.into(),
            exercise_id: value.exercise_id.into(),
            name: domain::Name::new(&value.name)?,
            strengthens: domain::MuscleGroups::from_bits_truncate(value.strengthens),
            stretches: domain::MuscleGroups::from_bits_truncate(value.stretches),
            stabilizes: domain::MuscleGroups::from_bits_truncate(value.stabilizes),
            movement_pattern: domain::MovementPattern::from_bits_truncate(value.movement_pattern),
            section: domain::Section::from_bits_truncate(value.section),
            exercise_focus: domain::ExerciseFocus::from_bits_truncate(value.exercise_focus),
            sports_focus: domain::SportsFocus::from_bits_truncate(value.sports_focus),
            muscle_movement: domain::MuscleMovement::from_bits_truncate(value.muscle_movement),
            progression: domain::ProgressionRange::new(
                value
                    .progression_min
                    .map(domain::Progression::new)
                    .transpose()?,
                value
                    .progression_max
                    .map(domain::Progression::new)
                    .transpose()?,
            )?,
            instructions: value
                .instructions
                .into_iter()
                .map(domain::Instruction::try_from)
                .collect::<Result<Vec<_>, _>>()?,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub equipment: u32,
    #[serde(default)]
    pub children: Vec<Instruction>,
}

impl From<&domain::Instruction> for Instruction {
    fn from(value: &domain::Instruction) -> Self {
        Self {
            id: *value.id,
            name: value.name.to_string(),
            equipment: value.equipment.bits(),
            children: value.children.iter().map(Instruction::from).collect(),
        }
    }
}

impl TryFrom<Instruction> for domain::Instruction {
    type Error = CatalogError;

    fn try_from(value: Instruction) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id.into(),
            name: domain::Name::new(&value.name)?,
            equipment: domain::Equipment::from_bits_truncate(value.equipment),
            children: value
                .children
                .into_iter()
                .map(domain::Instruction::try_from)
                .collect::<Result<Vec<_>, _>>()?,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserState {
    pub user: User,
    #[serde(default)]
    pub exercises: Vec<UserExercise>,
    #[serde(default)]
    pub variations: Vec<UserVariation>,
    #[serde(default)]
    pub revision: u64,
}

impl From<&domain::UserState> for UserState {
    fn from(value: &domain::UserState) -> Self {
        Self {
            user: User::from(&value.user),
            exercises: value.exercises.values().map(UserExercise::from).collect(),
            variations: value.variations.values().map(UserVariation::from).collect(),
            revision: value.revision,
        }
    }
}

impl TryFrom<UserState> for domain::UserState {
    type Error = UserStateError;

    fn try_from(value: UserState) -> Result<Self, Self::Error> {
        Ok(Self {
            user: domain::User::try_from(value.user)?,
            exercises: value
                .exercises
                .into_iter()
                .map(|e| domain::UserExercise::try_from(e).map(|e| (e.exercise_id, e)))
                .collect::<Result<BTreeMap<_, _>, _>>()?,
            variations: value
                .variations
                .into_iter()
                .map(|v| {
                    let v = domain::UserVariation::from(v);
                    (v.variation_id, v)
                })
                .collect(),
            revision: value.revision,
        })
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum UserStateError {
    #[error("invalid name: {0}")]
    InvalidName(#[from] domain::NameError),
    #[error("invalid progression: {0}")]
    InvalidProgression(#[from] domain::ProgressionError),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub equipment: u32,
}

impl From<&domain::User> for User {
    fn from(value: &domain::User) -> Self {
        Self {
            id: *value.id,
            name: value.name.to_string(),
            equipment: value.equipment.bits(),
        }
    }
}

impl TryFrom<User> for domain::User {
    type Error = domain::NameError;

    fn try_from(value: User) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id.into(),
            name: domain::Name::new(&value.name)?,
            equipment: domain::Equipment::from_bits_truncate(value.equipment),
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserExercise {
    pub exercise_id: Uuid,
    pub progression: u8,
    #[serde(default)]
    pub ignore: bool,
    #[serde(default)]
    pub last_seen: Option<NaiveDate>,
}

impl From<&domain::UserExercise> for UserExercise {
    fn from(value: &domain::UserExercise) -> Self {
        Self {
            exercise_id: *value.exercise_id,
            progression: value.progression.value(),
            ignore: value.ignore,
            last_seen: value.last_seen,
        }
    }
}

impl TryFrom<UserExercise> for domain::UserExercise {
    type Error = domain::ProgressionError;

    fn try_from(value: UserExercise) -> Result<Self, Self::Error> {
        Ok(Self {
            exercise_id: value.exercise_id.into(),
            progression: domain::Progression::new(value.progression)?,
            ignore: value.ignore,
            last_seen: value.last_seen,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserVariation {
    pub variation_id: Uuid,
    #[serde(default)]
    pub ignore: bool,
    #[serde(default)]
    pub last_seen: Option<NaiveDate>,
    #[serde(default)]
    pub refresh_after: Option<NaiveDate>,
    #[serde(default)]
    pub logs: Vec<LoggedSet>,
}

impl From<&domain::UserVariation> for UserVariation {
    fn from(value: &domain::UserVariation) -> Self {
        Self {
            variation_id: *value.variation_id,
            ignore: value.ignore,
            last_seen: value.last_seen,
            refresh_after: value.refresh_after,
            logs: value.logs.iter().map(LoggedSet::from).collect(),
        }
    }
}

impl From<UserVariation> for domain::UserVariation {
    fn from(value: UserVariation) -> Self {
        Self {
            variation_id: value.variation_id.into(),
            ignore: value.ignore,
            last_seen: value.last_seen,
            refresh_after: value.refresh_after,
            logs: value.logs.into_iter().map(domain::LoggedSet::from).collect(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LoggedSet {
    pub date: NaiveDate,
    pub sets: u32,
    pub reps: u32,
    pub weight: Option<f32>,
}

impl From<&domain::LoggedSet> for LoggedSet {
    fn from(value: &domain::LoggedSet) -> Self {
        Self {
            date: value.date,
            sets: value.sets,
            reps: value.reps,
            weight: value.weight,
        }
    }
}

impl From<LoggedSet> for domain::LoggedSet {
    fn from(value: LoggedSet) -> Self {
        Self {
            date: value.date,
            sets: value.sets,
            reps: value.reps,
            weight: value.weight,
        }
    }
}
