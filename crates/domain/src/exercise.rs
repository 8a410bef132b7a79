use crate::{
    Equipment, ExerciseFocus, MovementPattern, MuscleGroups, MuscleMovement, Name, ReadError,
    Section, SportsFocus,
};

/// Read access to the exercise catalog.
///
/// Implementations may pre-filter by section to bound the amount of data handed to the
/// in-memory query pipeline. The returned combos must be ordered by exercise ID and variation
/// ID, as this order is the final tie-break of the ranking.
pub trait CatalogRepository: Send + Sync + 'static {
    fn read_catalog(&self, section: Option<Section>) -> Result<Vec<ExerciseVariation>, ReadError>;
}

entity_id!(ExerciseID);
entity_id!(VariationID);
entity_id!(InstructionID);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exercise {
    pub id: ExerciseID,
    pub name: Name,
    pub prerequisites: Vec<Prerequisite>,
}

/// Proficiency the user must have reached in another exercise before this one is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prerequisite {
    pub exercise_id: ExerciseID,
    pub proficiency: Progression,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variation {
    pub id: VariationID,
    pub exercise_id: ExerciseID,
    pub name: Name,
    pub strengthens: MuscleGroups,
    pub stretches: MuscleGroups,
    pub stabilizes: MuscleGroups,
    pub movement_pattern: MovementPattern,
    pub section: Section,
    pub exercise_focus: ExerciseFocus,
    pub sports_focus: SportsFocus,
    pub muscle_movement: MuscleMovement,
    pub progression: ProgressionRange,
    pub instructions: Vec<Instruction>,
}

/// Selects a set of muscles from a variation.
pub type MuscleSelector = fn(&Variation) -> MuscleGroups;

impl Variation {
    #[must_use]
    pub fn strengthened_muscles(&self) -> MuscleGroups {
        self.strengthens
    }

    #[must_use]
    pub fn stretched_muscles(&self) -> MuscleGroups {
        self.stretches
    }

    #[must_use]
    pub fn stabilized_muscles(&self) -> MuscleGroups {
        self.stabilizes
    }

    #[must_use]
    pub fn worked_muscles(&self) -> MuscleGroups {
        self.strengthens | self.stretches | self.stabilizes
    }

    /// Union of the equipment required by the top-level instructions.
    #[must_use]
    pub fn equipment(&self) -> Equipment {
        self.instructions.iter().map(|i| i.equipment).collect()
    }

    /// Instructions which can be followed with the given equipment.
    #[must_use]
    pub fn instructions_for(&self, equipment: Equipment) -> Vec<Instruction> {
        self.instructions
            .iter()
            .filter_map(|i| i.for_equipment(equipment))
            .collect()
    }
}

/// Equipment-specific guidance. Children refine their parent for additional equipment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub id: InstructionID,
    pub name: Name,
    pub equipment: Equipment,
    pub children: Vec<Instruction>,
}

impl Instruction {
    /// Prune the instruction tree to the branches usable with `equipment`.
    #[must_use]
    pub fn for_equipment(&self, equipment: Equipment) -> Option<Instruction> {
        if !equipment.has_all(self.equipment) {
            return None;
        }

        Some(Instruction {
            id: self.id,
            name: self.name.clone(),
            equipment: self.equipment,
            children: self
                .children
                .iter()
                .filter_map(|c| c.for_equipment(equipment))
                .collect(),
        })
    }
}

/// Joined exercise and variation flowing through the query pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExerciseVariation {
    pub exercise: Exercise,
    pub variation: Variation,
}

impl ExerciseVariation {
    pub fn new(exercise: Exercise, variation: Variation) -> Result<Self, ExerciseVariationError> {
        if exercise.id != variation.exercise_id {
            return Err(ExerciseVariationError::ExerciseMismatch);
        }

        Ok(Self {
            exercise,
            variation,
        })
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ExerciseVariationError {
    #[error("Variation belongs to a different exercise")]
    ExerciseMismatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Progression(u8);

impl Progression {
    pub const MIN: Progression = Progression(0);
    pub const DEFAULT: Progression = Progression(50);
    pub const MAX: Progression = Progression(100);

    pub fn new(value: u8) -> Result<Self, ProgressionError> {
        if value > Self::MAX.0 {
            return Err(ProgressionError::OutOfRange(value));
        }

        Ok(Self(value))
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn saturating_add(self, step: u8) -> Self {
        Self(self.0.saturating_add(step).min(Self::MAX.0))
    }

    #[must_use]
    pub fn saturating_sub(self, step: u8) -> Self {
        Self(self.0.saturating_sub(step))
    }
}

impl Default for Progression {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ProgressionError {
    #[error("Progression must be 100 or less ({0} > 100)")]
    OutOfRange(u8),
}

/// Half-open range of progression levels for which a variation is shown.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProgressionRange {
    min: Option<Progression>,
    max: Option<Progression>,
}

impl ProgressionRange {
    pub fn new(
        min: Option<Progression>,
        max: Option<Progression>,
    ) -> Result<Self, ProgressionRangeError> {
        if let (Some(min), Some(max)) = (min, max) {
            if min >= max {
                return Err(ProgressionRangeError::Empty(min.0, max.0));
            }
        }

        Ok(Self { min, max })
    }

    #[must_use]
    pub fn min(&self) -> Option<Progression> {
        self.min
    }

    #[must_use]
    pub fn max(&self) -> Option<Progression> {
        self.max
    }

    #[must_use]
    pub fn contains(&self, progression: Progression) -> bool {
        self.min.is_none_or(|min| min <= progression)
            && self.max.is_none_or(|max| progression < max)
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ProgressionRangeError {
    #[error("Progression range must not be empty ({0} >= {1})")]
    Empty(u8, u8),
}
