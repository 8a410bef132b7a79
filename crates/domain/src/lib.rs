#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

macro_rules! entity_id {
    ($name: ident) => {
        #[derive(
            derive_more::Deref, Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord,
        )]
        pub struct $name(uuid::Uuid);

        impl $name {
            #[must_use]
            pub fn nil() -> Self {
                Self(uuid::Uuid::nil())
            }

            #[must_use]
            pub fn is_nil(&self) -> bool {
                self.0.is_nil()
            }
        }

        impl From<uuid::Uuid> for $name {
            fn from(value: uuid::Uuid) -> Self {
                Self(value)
            }
        }

        impl From<u128> for $name {
            fn from(value: u128) -> Self {
                Self(uuid::Uuid::from_bytes(value.to_be_bytes()))
            }
        }
    };
}

mod error;
mod exercise;
pub mod filter;
mod flags;
mod muscle_targets;
mod name;
mod query;
pub mod selection;
mod service;
mod settings;
mod user;

pub use error::{QueryError, ReadError, StorageError, UpdateError};
pub use exercise::{
    CatalogRepository, Exercise, ExerciseID, ExerciseVariation, ExerciseVariationError,
    Instruction, InstructionID, MuscleSelector, Prerequisite, Progression, ProgressionError,
    ProgressionRange, ProgressionRangeError, Variation, VariationID,
};
pub use flags::{
    Equipment, ExerciseFocus, Flags, MovementPattern, MuscleGroups, MuscleMovement, Section,
    SportsFocus,
};
pub use muscle_targets::{MuscleTargets, MuscleTargetsBuilder};
pub use name::{Name, NameError};
pub use query::{
    FlagFilter, MuscleFilter, Query, QueryBuilder, QueryResult, SelectionService, UserOptions,
};
pub use service::Service;
pub use settings::{
    RankingPrecedence, SelectionSettings, SettingsRepository, SettingsService, UniqueMuscles,
};
pub use user::{
    LoggedSet, User, UserExercise, UserID, UserState, UserStateRepository, UserStateService,
    UserVariation, WorkedVolume,
};
