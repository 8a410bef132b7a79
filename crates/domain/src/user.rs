use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};

use crate::{
    Equipment, ExerciseID, MuscleGroups, Name, Progression, QueryResult, ReadError, UpdateError,
    Variation, VariationID,
};

pub trait UserStateService: Send + Sync + 'static {
    fn get_user_state(&self, id: UserID) -> Result<UserState, ReadError>;
    /// Store that the results were sent to the user on `today`.
    fn record_seen(
        &self,
        id: UserID,
        results: &[QueryResult],
        today: NaiveDate,
    ) -> Result<UserState, UpdateError>;
}

pub trait UserStateRepository: Send + Sync + 'static {
    fn read_user_state(&self, id: UserID) -> Result<UserState, ReadError>;
    /// Store `state` if it is based on the stored revision and return it with the next one.
    ///
    /// Fails with [`UpdateError::Conflict`] if the state was replaced since it was read.
    fn replace_user_state(&self, state: UserState) -> Result<UserState, UpdateError>;
}

entity_id!(UserID);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserID,
    pub name: Name,
    pub equipment: Equipment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserExercise {
    pub exercise_id: ExerciseID,
    pub progression: Progression,
    pub ignore: bool,
    pub last_seen: Option<NaiveDate>,
}

impl UserExercise {
    #[must_use]
    pub fn new(exercise_id: ExerciseID) -> Self {
        Self {
            exercise_id,
            progression: Progression::DEFAULT,
            ignore: false,
            last_seen: None,
        }
    }

    pub fn advance_progression(&mut self, step: u8) {
        self.progression = self.progression.saturating_add(step);
    }

    pub fn regress_progression(&mut self, step: u8) {
        self.progression = self.progression.saturating_sub(step);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserVariation {
    pub variation_id: VariationID,
    pub ignore: bool,
    pub last_seen: Option<NaiveDate>,
    /// The variation is repeated in every newsletter until this date has passed.
    pub refresh_after: Option<NaiveDate>,
    pub logs: Vec<LoggedSet>,
}

impl UserVariation {
    #[must_use]
    pub fn new(variation_id: VariationID) -> Self {
        Self {
            variation_id,
            ignore: false,
            last_seen: None,
            refresh_after: None,
            logs: vec![],
        }
    }

    #[must_use]
    pub fn is_pinned(&self, today: NaiveDate) -> bool {
        self.refresh_after.is_some_and(|date| date > today)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggedSet {
    pub date: NaiveDate,
    pub sets: u32,
    pub reps: u32,
    pub weight: Option<f32>,
}

impl LoggedSet {
    #[must_use]
    pub fn volume(&self) -> u32 {
        self.sets.saturating_mul(self.reps)
    }
}

/// Volume a user performed on a day, tagged with the muscles it worked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkedVolume {
    pub date: NaiveDate,
    pub primary: MuscleGroups,
    pub secondary: MuscleGroups,
    pub volume: u32,
}

impl WorkedVolume {
    #[must_use]
    pub fn new(variation: &Variation, log: &LoggedSet) -> Self {
        Self {
            date: log.date,
            primary: variation.strengthens,
            secondary: variation.stabilizes.difference(variation.strengthens),
            volume: log.volume(),
        }
    }
}

/// Snapshot of everything the query pipeline needs to know about a user.
#[derive(Debug, Clone, PartialEq)]
pub struct UserState {
    pub user: User,
    pub exercises: BTreeMap<ExerciseID, UserExercise>,
    pub variations: BTreeMap<VariationID, UserVariation>,
    /// Number of times the state has been replaced in storage.
    pub revision: u64,
}

impl UserState {
    #[must_use]
    pub fn new(user: User) -> Self {
        Self {
            user,
            exercises: BTreeMap::new(),
            variations: BTreeMap::new(),
            revision: 0,
        }
    }

    /// Current progression in an exercise, using the default for exercises never seen.
    #[must_use]
    pub fn progression(&self, exercise_id: ExerciseID) -> Progression {
        self.exercises
            .get(&exercise_id)
            .map_or(Progression::DEFAULT, |e| e.progression)
    }

    #[must_use]
    pub fn is_ignored(&self, exercise_id: ExerciseID, variation_id: VariationID) -> bool {
        self.exercises.get(&exercise_id).is_some_and(|e| e.ignore)
            || self.variations.get(&variation_id).is_some_and(|v| v.ignore)
    }

    /// Logged history joined with the muscles of the logged variations.
    #[must_use]
    pub fn worked_volume<'a>(
        &self,
        variations: impl IntoIterator<Item = &'a Variation>,
    ) -> Vec<WorkedVolume> {
        variations
            .into_iter()
            .filter_map(|variation| {
                self.variations
                    .get(&variation.id)
                    .map(|user_variation| (variation, user_variation))
            })
            .flat_map(|(variation, user_variation)| {
                user_variation
                    .logs
                    .iter()
                    .map(move |log| WorkedVolume::new(variation, log))
            })
            .collect()
    }

    /// Record that the results were sent to the user.
    ///
    /// A new refresh period of `refresh_days` starts for every variation whose previous period
    /// has ended, so pinned variations keep their original refresh date.
    pub fn mark_seen(&mut self, results: &[QueryResult], today: NaiveDate, refresh_days: u64) {
        for result in results {
            let user_exercise = self
                .exercises
                .entry(result.exercise.id)
                .or_insert_with(|| UserExercise::new(result.exercise.id));
            user_exercise.last_seen = Some(today);

            let user_variation = self
                .variations
                .entry(result.variation.id)
                .or_insert_with(|| UserVariation::new(result.variation.id));
            user_variation.last_seen = Some(today);
            if !user_variation.is_pinned(today) {
                user_variation.refresh_after = today.checked_add_days(Days::new(refresh_days));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use crate::{
        Exercise, ExerciseFocus, MovementPattern, MuscleMovement, ProgressionRange, Section,
        SportsFocus,
    };

    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn user_state() -> UserState {
        UserState::new(User {
            id: 1.into(),
            name: Name::new("Alice").unwrap(),
            equipment: Equipment::DUMBBELL,
        })
    }

    fn variation(id: u128) -> Variation {
        Variation {
            id: id.into(),
            exercise_id: 1.into(),
            name: Name::new("Goblet Squat").unwrap(),
            strengthens: MuscleGroups::QUADRICEPS | MuscleGroups::GLUTES,
            stretches: MuscleGroups::NONE,
            stabilizes: MuscleGroups::GLUTES | MuscleGroups::ABS,
            movement_pattern: MovementPattern::SQUAT,
            section: Section::MAIN,
            exercise_focus: ExerciseFocus::STRENGTH,
            sports_focus: SportsFocus::NONE,
            muscle_movement: MuscleMovement::ISOTONIC,
            progression: ProgressionRange::default(),
            instructions: vec![],
        }
    }

    fn result(exercise_id: u128, variation_id: u128) -> QueryResult {
        QueryResult {
            section: Section::MAIN,
            exercise: Exercise {
                id: exercise_id.into(),
                name: Name::new("Squat").unwrap(),
                prerequisites: vec![],
            },
            variation: Variation {
                exercise_id: exercise_id.into(),
                ..variation(variation_id)
            },
            user_exercise: None,
            user_variation: None,
            prerequisites: vec![],
            easier_variation: None,
            harder_variation: None,
            instructions: vec![],
        }
    }

    #[test]
    fn test_user_exercise_progression() {
        let mut user_exercise = UserExercise::new(1.into());

        user_exercise.advance_progression(10);
        assert_eq!(user_exercise.progression, Progression::new(60).unwrap());

        user_exercise.regress_progression(70);
        assert_eq!(user_exercise.progression, Progression::MIN);
    }

    #[rstest]
    #[case(None, false)]
    #[case(Some(date(9)), false)]
    #[case(Some(date(10)), false)]
    #[case(Some(date(11)), true)]
    fn test_user_variation_is_pinned(
        #[case] refresh_after: Option<NaiveDate>,
        #[case] expected: bool,
    ) {
        let user_variation = UserVariation {
            refresh_after,
            ..UserVariation::new(1.into())
        };
        assert_eq!(user_variation.is_pinned(date(10)), expected);
    }

    #[test]
    fn test_user_state_progression() {
        let mut state = user_state();
        state.exercises.insert(
            1.into(),
            UserExercise {
                progression: Progression::new(70).unwrap(),
                ..UserExercise::new(1.into())
            },
        );

        assert_eq!(state.progression(1.into()), Progression::new(70).unwrap());
        assert_eq!(state.progression(2.into()), Progression::DEFAULT);
    }

    #[test]
    fn test_user_state_is_ignored() {
        let mut state = user_state();
        state.variations.insert(
            2.into(),
            UserVariation {
                ignore: true,
                ..UserVariation::new(2.into())
            },
        );

        assert!(!state.is_ignored(1.into(), 1.into()));
        assert!(state.is_ignored(1.into(), 2.into()));
    }

    #[test]
    fn test_user_state_worked_volume() {
        let mut state = user_state();
        state.variations.insert(
            1.into(),
            UserVariation {
                logs: vec![LoggedSet {
                    date: date(1),
                    sets: 3,
                    reps: 10,
                    weight: Some(16.0),
                }],
                ..UserVariation::new(1.into())
            },
        );
        let variations = [variation(1), variation(2)];

        assert_eq!(
            state.worked_volume(&variations),
            vec![WorkedVolume {
                date: date(1),
                primary: MuscleGroups::QUADRICEPS | MuscleGroups::GLUTES,
                secondary: MuscleGroups::ABS,
                volume: 30,
            }]
        );
    }

    #[test]
    fn test_user_state_mark_seen() {
        let mut state = user_state();
        state.variations.insert(
            2.into(),
            UserVariation {
                refresh_after: Some(date(20)),
                ..UserVariation::new(2.into())
            },
        );

        state.mark_seen(&[result(1, 1), result(1, 2)], date(10), 7);

        assert_eq!(state.exercises[&ExerciseID::from(1)].last_seen, Some(date(10)));
        assert_eq!(state.variations[&VariationID::from(1)].last_seen, Some(date(10)));
        assert_eq!(state.variations[&VariationID::from(1)].refresh_after, Some(date(17)));
        assert_eq!(state.variations[&VariationID::from(2)].last_seen, Some(date(10)));
        assert_eq!(state.variations[&VariationID::from(2)].refresh_after, Some(date(20)));
    }
}
