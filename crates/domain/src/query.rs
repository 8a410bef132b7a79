use std::collections::BTreeSet;

use chrono::{Local, NaiveDate};
use log::debug;

use crate::{
    CatalogRepository, Equipment, Exercise, ExerciseFocus, ExerciseID, ExerciseVariation,
    Instruction, MovementPattern, MuscleGroups, MuscleMovement, MuscleSelector, MuscleTargets,
    Name, QueryError, Section, SelectionSettings, SportsFocus, UserExercise, UserState,
    UserVariation, Variation, VariationID,
    filter::{
        filter_equipment, filter_exercise_focus, filter_movement_pattern, filter_muscle_group,
        filter_muscle_movement, filter_section, filter_sports_focus,
    },
    selection::{Candidate, Freshness, Selection},
};

pub trait SelectionService {
    fn select(&self, query: &Query<'_>) -> Result<Vec<QueryResult>, QueryError>;
}

/// Which of the user's restrictions a query disregards.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct UserOptions {
    pub ignore_progressions: bool,
    pub ignore_prerequisites: bool,
    /// Show exercises and variations the user chose to ignore.
    pub ignore_ignored: bool,
    pub ignore_missing_equipment: bool,
    /// Return at most one variation per exercise.
    pub unique_exercises: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagFilter<F> {
    pub value: F,
    pub include: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct MuscleFilter {
    pub muscles: MuscleGroups,
    pub selector: MuscleSelector,
    pub include: bool,
}

/// Accumulates the configuration of a query.
///
/// Every option may be set once. Setting an option again is recorded and reported by
/// [`QueryBuilder::build`] instead of silently overwriting the first value.
#[derive(Default)]
pub struct QueryBuilder<'a> {
    section: Option<Section>,
    exercise_focus: Option<FlagFilter<ExerciseFocus>>,
    sports_focus: Option<FlagFilter<SportsFocus>>,
    movement_pattern: Option<FlagFilter<MovementPattern>>,
    muscle_movement: Option<FlagFilter<MuscleMovement>>,
    muscle_groups: Option<MuscleFilter>,
    equipment: Option<Equipment>,
    user: Option<(&'a UserState, UserOptions)>,
    variations: Option<BTreeSet<VariationID>>,
    exclude_exercises: Option<BTreeSet<ExerciseID>>,
    muscle_targets: Option<MuscleTargets>,
    take: Option<usize>,
    date: Option<NaiveDate>,
    settings: Option<SelectionSettings>,
    duplicate: Option<&'static str>,
}

fn set_once<T>(
    slot: &mut Option<T>,
    value: T,
    option: &'static str,
    duplicate: &mut Option<&'static str>,
) {
    if slot.is_some() {
        duplicate.get_or_insert(option);
    } else {
        *slot = Some(value);
    }
}

impl<'a> QueryBuilder<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_section(mut self, section: Section) -> Self {
        set_once(&mut self.section, section, "section", &mut self.duplicate);
        self
    }

    #[must_use]
    pub fn with_exercise_focus(mut self, value: ExerciseFocus, include: bool) -> Self {
        set_once(
            &mut self.exercise_focus,
            FlagFilter { value, include },
            "exercise focus",
            &mut self.duplicate,
        );
        self
    }

    #[must_use]
    pub fn with_sports_focus(mut self, value: SportsFocus, include: bool) -> Self {
        set_once(
            &mut self.sports_focus,
            FlagFilter { value, include },
            "sports focus",
            &mut self.duplicate,
        );
        self
    }

    #[must_use]
    pub fn with_movement_pattern(mut self, value: MovementPattern, include: bool) -> Self {
        set_once(
            &mut self.movement_pattern,
            FlagFilter { value, include },
            "movement pattern",
            &mut self.duplicate,
        );
        self
    }

    #[must_use]
    pub fn with_muscle_movement(mut self, value: MuscleMovement, include: bool) -> Self {
        set_once(
            &mut self.muscle_movement,
            FlagFilter { value, include },
            "muscle movement",
            &mut self.duplicate,
        );
        self
    }

    /// Filter by muscles, which also become the muscles ranked against the targets.
    #[must_use]
    pub fn with_muscle_groups(
        mut self,
        muscles: MuscleGroups,
        selector: MuscleSelector,
        include: bool,
    ) -> Self {
        set_once(
            &mut self.muscle_groups,
            MuscleFilter {
                muscles,
                selector,
                include,
            },
            "muscle groups",
            &mut self.duplicate,
        );
        self
    }

    /// Only keep variations which can be performed with the given equipment.
    #[must_use]
    pub fn with_equipment(mut self, equipment: Equipment) -> Self {
        set_once(
            &mut self.equipment,
            equipment,
            "equipment",
            &mut self.duplicate,
        );
        self
    }

    #[must_use]
    pub fn with_user(mut self, state: &'a UserState, options: UserOptions) -> Self {
        set_once(&mut self.user, (state, options), "user", &mut self.duplicate);
        self
    }

    /// Restrict the result to the given variations.
    #[must_use]
    pub fn with_variations(mut self, ids: impl IntoIterator<Item = VariationID>) -> Self {
        set_once(
            &mut self.variations,
            ids.into_iter().collect(),
            "variations",
            &mut self.duplicate,
        );
        self
    }

    #[must_use]
    pub fn with_exclude_exercises(mut self, ids: impl IntoIterator<Item = ExerciseID>) -> Self {
        set_once(
            &mut self.exclude_exercises,
            ids.into_iter().collect(),
            "excluded exercises",
            &mut self.duplicate,
        );
        self
    }

    #[must_use]
    pub fn with_muscle_targets(mut self, targets: MuscleTargets) -> Self {
        set_once(
            &mut self.muscle_targets,
            targets,
            "muscle targets",
            &mut self.duplicate,
        );
        self
    }

    #[must_use]
    pub fn with_take(mut self, take: usize) -> Self {
        set_once(&mut self.take, take, "take", &mut self.duplicate);
        self
    }

    /// Date used to evaluate refresh periods. Defaults to today.
    #[must_use]
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        set_once(&mut self.date, date, "date", &mut self.duplicate);
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: SelectionSettings) -> Self {
        set_once(&mut self.settings, settings, "settings", &mut self.duplicate);
        self
    }

    pub fn build(self) -> Result<Query<'a>, QueryError> {
        if let Some(option) = self.duplicate {
            return Err(QueryError::AlreadyConfigured(option));
        }

        Ok(Query {
            section: self.section,
            exercise_focus: self.exercise_focus,
            sports_focus: self.sports_focus,
            movement_pattern: self.movement_pattern,
            muscle_movement: self.muscle_movement,
            muscle_groups: self.muscle_groups,
            equipment: self.equipment,
            user: self.user,
            variations: self.variations,
            exclude_exercises: self.exclude_exercises.unwrap_or_default(),
            muscle_targets: self.muscle_targets,
            take: self.take,
            date: self.date.unwrap_or_else(|| Local::now().date_naive()),
            settings: self.settings.unwrap_or_default(),
        })
    }
}

/// A validated query, ready to be run against the catalog.
#[derive(Debug, Clone)]
pub struct Query<'a> {
    section: Option<Section>,
    exercise_focus: Option<FlagFilter<ExerciseFocus>>,
    sports_focus: Option<FlagFilter<SportsFocus>>,
    movement_pattern: Option<FlagFilter<MovementPattern>>,
    muscle_movement: Option<FlagFilter<MuscleMovement>>,
    muscle_groups: Option<MuscleFilter>,
    equipment: Option<Equipment>,
    user: Option<(&'a UserState, UserOptions)>,
    variations: Option<BTreeSet<VariationID>>,
    exclude_exercises: BTreeSet<ExerciseID>,
    muscle_targets: Option<MuscleTargets>,
    take: Option<usize>,
    date: NaiveDate,
    settings: SelectionSettings,
}

impl Query<'_> {
    #[must_use]
    pub fn section(&self) -> Option<Section> {
        self.section
    }

    /// Fetch the section's catalog from storage and apply the query to it.
    ///
    /// Prerequisites and neighbouring variations may belong to other sections, so they are
    /// resolved against the whole catalog.
    pub fn run(&self, repository: &impl CatalogRepository) -> Result<Vec<QueryResult>, QueryError> {
        let section = self.section.filter(|s| !s.is_empty());
        let combos = repository.read_catalog(section)?;
        if section.is_none() {
            return Ok(self.apply(&combos));
        }
        let catalog = repository.read_catalog(None)?;
        Ok(self.apply_with_catalog(&combos, &catalog))
    }

    /// Filter, rank and select from an already loaded catalog.
    ///
    /// An empty result is not an error; callers are expected to relax the query instead.
    #[must_use]
    pub fn apply(&self, combos: &[ExerciseVariation]) -> Vec<QueryResult> {
        self.apply_with_catalog(combos, combos)
    }

    /// Like [`Query::apply`], but resolves prerequisite names and easier/harder variations in
    /// `catalog` instead of `combos`.
    #[must_use]
    pub fn apply_with_catalog(
        &self,
        combos: &[ExerciseVariation],
        catalog: &[ExerciseVariation],
    ) -> Vec<QueryResult> {
        let state = self.user.map(|(state, _)| state);
        let options = self.user.map(|(_, options)| options).unwrap_or_default();

        let filtered = filter_section(combos.iter(), self.section);
        let filtered = filter_exercise_focus(
            filtered,
            self.exercise_focus.map(|f| f.value),
            self.exercise_focus.is_none_or(|f| f.include),
        );
        let filtered = filter_sports_focus(
            filtered,
            self.sports_focus.map(|f| f.value),
            self.sports_focus.is_none_or(|f| f.include),
        );
        let filtered = filter_movement_pattern(
            filtered,
            self.movement_pattern.map(|f| f.value),
            self.movement_pattern.is_none_or(|f| f.include),
        );
        let filtered = filter_muscle_movement(
            filtered,
            self.muscle_movement.map(|f| f.value),
            self.muscle_movement.is_none_or(|f| f.include),
        );
        let filtered = filter_muscle_group(
            filtered,
            self.muscle_groups.map(|f| f.muscles),
            self.muscle_groups.is_none_or(|f| f.include),
            self.selector(),
        );
        let filtered = filter_equipment(filtered, self.equipment);
        let filtered = filter_equipment(
            filtered,
            state
                .filter(|_| !options.ignore_missing_equipment)
                .map(|s| s.user.equipment),
        );
        let filtered = filtered
            .filter(|c| {
                self.variations
                    .as_ref()
                    .is_none_or(|ids| ids.contains(&c.variation.id))
            })
            .filter(|c| !self.exclude_exercises.contains(&c.exercise.id))
            .filter(|c| {
                options.ignore_ignored
                    || state.is_none_or(|s| !s.is_ignored(c.exercise.id, c.variation.id))
            })
            .filter(|c| {
                options.ignore_prerequisites
                    || state.is_none_or(|s| prerequisites_met(s, &c.exercise))
            });

        let candidates = filtered
            .map(|combo| self.candidate(combo, state))
            .filter(|c| options.ignore_progressions || c.eligible)
            .collect::<Vec<_>>();

        debug!(
            "{} of {} variations match the filters for section {}",
            candidates.len(),
            combos.len(),
            self.section.unwrap_or_default()
        );

        let selection = Selection {
            settings: &self.settings,
            selector: self.selector(),
            unique_exercises: options.unique_exercises,
            take: self.take,
            threshold: self.settings.unique_muscles.for_section(self.section),
        };
        let selected = selection.select(candidates, self.muscle_targets.clone());

        debug!(
            "selected {} variations for section {}",
            selected.len(),
            self.section.unwrap_or_default()
        );

        selected
            .into_iter()
            .map(|c| self.result(c, catalog))
            .collect()
    }

    fn selector(&self) -> MuscleSelector {
        self.muscle_groups
            .map_or(Variation::strengthened_muscles, |f| f.selector)
    }

    fn candidate<'c>(
        &self,
        combo: &'c ExerciseVariation,
        state: Option<&'c UserState>,
    ) -> Candidate<'c> {
        let user_exercise = state.and_then(|s| s.exercises.get(&combo.exercise.id));
        let user_variation = state.and_then(|s| s.variations.get(&combo.variation.id));
        Candidate {
            combo,
            user_exercise,
            user_variation,
            eligible: state.is_none_or(|s| {
                combo
                    .variation
                    .progression
                    .contains(s.progression(combo.exercise.id))
            }),
            freshness: Freshness::new(user_variation, self.date),
        }
    }

    fn result(&self, candidate: Candidate<'_>, catalog: &[ExerciseVariation]) -> QueryResult {
        let Candidate {
            combo,
            user_exercise,
            user_variation,
            ..
        } = candidate;
        let instructions = match self.user {
            Some((state, _)) => combo.variation.instructions_for(state.user.equipment),
            None => combo.variation.instructions.clone(),
        };

        QueryResult {
            section: self
                .section
                .filter(|s| !s.is_empty())
                .map_or(combo.variation.section, |s| s.intersect(combo.variation.section)),
            exercise: combo.exercise.clone(),
            variation: combo.variation.clone(),
            user_exercise: user_exercise.cloned(),
            user_variation: user_variation.cloned(),
            prerequisites: prerequisite_names(&combo.exercise, catalog),
            easier_variation: easier_variation(&combo.variation, catalog),
            harder_variation: harder_variation(&combo.variation, catalog),
            instructions,
        }
    }
}

/// A prerequisite is met if the user has reached its proficiency or ignores its exercise.
fn prerequisites_met(state: &UserState, exercise: &Exercise) -> bool {
    exercise.prerequisites.iter().all(|p| {
        state
            .exercises
            .get(&p.exercise_id)
            .is_some_and(|e| e.ignore)
            || state.progression(p.exercise_id) >= p.proficiency
    })
}

fn prerequisite_names(exercise: &Exercise, catalog: &[ExerciseVariation]) -> Vec<Name> {
    exercise
        .prerequisites
        .iter()
        .filter_map(|p| {
            catalog
                .iter()
                .find(|c| c.exercise.id == p.exercise_id)
                .map(|c| c.exercise.name.clone())
        })
        .collect()
}

/// The closest variation of the same exercise which ends where this one starts or earlier.
fn easier_variation(variation: &Variation, catalog: &[ExerciseVariation]) -> Option<Name> {
    let min = variation.progression.min()?;
    catalog
        .iter()
        .map(|c| &c.variation)
        .filter(|v| v.exercise_id == variation.exercise_id && v.id != variation.id)
        .filter_map(|v| v.progression.max().filter(|max| *max <= min).map(|max| (max, v)))
        .max_by(|(a, v), (b, w)| a.cmp(b).then(w.id.cmp(&v.id)))
        .map(|(_, v)| v.name.clone())
}

/// The closest variation of the same exercise which starts where this one ends or later.
fn harder_variation(variation: &Variation, catalog: &[ExerciseVariation]) -> Option<Name> {
    let max = variation.progression.max()?;
    catalog
        .iter()
        .map(|c| &c.variation)
        .filter(|v| v.exercise_id == variation.exercise_id && v.id != variation.id)
        .filter_map(|v| v.progression.min().filter(|min| *min >= max).map(|min| (min, v)))
        .min_by(|(a, v), (b, w)| a.cmp(b).then(v.id.cmp(&w.id)))
        .map(|(_, v)| v.name.clone())
}

/// A selected variation together with everything needed to present it.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    /// The part of the queried section the variation belongs to.
    pub section: Section,
    pub exercise: Exercise,
    pub variation: Variation,
    pub user_exercise: Option<UserExercise>,
    pub user_variation: Option<UserVariation>,
    /// Names of the exercises this exercise builds on.
    pub prerequisites: Vec<Name>,
    pub easier_variation: Option<Name>,
    pub harder_variation: Option<Name>,
    /// Instructions usable with the user's equipment.
    pub instructions: Vec<Instruction>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use crate::{
        MuscleTargetsBuilder, Prerequisite, Progression, ProgressionRange, User, UserExercise,
        UserVariation,
    };

    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, day).unwrap()
    }

    fn name(value: &str) -> Name {
        Name::new(value).unwrap()
    }

    fn progression(min: Option<u8>, max: Option<u8>) -> ProgressionRange {
        ProgressionRange::new(
            min.map(|v| Progression::new(v).unwrap()),
            max.map(|v| Progression::new(v).unwrap()),
        )
        .unwrap()
    }

    fn exercise(id: u128, exercise_name: &str) -> Exercise {
        Exercise {
            id: id.into(),
            name: name(exercise_name),
            prerequisites: vec![],
        }
    }

    fn variation(
        id: u128,
        exercise_id: u128,
        variation_name: &str,
        equipment: Equipment,
    ) -> Variation {
        Variation {
            id: id.into(),
            exercise_id: exercise_id.into(),
            name: name(variation_name),
            strengthens: MuscleGroups::PECTORALS | MuscleGroups::TRICEPS,
            stretches: MuscleGroups::NONE,
            stabilizes: MuscleGroups::CORE,
            movement_pattern: MovementPattern::HORIZONTAL_PUSH,
            section: Section::MAIN,
            exercise_focus: ExerciseFocus::STRENGTH,
            sports_focus: SportsFocus::NONE,
            muscle_movement: MuscleMovement::ISOTONIC,
            progression: ProgressionRange::default(),
            instructions: vec![Instruction {
                id: id.into(),
                name: name(variation_name),
                equipment,
                children: vec![],
            }],
        }
    }

    fn catalog() -> Vec<ExerciseVariation> {
        let push_up = exercise(1, "Push-up");
        let bench_press = exercise(2, "Bench Press");
        vec![
            ExerciseVariation {
                exercise: push_up.clone(),
                variation: Variation {
                    progression: progression(None, Some(40)),
                    ..variation(1, 1, "Knee Push-up", Equipment::NONE)
                },
            },
            ExerciseVariation {
                exercise: push_up.clone(),
                variation: Variation {
                    progression: progression(Some(40), Some(80)),
                    ..variation(2, 1, "Push-up", Equipment::NONE)
                },
            },
            ExerciseVariation {
                exercise: push_up,
                variation: Variation {
                    progression: progression(Some(80), None),
                    ..variation(3, 1, "Archer Push-up", Equipment::NONE)
                },
            },
            ExerciseVariation {
                exercise: bench_press,
                variation: variation(4, 2, "Barbell Bench Press", Equipment::BARBELL),
            },
        ]
    }

    fn user_state(equipment: Equipment) -> UserState {
        UserState::new(User {
            id: 1.into(),
            name: name("Alice"),
            equipment,
        })
    }

    fn all_options() -> UserOptions {
        UserOptions {
            ignore_progressions: true,
            ..UserOptions::default()
        }
    }

    fn ids(results: &[QueryResult]) -> Vec<u128> {
        results.iter().map(|r| r.variation.id.as_u128()).collect()
    }

    #[test]
    fn test_equipment_excludes_unavailable_exercises() {
        let state = user_state(Equipment::NONE);
        let query = QueryBuilder::new()
            .with_section(Section::MAIN)
            .with_user(&state, all_options())
            .with_date(date(1))
            .build()
            .unwrap();

        let results = query.apply(&catalog());

        assert_eq!(ids(&results), vec![2, 1, 3]);
        assert!(results.iter().all(|r| r.exercise.name == name("Push-up")));
    }

    #[test]
    fn test_equipment_ignore_missing() {
        let state = user_state(Equipment::NONE);
        let query = QueryBuilder::new()
            .with_user(
                &state,
                UserOptions {
                    ignore_missing_equipment: true,
                    ..all_options()
                },
            )
            .with_date(date(1))
            .build()
            .unwrap();

        assert_eq!(ids(&query.apply(&catalog())), vec![2, 4, 1, 3]);
    }

    #[test]
    fn test_explicit_equipment_without_user() {
        let query = QueryBuilder::new()
            .with_equipment(Equipment::BARBELL)
            .with_date(date(1))
            .build()
            .unwrap();

        assert_eq!(ids(&query.apply(&catalog())), vec![1, 2, 3, 4]);

        let query = QueryBuilder::new()
            .with_equipment(Equipment::DUMBBELL)
            .with_date(date(1))
            .build()
            .unwrap();

        assert_eq!(ids(&query.apply(&catalog())), vec![1, 2, 3]);
    }

    #[test]
    fn test_build_user_twice() {
        let state = user_state(Equipment::NONE);
        let result = QueryBuilder::new()
            .with_user(&state, UserOptions::default())
            .with_section(Section::MAIN)
            .with_user(&state, all_options())
            .build();

        assert!(matches!(result, Err(QueryError::AlreadyConfigured("user"))));
    }

    #[rstest]
    #[case::section(QueryBuilder::new().with_section(Section::MAIN).with_section(Section::CORE), "section")]
    #[case::take(QueryBuilder::new().with_take(1).with_take(2), "take")]
    #[case::first_duplicate(
        QueryBuilder::new().with_take(1).with_equipment(Equipment::NONE).with_take(2).with_equipment(Equipment::NONE),
        "take"
    )]
    fn test_build_already_configured(#[case] builder: QueryBuilder, #[case] option: &str) {
        assert!(matches!(
            builder.build(),
            Err(QueryError::AlreadyConfigured(o)) if o == option
        ));
    }

    #[rstest]
    #[case::default_progression(None, UserOptions::default(), vec![2])]
    #[case::beginner(Some(10), UserOptions::default(), vec![1])]
    #[case::advanced(Some(90), UserOptions::default(), vec![3])]
    #[case::ignore_progressions(Some(90), all_options(), vec![3, 1, 2])]
    fn test_progression_eligibility(
        #[case] value: Option<u8>,
        #[case] options: UserOptions,
        #[case] expected: Vec<u128>,
    ) {
        let mut state = user_state(Equipment::NONE);
        if let Some(value) = value {
            state.exercises.insert(
                1.into(),
                UserExercise {
                    progression: Progression::new(value).unwrap(),
                    ..UserExercise::new(1.into())
                },
            );
        }
        let query = QueryBuilder::new()
            .with_user(&state, options)
            .with_date(date(1))
            .build()
            .unwrap();

        assert_eq!(ids(&query.apply(&catalog())), expected);
    }

    #[test]
    fn test_ignored() {
        let mut state = user_state(Equipment::ALL);
        state.variations.insert(
            2.into(),
            UserVariation {
                ignore: true,
                ..UserVariation::new(2.into())
            },
        );
        state.exercises.insert(
            2.into(),
            UserExercise {
                ignore: true,
                ..UserExercise::new(2.into())
            },
        );

        let query = QueryBuilder::new()
            .with_user(&state, all_options())
            .with_date(date(1))
            .build()
            .unwrap();
        assert_eq!(ids(&query.apply(&catalog())), vec![1, 3]);

        let query = QueryBuilder::new()
            .with_user(
                &state,
                UserOptions {
                    ignore_ignored: true,
                    ..all_options()
                },
            )
            .with_date(date(1))
            .build()
            .unwrap();
        assert_eq!(ids(&query.apply(&catalog())), vec![2, 4, 1, 3]);
    }

    #[rstest]
    #[case::unmet(Some(30), false, UserOptions::default(), false)]
    #[case::met(Some(60), false, UserOptions::default(), true)]
    #[case::unseen_default(None, false, UserOptions::default(), true)]
    #[case::ignored(Some(10), true, UserOptions::default(), true)]
    #[case::ignore_prerequisites(Some(30), false, UserOptions { ignore_prerequisites: true, ..UserOptions::default() }, true)]
    fn test_prerequisites(
        #[case] push_up_progression: Option<u8>,
        #[case] push_up_ignored: bool,
        #[case] options: UserOptions,
        #[case] shown: bool,
    ) {
        let mut combos = catalog();
        combos[3].exercise.prerequisites = vec![Prerequisite {
            exercise_id: 1.into(),
            proficiency: Progression::new(50).unwrap(),
        }];
        let mut state = user_state(Equipment::ALL);
        if let Some(value) = push_up_progression {
            state.exercises.insert(
                1.into(),
                UserExercise {
                    progression: Progression::new(value).unwrap(),
                    ignore: push_up_ignored,
                    ..UserExercise::new(1.into())
                },
            );
        }
        let query = QueryBuilder::new()
            .with_user(
                &state,
                UserOptions {
                    ignore_progressions: true,
                    ignore_ignored: true,
                    ..options
                },
            )
            .with_date(date(1))
            .build()
            .unwrap();

        let results = query.apply(&combos);

        assert_eq!(ids(&results).contains(&4), shown);
        if shown {
            let bench_press = results.iter().find(|r| r.variation.id.as_u128() == 4);
            assert_eq!(
                bench_press.map(|r| r.prerequisites.clone()),
                Some(vec![name("Push-up")])
            );
        }
    }

    #[test]
    fn test_unique_exercises() {
        let state = user_state(Equipment::ALL);
        let query = QueryBuilder::new()
            .with_user(
                &state,
                UserOptions {
                    unique_exercises: true,
                    ..all_options()
                },
            )
            .with_date(date(1))
            .build()
            .unwrap();

        let results = query.apply(&catalog());

        assert_eq!(ids(&results), vec![2, 4]);
    }

    #[test]
    fn test_freshness_order() {
        let mut state = user_state(Equipment::ALL);
        state.variations.insert(
            1.into(),
            UserVariation {
                last_seen: Some(date(1)),
                ..UserVariation::new(1.into())
            },
        );
        state.variations.insert(
            3.into(),
            UserVariation {
                last_seen: Some(date(2)),
                refresh_after: Some(date(9)),
                ..UserVariation::new(3.into())
            },
        );
        let query = QueryBuilder::new()
            .with_user(&state, all_options())
            .with_date(date(3))
            .build()
            .unwrap();

        let results = query.apply(&catalog());

        assert_eq!(ids(&results), vec![2, 4, 3, 1]);
        assert_eq!(
            results[2].user_variation.as_ref().map(|v| v.refresh_after),
            Some(Some(date(9)))
        );
    }

    #[test]
    fn test_variations_allow_list() {
        let query = QueryBuilder::new()
            .with_variations([VariationID::from(3), VariationID::from(4)])
            .with_exclude_exercises([ExerciseID::from(2)])
            .with_date(date(1))
            .build()
            .unwrap();

        assert_eq!(ids(&query.apply(&catalog())), vec![3]);
    }

    #[test]
    fn test_no_match_is_empty() {
        let query = QueryBuilder::new()
            .with_section(Section::FLEXIBILITY)
            .with_date(date(1))
            .build()
            .unwrap();

        assert_eq!(query.apply(&catalog()), vec![]);
    }

    #[test]
    fn test_easier_and_harder_variation() {
        let query = QueryBuilder::new()
            .with_variations([VariationID::from(1), VariationID::from(2), VariationID::from(3)])
            .with_date(date(1))
            .build()
            .unwrap();

        let results = query.apply(&catalog());

        assert_eq!(
            results
                .iter()
                .map(|r| (r.easier_variation.clone(), r.harder_variation.clone()))
                .collect::<Vec<_>>(),
            vec![
                (None, Some(name("Push-up"))),
                (Some(name("Knee Push-up")), Some(name("Archer Push-up"))),
                (Some(name("Push-up")), None),
            ]
        );
    }

    #[test]
    fn test_references_resolved_in_catalog() {
        let mut catalog = catalog();
        catalog[0].variation.section = Section::WARMUP_RAISE;
        catalog[2].variation.section = Section::WARMUP_RAISE;
        catalog[3].exercise.prerequisites = vec![Prerequisite {
            exercise_id: 3.into(),
            proficiency: Progression::new(20).unwrap(),
        }];
        catalog.push(ExerciseVariation {
            exercise: exercise(3, "Plank"),
            variation: Variation {
                section: Section::WARMUP_RAISE,
                ..variation(5, 3, "Forearm Plank", Equipment::NONE)
            },
        });
        let main = catalog
            .iter()
            .filter(|c| c.variation.section.has_any(Section::MAIN))
            .cloned()
            .collect::<Vec<_>>();
        let query = QueryBuilder::new()
            .with_section(Section::MAIN)
            .with_date(date(1))
            .build()
            .unwrap();

        let results = query.apply_with_catalog(&main, &catalog);

        assert_eq!(ids(&results), vec![2, 4]);
        assert_eq!(
            (
                results[0].easier_variation.clone(),
                results[0].harder_variation.clone()
            ),
            (Some(name("Knee Push-up")), Some(name("Archer Push-up")))
        );
        assert_eq!(results[1].prerequisites, vec![name("Plank")]);

        let results = query.apply(&main);

        assert_eq!(
            (
                results[0].easier_variation.clone(),
                results[0].harder_variation.clone()
            ),
            (None, None)
        );
        assert_eq!(results[1].prerequisites, vec![]);
    }

    #[rstest]
    #[case::unset(None, Section::MAIN | Section::WARMUP_RAISE)]
    #[case::empty(Some(Section::NONE), Section::MAIN | Section::WARMUP_RAISE)]
    #[case::single(Some(Section::MAIN), Section::MAIN)]
    #[case::composite(Some(Section::WARMUP_ANY), Section::WARMUP_RAISE)]
    fn test_result_section(#[case] section: Option<Section>, #[case] expected: Section) {
        let mut catalog = catalog();
        catalog[0].variation.section = Section::MAIN | Section::WARMUP_RAISE;
        let mut builder = QueryBuilder::new()
            .with_variations([VariationID::from(1)])
            .with_date(date(1));
        if let Some(section) = section {
            builder = builder.with_section(section);
        }

        let results = builder.build().unwrap().apply(&catalog);

        assert_eq!(results.iter().map(|r| r.section).collect::<Vec<_>>(), vec![expected]);
    }

    #[test]
    fn test_instructions_for_user_equipment() {
        let mut combos = catalog();
        combos[1].variation.instructions[0].children = vec![
            Instruction {
                id: 10.into(),
                name: name("Feet on a box"),
                equipment: Equipment::BOX,
                children: vec![],
            },
            Instruction {
                id: 11.into(),
                name: name("Hands on rings"),
                equipment: Equipment::GYMNASTIC_RINGS,
                children: vec![],
            },
        ];
        let state = user_state(Equipment::BOX);
        let query = QueryBuilder::new()
            .with_user(&state, all_options())
            .with_variations([VariationID::from(2)])
            .with_date(date(1))
            .build()
            .unwrap();

        let results = query.apply(&combos);

        assert_eq!(
            results[0].instructions[0]
                .children
                .iter()
                .map(|i| i.name.clone())
                .collect::<Vec<_>>(),
            vec![name("Feet on a box")]
        );
    }

    #[test]
    fn test_muscle_targets() {
        let settings = SelectionSettings::default();
        let mut combos = catalog();
        combos[3].variation.strengthens = MuscleGroups::PECTORALS | MuscleGroups::FRONT_DELTS;
        let targets = MuscleTargetsBuilder::new(
            MuscleGroups::PECTORALS | MuscleGroups::FRONT_DELTS,
            &settings,
            date(1),
        )
        .build();
        let state = user_state(Equipment::ALL);
        let query = QueryBuilder::new()
            .with_section(Section::MAIN)
            .with_user(
                &state,
                UserOptions {
                    unique_exercises: true,
                    ..all_options()
                },
            )
            .with_muscle_groups(
                MuscleGroups::PECTORALS | MuscleGroups::FRONT_DELTS,
                Variation::strengthened_muscles,
                true,
            )
            .with_muscle_targets(targets)
            .with_take(1)
            .with_date(date(1))
            .build()
            .unwrap();

        assert_eq!(ids(&query.apply(&combos)), vec![4]);
    }

    #[test]
    fn test_apply_is_deterministic() {
        let state = user_state(Equipment::NONE);
        let query = QueryBuilder::new()
            .with_section(Section::MAIN)
            .with_user(&state, all_options())
            .with_date(date(1))
            .build()
            .unwrap();
        let combos = catalog();

        assert_eq!(query.apply(&combos), query.apply(&combos));
    }
}
