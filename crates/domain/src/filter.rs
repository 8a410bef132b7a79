//! Composable predicates over a stream of exercise variations.
//!
//! Every predicate is lazy and passes the stream through unchanged when the filter value is
//! `None` or empty, as an empty flag value means "unset" and not "match nothing".

use crate::{
    Equipment, ExerciseFocus, ExerciseVariation, Flags, MovementPattern, MuscleGroups,
    MuscleMovement, MuscleSelector, Section, SportsFocus, Variation,
};

/// Keep (`include`) or drop (`!include`) variations whose selected flags overlap `value`.
pub fn filter_flags<'a, F: Flags>(
    combos: impl Iterator<Item = &'a ExerciseVariation>,
    value: Option<F>,
    include: bool,
    selector: impl Fn(&Variation) -> F,
) -> impl Iterator<Item = &'a ExerciseVariation> {
    let value = value.filter(|v| !v.is_empty());
    combos.filter(move |c| value.is_none_or(|v| selector(&c.variation).has_any(v) == include))
}

pub fn filter_section<'a>(
    combos: impl Iterator<Item = &'a ExerciseVariation>,
    section: Option<Section>,
) -> impl Iterator<Item = &'a ExerciseVariation> {
    filter_flags(combos, section, true, |v| v.section)
}

/// Keep variations whose instructions can all be followed with `equipment`.
///
/// Unlike the other predicates, `Some(Equipment::NONE)` is a real constraint (the user owns
/// no equipment) and only `None` passes everything.
pub fn filter_equipment<'a>(
    combos: impl Iterator<Item = &'a ExerciseVariation>,
    equipment: Option<Equipment>,
) -> impl Iterator<Item = &'a ExerciseVariation> {
    combos.filter(move |c| {
        equipment.is_none_or(|owned| {
            c.variation
                .instructions
                .iter()
                .all(|i| owned.has_all(i.equipment))
        })
    })
}

pub fn filter_exercise_focus<'a>(
    combos: impl Iterator<Item = &'a ExerciseVariation>,
    focus: Option<ExerciseFocus>,
    include: bool,
) -> impl Iterator<Item = &'a ExerciseVariation> {
    filter_flags(combos, focus, include, |v| v.exercise_focus)
}

pub fn filter_movement_pattern<'a>(
    combos: impl Iterator<Item = &'a ExerciseVariation>,
    pattern: Option<MovementPattern>,
    include: bool,
) -> impl Iterator<Item = &'a ExerciseVariation> {
    filter_flags(combos, pattern, include, |v| v.movement_pattern)
}

pub fn filter_muscle_group<'a>(
    combos: impl Iterator<Item = &'a ExerciseVariation>,
    muscles: Option<MuscleGroups>,
    include: bool,
    selector: MuscleSelector,
) -> impl Iterator<Item = &'a ExerciseVariation> {
    filter_flags(combos, muscles, include, selector)
}

pub fn filter_muscle_movement<'a>(
    combos: impl Iterator<Item = &'a ExerciseVariation>,
    movement: Option<MuscleMovement>,
    include: bool,
) -> impl Iterator<Item = &'a ExerciseVariation> {
    filter_flags(combos, movement, include, |v| v.muscle_movement)
}

pub fn filter_sports_focus<'a>(
    combos: impl Iterator<Item = &'a ExerciseVariation>,
    focus: Option<SportsFocus>,
    include: bool,
) -> impl Iterator<Item = &'a ExerciseVariation> {
    filter_flags(combos, focus, include, |v| v.sports_focus)
}
