use std::collections::BTreeSet;

use chrono::NaiveDate;
use log::trace;

use crate::{
    ExerciseID, ExerciseVariation, MuscleSelector, MuscleTargets, RankingPrecedence,
    SelectionSettings, UserExercise, UserVariation, VariationID,
};

/// How recently a user has been shown a variation. Earlier values rank first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Freshness {
    /// Still within its refresh period, so it is repeated.
    Pinned,
    Unseen,
    Seen(NaiveDate),
}

impl Freshness {
    #[must_use]
    pub fn new(user_variation: Option<&UserVariation>, today: NaiveDate) -> Self {
        match user_variation {
            Some(v) if v.is_pinned(today) => Freshness::Pinned,
            Some(UserVariation {
                last_seen: Some(date),
                ..
            }) => Freshness::Seen(*date),
            _ => Freshness::Unseen,
        }
    }
}

/// A filtered combo with the user state relevant for ranking.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub combo: &'a ExerciseVariation,
    pub user_exercise: Option<&'a UserExercise>,
    pub user_variation: Option<&'a UserVariation>,
    /// The variation matches the user's progression.
    pub eligible: bool,
    pub freshness: Freshness,
}

impl Candidate<'_> {
    fn exercise_id(&self) -> ExerciseID {
        self.combo.exercise.id
    }

    fn variation_id(&self) -> VariationID {
        self.combo.variation.id
    }

    fn rank(
        &self,
        deficit: u32,
        precedence: RankingPrecedence,
    ) -> ([u32; 2], Freshness, ExerciseID, VariationID) {
        let ineligible = u32::from(!self.eligible);
        let surplus = u32::MAX - deficit;
        let primary = match precedence {
            RankingPrecedence::ProgressionFirst => [ineligible, surplus],
            RankingPrecedence::DeficitFirst => [surplus, ineligible],
        };
        (
            primary,
            self.freshness,
            self.exercise_id(),
            self.variation_id(),
        )
    }
}

/// Parameters of the final ranking and selection step.
pub struct Selection<'s> {
    pub settings: &'s SelectionSettings,
    pub selector: MuscleSelector,
    pub unique_exercises: bool,
    pub take: Option<usize>,
    pub threshold: u32,
}

impl Selection<'_> {
    /// Order the candidates and pick the final subset.
    ///
    /// Without muscle targets, candidates are ordered by eligibility, freshness and ID. With
    /// muscle targets, candidates are picked greedily by the deficit they cover. A pick must
    /// work at least `threshold` muscles that still have a target; the threshold is lowered
    /// whenever no candidate qualifies. Selection ends when all targets are met.
    #[must_use]
    pub fn select<'a>(
        &self,
        candidates: Vec<Candidate<'a>>,
        targets: Option<MuscleTargets>,
    ) -> Vec<Candidate<'a>> {
        match targets {
            Some(targets) => self.select_by_targets(candidates, targets),
            None => self.select_by_order(candidates),
        }
    }

    fn select_by_order<'a>(&self, mut candidates: Vec<Candidate<'a>>) -> Vec<Candidate<'a>> {
        candidates.sort_by_key(|c| c.rank(0, self.settings.precedence));

        let mut exercises = BTreeSet::new();
        candidates
            .into_iter()
            .filter(|c| !self.unique_exercises || exercises.insert(c.exercise_id()))
            .take(self.take.unwrap_or(usize::MAX))
            .collect()
    }

    fn select_by_targets<'a>(
        &self,
        mut remaining: Vec<Candidate<'a>>,
        mut targets: MuscleTargets,
    ) -> Vec<Candidate<'a>> {
        let mut selected: Vec<Candidate<'a>> = vec![];
        let mut exercises = BTreeSet::new();
        let mut threshold = self.threshold.max(1);

        while self.take.is_none_or(|take| selected.len() < take) && !targets.is_satisfied() {
            let unworked = targets.unworked();
            let best = remaining
                .iter()
                .enumerate()
                .filter(|(_, c)| !self.unique_exercises || !exercises.contains(&c.exercise_id()))
                .filter(|(_, c)| {
                    (self.selector)(&c.combo.variation)
                        .intersect(unworked)
                        .count()
                        >= threshold
                })
                .min_by_key(|(_, c)| {
                    c.rank(
                        targets.deficit((self.selector)(&c.combo.variation)),
                        self.settings.precedence,
                    )
                })
                .map(|(i, _)| i);

            match best {
                Some(index) => {
                    let candidate = remaining.remove(index);
                    trace!(
                        "selected {} ({}) at threshold {threshold}",
                        candidate.combo.variation.name,
                        candidate.combo.exercise.name
                    );
                    targets.consume(&candidate.combo.variation, self.selector, self.settings);
                    exercises.insert(candidate.exercise_id());
                    selected.push(candidate);
                }
                None if threshold > 1 => threshold -= 1,
                None => break,
            }
        }

        selected
    }
}
