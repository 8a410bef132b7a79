use std::collections::BTreeMap;

use chrono::NaiveDate;
use log::trace;

use crate::{MuscleGroups, SelectionSettings, Variation, WorkedVolume};

/// Remaining volume per muscle group that the selection should still cover.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MuscleTargets(BTreeMap<MuscleGroups, u32>);

impl MuscleTargets {
    #[must_use]
    pub fn get(&self, muscle: MuscleGroups) -> u32 {
        self.0.get(&muscle).copied().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MuscleGroups, u32)> + '_ {
        self.0.iter().map(|(m, v)| (*m, *v))
    }

    /// Muscle groups with a remaining target.
    #[must_use]
    pub fn unworked(&self) -> MuscleGroups {
        self.iter().filter(|(_, v)| *v > 0).map(|(m, _)| m).collect()
    }

    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        self.unworked().is_empty()
    }

    /// Sum of the remaining targets of the given muscles.
    #[must_use]
    pub fn deficit(&self, muscles: MuscleGroups) -> u32 {
        muscles
            .iter()
            .map(|m| self.get(m))
            .fold(0, u32::saturating_add)
    }

    /// Credit the volume of a selected variation against the targets.
    pub fn consume(
        &mut self,
        variation: &Variation,
        selector: fn(&Variation) -> MuscleGroups,
        settings: &SelectionSettings,
    ) {
        let primary = selector(variation);
        let secondary = variation.stabilizes.difference(primary);
        let secondary_volume = settings
            .exercise_volume
            .checked_div(settings.secondary_divisor)
            .unwrap_or_default();

        for (muscle, target) in &mut self.0 {
            if primary.has_all(*muscle) {
                *target = target.saturating_sub(settings.exercise_volume);
            } else if secondary.has_all(*muscle) {
                *target = target.saturating_sub(secondary_volume);
            }
        }
    }
}

/// Computes the per-muscle targets for a section from a user's recent history.
pub struct MuscleTargetsBuilder<'a> {
    muscles: MuscleGroups,
    settings: &'a SelectionSettings,
    today: NaiveDate,
    history: Vec<WorkedVolume>,
    use_history: bool,
    adjust_core: bool,
}

impl<'a> MuscleTargetsBuilder<'a> {
    #[must_use]
    pub fn new(muscles: MuscleGroups, settings: &'a SelectionSettings, today: NaiveDate) -> Self {
        Self {
            muscles,
            settings,
            today,
            history: vec![],
            use_history: true,
            adjust_core: true,
        }
    }

    #[must_use]
    pub fn with_history(mut self, history: impl IntoIterator<Item = WorkedVolume>) -> Self {
        self.history.extend(history);
        self
    }

    /// Start every muscle at the base volume regardless of history.
    #[must_use]
    pub fn without_muscle_targets(mut self) -> Self {
        self.use_history = false;
        self
    }

    /// Keep the full target for core muscles.
    ///
    /// By default core targets are scaled to `core_weight_percent`, as most exercises work
    /// the core incidentally.
    #[must_use]
    pub fn without_core_adjustment(mut self) -> Self {
        self.adjust_core = false;
        self
    }

    #[must_use]
    pub fn build(self) -> MuscleTargets {
        let worked = if self.use_history {
            self.worked_volume()
        } else {
            BTreeMap::new()
        };

        MuscleTargets(
            self.muscles
                .iter()
                .map(|muscle| {
                    let mut target = self
                        .settings
                        .base_volume
                        .saturating_sub(worked.get(&muscle).copied().unwrap_or_default());
                    if self.adjust_core && MuscleGroups::CORE.has_all(muscle) {
                        target = target.saturating_mul(self.settings.core_weight_percent) / 100;
                    }
                    trace!("target for {muscle}: {target}");
                    (muscle, target)
                })
                .collect(),
        )
    }

    /// Recency-weighted volume per muscle: volume logged today counts fully, decreasing
    /// linearly to nothing at the end of the history window.
    fn worked_volume(&self) -> BTreeMap<MuscleGroups, u32> {
        let window = u64::from(self.settings.history_days);
        let mut worked: BTreeMap<MuscleGroups, u32> = BTreeMap::new();

        for entry in &self.history {
            let Ok(days_ago) = u64::try_from((self.today - entry.date).num_days()) else {
                continue;
            };
            if days_ago >= window {
                continue;
            }
            let weighted = u64::from(entry.volume) * (window - days_ago) / window;
            let weighted = u32::try_from(weighted).unwrap_or(u32::MAX);
            let secondary = weighted
                .checked_div(self.settings.secondary_divisor)
                .unwrap_or_default();

            for muscle in self.muscles.iter() {
                let volume = if entry.primary.has_all(muscle) {
                    weighted
                } else if entry.secondary.has_all(muscle) {
                    secondary
                } else {
                    continue;
                };
                let total = worked.entry(muscle).or_default();
                *total = total.saturating_add(volume);
            }
        }

        worked
    }
}
