use std::{
    fmt,
    ops::{BitAnd, BitOr, BitOrAssign},
};

/// Common behaviour of the bitmask types, used by the generic filter predicates.
pub trait Flags: Copy + PartialEq {
    fn is_empty(self) -> bool;
    fn has_any(self, other: Self) -> bool;
}

macro_rules! flags {
    (
        $(#[$meta:meta])*
        pub struct $name:ident($ty:ty) {
            $($flag:ident = $bit:literal, $label:literal;)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Default, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
        pub struct $name($ty);

        impl $name {
            pub const NONE: $name = $name(0);
            $(pub const $flag: $name = $name(1 << $bit);)*
            pub const ALL: $name = $name(0 $(| (1 << $bit))*);

            const NAMED: &'static [($name, &'static str)] = &[$(($name::$flag, $label),)*];

            /// Unknown bits are dropped.
            #[must_use]
            pub const fn from_bits_truncate(bits: $ty) -> Self {
                Self(bits & Self::ALL.0)
            }

            #[must_use]
            pub const fn bits(self) -> $ty {
                self.0
            }

            #[must_use]
            pub const fn union(self, other: Self) -> Self {
                Self(self.0 | other.0)
            }

            #[must_use]
            pub const fn intersect(self, other: Self) -> Self {
                Self(self.0 & other.0)
            }

            #[must_use]
            pub const fn difference(self, other: Self) -> Self {
                Self(self.0 & !other.0)
            }

            #[must_use]
            pub const fn is_empty(self) -> bool {
                self.0 == 0
            }

            #[must_use]
            pub const fn has_any(self, other: Self) -> bool {
                self.0 & other.0 != 0
            }

            /// True if every bit of `other` is set in `self`, so an empty `other` always matches.
            #[must_use]
            pub const fn has_all(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }

            #[must_use]
            pub const fn count(self) -> u32 {
                self.0.count_ones()
            }

            /// Single-bit values contained in `self`, in declaration order.
            pub fn iter(self) -> impl Iterator<Item = $name> {
                Self::NAMED
                    .iter()
                    .map(|(flag, _)| *flag)
                    .filter(move |flag| self.has_all(*flag))
            }

            /// Name of a single-bit value.
            #[must_use]
            pub fn name(self) -> Option<&'static str> {
                Self::NAMED
                    .iter()
                    .find(|(flag, _)| *flag == self)
                    .map(|(_, name)| *name)
            }
        }

        impl BitOr for $name {
            type Output = $name;

            fn bitor(self, rhs: Self) -> Self::Output {
                self.union(rhs)
            }
        }

        impl BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                *self = self.union(rhs);
            }
        }

        impl BitAnd for $name {
            type Output = $name;

            fn bitand(self, rhs: Self) -> Self::Output {
                self.intersect(rhs)
            }
        }

        impl FromIterator<$name> for $name {
            fn from_iter<I: IntoIterator<Item = $name>>(iter: I) -> Self {
                iter.into_iter().fold(Self::NONE, Self::union)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_empty() {
                    return write!(f, "None");
                }
                let names = self.iter().filter_map($name::name).collect::<Vec<_>>();
                write!(f, "{}", names.join(", "))
            }
        }

        impl Flags for $name {
            fn is_empty(self) -> bool {
                $name::is_empty(self)
            }

            fn has_any(self, other: Self) -> bool {
                $name::has_any(self, other)
            }
        }
    };
}

flags! {
    pub struct MuscleGroups(u32) {
        ABS = 0, "Abs";
        OBLIQUES = 1, "Obliques";
        ERECTOR_SPINAE = 2, "Erector Spinae";
        HIP_FLEXORS = 3, "Hip Flexors";
        GLUTES = 4, "Glutes";
        HAMSTRINGS = 5, "Hamstrings";
        QUADRICEPS = 6, "Quadriceps";
        CALVES = 7, "Calves";
        HIP_ADDUCTORS = 8, "Hip Adductors";
        HIP_ABDUCTORS = 9, "Hip Abductors";
        PECTORALS = 10, "Pectorals";
        LATS = 11, "Lats";
        TRAPS = 12, "Traps";
        RHOMBOIDS = 13, "Rhomboids";
        FRONT_DELTS = 14, "Front Delts";
        SIDE_DELTS = 15, "Side Delts";
        REAR_DELTS = 16, "Rear Delts";
        ROTATOR_CUFF = 17, "Rotator Cuff";
        SERRATUS_ANTERIOR = 18, "Serratus Anterior";
        BICEPS = 19, "Biceps";
        TRICEPS = 20, "Triceps";
        FOREARMS = 21, "Forearms";
        NECK = 22, "Neck";
        TIBIALIS_ANTERIOR = 23, "Tibialis Anterior";
    }
}

impl MuscleGroups {
    /// Trunk muscles that are worked incidentally by most compound movements.
    pub const CORE: MuscleGroups = MuscleGroups::ABS
        .union(MuscleGroups::OBLIQUES)
        .union(MuscleGroups::ERECTOR_SPINAE)
        .union(MuscleGroups::HIP_FLEXORS);

    pub const UPPER_BODY: MuscleGroups = MuscleGroups::PECTORALS
        .union(MuscleGroups::LATS)
        .union(MuscleGroups::TRAPS)
        .union(MuscleGroups::RHOMBOIDS)
        .union(MuscleGroups::FRONT_DELTS)
        .union(MuscleGroups::SIDE_DELTS)
        .union(MuscleGroups::REAR_DELTS)
        .union(MuscleGroups::ROTATOR_CUFF)
        .union(MuscleGroups::SERRATUS_ANTERIOR)
        .union(MuscleGroups::BICEPS)
        .union(MuscleGroups::TRICEPS)
        .union(MuscleGroups::FOREARMS)
        .union(MuscleGroups::NECK);

    pub const LOWER_BODY: MuscleGroups = MuscleGroups::GLUTES
        .union(MuscleGroups::HAMSTRINGS)
        .union(MuscleGroups::QUADRICEPS)
        .union(MuscleGroups::CALVES)
        .union(MuscleGroups::HIP_ADDUCTORS)
        .union(MuscleGroups::HIP_ABDUCTORS)
        .union(MuscleGroups::TIBIALIS_ANTERIOR);
}

flags! {
    pub struct MovementPattern(u16) {
        HORIZONTAL_PUSH = 0, "Horizontal Push";
        HORIZONTAL_PULL = 1, "Horizontal Pull";
        VERTICAL_PUSH = 2, "Vertical Push";
        VERTICAL_PULL = 3, "Vertical Pull";
        SQUAT = 4, "Squat";
        LUNGE = 5, "Lunge";
        HIP_HINGE = 6, "Hip Hinge";
        CARRY = 7, "Carry";
        ROTATION = 8, "Rotation";
        ANTI_ROTATION = 9, "Anti-Rotation";
    }
}

flags! {
    /// Newsletter segments a variation may appear in.
    pub struct Section(u16) {
        WARMUP_RAISE = 0, "Warmup Raise";
        WARMUP_ACTIVATION = 1, "Warmup Activation";
        WARMUP_POTENTIATION = 2, "Warmup Potentiation";
        MOBILITY = 3, "Mobility";
        MAIN = 4, "Main";
        ACCESSORY = 5, "Accessory";
        CORE = 6, "Core";
        SPORTS = 7, "Sports";
        PREHAB = 8, "Prehab";
        REHAB = 9, "Rehab";
        COOLDOWN_STRETCH = 10, "Cooldown Stretch";
        COOLDOWN_RELAX = 11, "Cooldown Relax";
        FLEXIBILITY = 12, "Flexibility";
    }
}

impl Section {
    pub const WARMUP_ANY: Section = Section::WARMUP_RAISE
        .union(Section::WARMUP_ACTIVATION)
        .union(Section::WARMUP_POTENTIATION);

    pub const COOLDOWN_ANY: Section = Section::COOLDOWN_STRETCH.union(Section::COOLDOWN_RELAX);
}

flags! {
    pub struct Equipment(u32) {
        BARBELL = 0, "Barbell";
        DUMBBELL = 1, "Dumbbell";
        KETTLEBELL = 2, "Kettlebell";
        CABLE = 3, "Cable";
        MACHINE = 4, "Machine";
        BENCH = 5, "Bench";
        BOX = 6, "Box";
        PULL_UP_BAR = 7, "Pull Up Bar";
        PARALLEL_BARS = 8, "Parallel Bars";
        GYMNASTIC_RINGS = 9, "Gymnastic Rings";
        RESISTANCE_BAND = 10, "Resistance Band";
        EXERCISE_BALL = 11, "Exercise Ball";
        SLIDERS = 12, "Sliders";
        TRAP_BAR = 13, "Trap Bar";
        FOAM_ROLLER = 14, "Foam Roller";
        YOGA_BLOCK = 15, "Yoga Block";
    }
}

flags! {
    pub struct ExerciseFocus(u16) {
        STRENGTH = 0, "Strength";
        STABILITY = 1, "Stability";
        ENDURANCE = 2, "Endurance";
        SPEED = 3, "Speed";
        POWER = 4, "Power";
        AGILITY = 5, "Agility";
        FLEXIBILITY = 6, "Flexibility";
        MOBILITY = 7, "Mobility";
    }
}

flags! {
    pub struct SportsFocus(u16) {
        SOCCER = 0, "Soccer";
        BASKETBALL = 1, "Basketball";
        TENNIS = 2, "Tennis";
        GOLF = 3, "Golf";
        RUNNING = 4, "Running";
        CYCLING = 5, "Cycling";
        SWIMMING = 6, "Swimming";
        CLIMBING = 7, "Climbing";
        MARTIAL_ARTS = 8, "Martial Arts";
    }
}

flags! {
    pub struct MuscleMovement(u8) {
        ISOMETRIC = 0, "Isometric";
        ISOTONIC = 1, "Isotonic";
        ISOKINETIC = 2, "Isokinetic";
        PLYOMETRIC = 3, "Plyometric";
    }
}
