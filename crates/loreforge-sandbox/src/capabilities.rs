//! The capability allow-list exposed to rule scripts.
//!
//! Everything a script can call lives here. Dice draw from the RNG handed to
//! the current execution; nothing else touches state.

use loreforge_core::rng::DeterministicRng;

use crate::error::ScriptFault;

/// Die sizes with a named shortcut (`D4`, `d20`, ...).
pub const STANDARD_DICE: &[u32] = &[4, 6, 8, 10, 12, 20, 100];

/// Rolls one die with `sides` faces, uniform over `[1, sides]`.
pub fn roll(rng: &mut dyn DeterministicRng, sides: u32) -> u32 {
    rng.next_u32_range(1, sides.max(1))
}

/// Rolls `count` dice with `sides` faces and returns the sum.
pub fn roll_many(rng: &mut dyn DeterministicRng, count: u32, sides: u32) -> u64 {
    (0..count).map(|_| u64::from(roll(rng, sides))).sum()
}

/// `floor((score - 10) / 2)`.
#[must_use]
pub fn ability_modifier(score: i64) -> i64 {
    (score - 10).div_euclid(2)
}

/// `floor((level - 1) / 4) + 2`.
#[must_use]
pub fn proficiency_bonus(level: i64) -> i64 {
    (level - 1).div_euclid(4) + 2
}

/// Inclusive range check.
#[must_use]
pub fn in_range(value: f64, min: f64, max: f64) -> bool {
    value >= min && value <= max
}

/// A capability namespace object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Namespace {
    Dice,
    Rules,
}

/// A callable capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Builtin {
    Roll,
    Die(u32),
    AbilityModifier,
    ProficiencyBonus,
    InRange,
    Min,
    Max,
    Floor,
    Ceil,
    Abs,
    Clamp,
}

fn die_shortcut(name: &str) -> Option<u32> {
    let digits = name.strip_prefix('D').or_else(|| name.strip_prefix('d'))?;
    let sides = digits.parse::<u32>().ok()?;
    STANDARD_DICE.contains(&sides).then_some(sides)
}

impl Namespace {
    /// Resolves a global namespace name (canonical or lowerCamel).
    pub(crate) fn global(name: &str) -> Option<Self> {
        match name {
            "Dice" | "dice" => Some(Self::Dice),
            "Rules" | "rules" => Some(Self::Rules),
            _ => None,
        }
    }

    /// Resolves a member of this namespace.
    pub(crate) fn member(self, name: &str) -> Option<Builtin> {
        match self {
            Self::Dice => match name {
                "Roll" | "roll" => Some(Builtin::Roll),
                other => die_shortcut(other).map(Builtin::Die),
            },
            Self::Rules => match name {
                "AbilityModifier" | "abilityModifier" => Some(Builtin::AbilityModifier),
                "ProficiencyBonus" | "proficiencyBonus" => Some(Builtin::ProficiencyBonus),
                "InRange" | "inRange" => Some(Builtin::InRange),
                "Min" | "min" => Some(Builtin::Min),
                "Max" | "max" => Some(Builtin::Max),
                "Floor" | "floor" => Some(Builtin::Floor),
                "Ceil" | "ceil" => Some(Builtin::Ceil),
                "Abs" | "abs" => Some(Builtin::Abs),
                "Clamp" | "clamp" => Some(Builtin::Clamp),
                _ => None,
            },
        }
    }
}

impl Builtin {
    /// Resolves a top-level shortcut such as `roll` or `d20`.
    pub(crate) fn global(name: &str) -> Option<Self> {
        match name {
            "roll" => Some(Self::Roll),
            "abilityModifier" => Some(Self::AbilityModifier),
            "proficiencyBonus" => Some(Self::ProficiencyBonus),
            "inRange" => Some(Self::InRange),
            other if other.starts_with('d') => die_shortcut(other).map(Self::Die),
            _ => None,
        }
    }

    pub(crate) fn name(self) -> String {
        match self {
            Self::Roll => "roll".to_owned(),
            Self::Die(sides) => format!("d{sides}"),
            Self::AbilityModifier => "abilityModifier".to_owned(),
            Self::ProficiencyBonus => "proficiencyBonus".to_owned(),
            Self::InRange => "inRange".to_owned(),
            Self::Min => "min".to_owned(),
            Self::Max => "max".to_owned(),
            Self::Floor => "floor".to_owned(),
            Self::Ceil => "ceil".to_owned(),
            Self::Abs => "abs".to_owned(),
            Self::Clamp => "clamp".to_owned(),
        }
    }
}

/// Limits applied to dice calls.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DiceLimits {
    pub max_dice: u32,
    pub max_sides: u32,
}

fn arity(builtin: Builtin, args: &[f64], allowed: &[usize]) -> Result<(), ScriptFault> {
    if allowed.contains(&args.len()) {
        Ok(())
    } else {
        Err(ScriptFault::Runtime(format!(
            "{}() takes {} argument(s), got {}",
            builtin.name(),
            allowed
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" or "),
            args.len()
        )))
    }
}

#[allow(clippy::cast_possible_truncation)]
fn integer(builtin: Builtin, value: f64) -> Result<i64, ScriptFault> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15 {
        Ok(value as i64)
    } else {
        Err(ScriptFault::Runtime(format!(
            "{}() expects whole numbers, got {value}",
            builtin.name()
        )))
    }
}

fn bounded(
    builtin: Builtin,
    value: f64,
    what: &str,
    min: u32,
    max: u32,
) -> Result<u32, ScriptFault> {
    let n = integer(builtin, value)?;
    u32::try_from(n)
        .ok()
        .filter(|n| (min..=max).contains(n))
        .ok_or_else(|| {
            ScriptFault::LimitExceeded(format!(
                "{}() {what} must be between {min} and {max}, got {n}",
                builtin.name()
            ))
        })
}

/// Invokes a capability with numeric arguments.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn invoke(
    builtin: Builtin,
    args: &[f64],
    rng: &mut dyn DeterministicRng,
    limits: DiceLimits,
) -> Result<crate::value::ScriptValue, ScriptFault> {
    use crate::value::ScriptValue::{Bool, Number};

    if let Some(bad) = args.iter().find(|arg| !arg.is_finite()) {
        return Err(ScriptFault::Runtime(format!(
            "{}() expects finite numbers, got {bad}",
            builtin.name()
        )));
    }

    match builtin {
        Builtin::Roll => {
            arity(builtin, args, &[1, 2])?;
            if let [sides] = args {
                let sides = bounded(builtin, *sides, "sides", 1, limits.max_sides)?;
                Ok(Number(f64::from(roll(rng, sides))))
            } else {
                let count = bounded(builtin, args[0], "count", 0, limits.max_dice)?;
                let sides = bounded(builtin, args[1], "sides", 1, limits.max_sides)?;
                Ok(Number(roll_many(rng, count, sides) as f64))
            }
        }
        Builtin::Die(sides) => {
            arity(builtin, args, &[0, 1])?;
            let count = match args.first() {
                Some(count) => bounded(builtin, *count, "count", 0, limits.max_dice)?,
                None => 1,
            };
            Ok(Number(roll_many(rng, count, sides) as f64))
        }
        Builtin::AbilityModifier => {
            arity(builtin, args, &[1])?;
            Ok(Number(ability_modifier(integer(builtin, args[0])?) as f64))
        }
        Builtin::ProficiencyBonus => {
            arity(builtin, args, &[1])?;
            Ok(Number(proficiency_bonus(integer(builtin, args[0])?) as f64))
        }
        Builtin::InRange => {
            arity(builtin, args, &[3])?;
            Ok(Bool(in_range(args[0], args[1], args[2])))
        }
        Builtin::Min | Builtin::Max => {
            if args.is_empty() {
                return Err(ScriptFault::Runtime(format!(
                    "{}() needs at least one argument",
                    builtin.name()
                )));
            }
            let pick: fn(f64, f64) -> f64 = if builtin == Builtin::Min {
                f64::min
            } else {
                f64::max
            };
            Ok(Number(args[1..].iter().copied().fold(args[0], pick)))
        }
        Builtin::Floor => {
            arity(builtin, args, &[1])?;
            Ok(Number(args[0].floor()))
        }
        Builtin::Ceil => {
            arity(builtin, args, &[1])?;
            Ok(Number(args[0].ceil()))
        }
        Builtin::Abs => {
            arity(builtin, args, &[1])?;
            Ok(Number(args[0].abs()))
        }
        Builtin::Clamp => {
            arity(builtin, args, &[3])?;
            if args[1] > args[2] {
                return Err(ScriptFault::Runtime(
                    "clamp() lower bound exceeds upper bound".to_owned(),
                ));
            }
            Ok(Number(args[0].clamp(args[1], args[2])))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ScriptValue;
    use loreforge_core::rng::SeededRng;
    use loreforge_test_support::SequenceRng;

    const LIMITS: DiceLimits = DiceLimits {
        max_dice: 1_000,
        max_sides: 1_000,
    };

    #[test]
    fn test_ability_modifier_floors() {
        assert_eq!(ability_modifier(10), 0);
        assert_eq!(ability_modifier(11), 0);
        assert_eq!(ability_modifier(12), 1);
        assert_eq!(ability_modifier(8), -1);
        assert_eq!(ability_modifier(7), -2);
        assert_eq!(ability_modifier(1), -5);
    }

    #[test]
    fn test_proficiency_bonus_steps_every_four_levels() {
        assert_eq!(proficiency_bonus(1), 2);
        assert_eq!(proficiency_bonus(4), 2);
        assert_eq!(proficiency_bonus(5), 3);
        assert_eq!(proficiency_bonus(9), 4);
        assert_eq!(proficiency_bonus(17), 6);
    }

    #[test]
    fn test_in_range_is_inclusive() {
        assert!(in_range(5.0, 5.0, 10.0));
        assert!(in_range(10.0, 5.0, 10.0));
        assert!(!in_range(10.5, 5.0, 10.0));
    }

    #[test]
    fn test_roll_covers_every_face_and_stays_in_bounds() {
        let mut rng = SeededRng::from_seed_u64(2024);
        for sides in 1..=20_u32 {
            let mut seen = vec![false; sides as usize];
            for _ in 0..10_000 {
                let value = roll(&mut rng, sides);
                assert!((1..=sides).contains(&value));
                seen[(value - 1) as usize] = true;
            }
            assert!(seen.iter().all(|s| *s), "d{sides} missed a face");
        }
    }

    #[test]
    fn test_roll_many_sums_each_die() {
        let mut rng = SequenceRng::new(vec![3, 5, 6]);
        assert_eq!(roll_many(&mut rng, 3, 6), 14);
    }

    #[test]
    fn test_shortcut_resolution() {
        assert_eq!(Namespace::Dice.member("D20"), Some(Builtin::Die(20)));
        assert_eq!(Namespace::Dice.member("d100"), Some(Builtin::Die(100)));
        assert_eq!(Namespace::Dice.member("D7"), None);
        assert_eq!(Builtin::global("d6"), Some(Builtin::Die(6)));
        assert_eq!(Builtin::global("delete"), None);
    }

    #[test]
    fn test_invoke_rejects_oversized_rolls() {
        let mut rng = SequenceRng::new(vec![]);
        let err = invoke(Builtin::Roll, &[5_000.0, 6.0], &mut rng, LIMITS).unwrap_err();
        assert!(matches!(err, ScriptFault::LimitExceeded(_)));

        let err = invoke(Builtin::Roll, &[0.0], &mut rng, LIMITS).unwrap_err();
        assert!(matches!(err, ScriptFault::LimitExceeded(_)));
    }

    #[test]
    fn test_invoke_checks_arity_and_integers() {
        let mut rng = SequenceRng::new(vec![]);
        assert!(matches!(
            invoke(Builtin::AbilityModifier, &[], &mut rng, LIMITS),
            Err(ScriptFault::Runtime(_))
        ));
        assert!(matches!(
            invoke(Builtin::AbilityModifier, &[12.5], &mut rng, LIMITS),
            Err(ScriptFault::Runtime(_))
        ));
    }

    #[test]
    fn test_invoke_arithmetic_helpers() {
        let mut rng = SequenceRng::new(vec![]);
        assert_eq!(
            invoke(Builtin::Max, &[1.0, 9.0, 4.0], &mut rng, LIMITS).unwrap(),
            ScriptValue::Number(9.0)
        );
        assert_eq!(
            invoke(Builtin::Clamp, &[15.0, 0.0, 10.0], &mut rng, LIMITS).unwrap(),
            ScriptValue::Number(10.0)
        );
        assert_eq!(
            invoke(Builtin::InRange, &[3.0, 1.0, 3.0], &mut rng, LIMITS).unwrap(),
            ScriptValue::Bool(true)
        );
    }

    #[test]
    fn test_invoke_refuses_non_finite_arguments() {
        let mut rng = SequenceRng::new(vec![]);
        for args in [
            [1.0, f64::NAN, 5.0],
            [f64::NAN, 1.0, 5.0],
            [1.0, 0.0, f64::INFINITY],
        ] {
            assert!(matches!(
                invoke(Builtin::Clamp, &args, &mut rng, LIMITS),
                Err(ScriptFault::Runtime(_))
            ));
        }
        assert!(matches!(
            invoke(Builtin::Floor, &[f64::NEG_INFINITY], &mut rng, LIMITS),
            Err(ScriptFault::Runtime(_))
        ));
    }
}
