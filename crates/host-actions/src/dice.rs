//! Dice formulas and rollers.

use crate::{HostError, HostResult};
use rand::Rng;

/// Source of die faces.
pub trait DiceRoller: Send + Sync {
    /// Roll one die with `sides` faces, returning 1..=sides.
    fn roll_die(&self, sides: u32) -> u32;

    /// Pick an index in 0..len.
    fn pick(&self, len: usize) -> usize {
        match u32::try_from(len) {
            Ok(0) => 0,
            Ok(n) => (self.roll_die(n) - 1) as usize,
            Err(_) => 0,
        }
    }

    /// Evaluate a formula such as `1d20+5` or `2d6 + 1d4 - 1`.
    fn roll(&self, formula: &str) -> HostResult<Roll> {
        let terms = parse_formula(formula)?;
        let overflow = || HostError::InvalidFormula(format!("{} overflows", formula.trim()));
        let mut dice = Vec::new();
        let mut total = 0i64;

        for term in terms {
            match term {
                Term::Dice { sign, count, sides } => {
                    for _ in 0..count {
                        let face = self.roll_die(sides);
                        dice.push(face);
                        total = total
                            .checked_add(sign * i64::from(face))
                            .ok_or_else(overflow)?;
                    }
                }
                Term::Flat(value) => total = total.checked_add(value).ok_or_else(overflow)?,
            }
        }

        Ok(Roll {
            formula: formula.trim().to_string(),
            dice,
            total,
        })
    }
}

/// Result of evaluating a formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roll {
    pub formula: String,
    /// Individual faces, in formula order.
    pub dice: Vec<u32>,
    pub total: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Term {
    Dice { sign: i64, count: u32, sides: u32 },
    Flat(i64),
}

const MAX_DICE: u32 = 100;

fn parse_formula(formula: &str) -> HostResult<Vec<Term>> {
    let compact: String = formula.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(HostError::InvalidFormula("empty formula".to_string()));
    }

    let invalid = || HostError::InvalidFormula(formula.to_string());
    let mut terms = Vec::new();
    let mut rest = compact.as_str();

    while !rest.is_empty() {
        let (sign, body) = match rest.as_bytes()[0] {
            b'+' => (1, &rest[1..]),
            b'-' => (-1, &rest[1..]),
            _ if terms.is_empty() => (1, rest),
            _ => return Err(invalid()),
        };
        let end = body.find(|c: char| c == '+' || c == '-').unwrap_or(body.len());
        let token = &body[..end];
        rest = &body[end..];

        let term = match token.to_ascii_lowercase().split_once('d') {
            Some((count, sides)) => {
                let count = if count.is_empty() {
                    1
                } else {
                    count.parse::<u32>().map_err(|_| invalid())?
                };
                let sides = sides.parse::<u32>().map_err(|_| invalid())?;
                if count == 0 || count > MAX_DICE || sides == 0 {
                    return Err(invalid());
                }
                Term::Dice { sign, count, sides }
            }
            None => Term::Flat(sign * token.parse::<i64>().map_err(|_| invalid())?),
        };
        terms.push(term);
    }

    Ok(terms)
}

/// Roller backed by the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandRoller;

impl DiceRoller for RandRoller {
    fn roll_die(&self, sides: u32) -> u32 {
        rand::thread_rng().gen_range(1..=sides.max(1))
    }
}

/// Roller that always shows the same face, capped at the die size.
#[derive(Debug, Clone, Copy)]
pub struct FixedRoller(pub u32);

impl DiceRoller for FixedRoller {
    fn roll_die(&self, sides: u32) -> u32 {
        self.0.clamp(1, sides.max(1))
    }
}

/// Ability modifier for a score: `floor((score - 10) / 2)`.
pub fn ability_modifier(score: i64) -> i64 {
    score.saturating_sub(10).div_euclid(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_terms() {
        assert_eq!(
            parse_formula("2d6 + 1d4 - 1").unwrap(),
            vec![
                Term::Dice { sign: 1, count: 2, sides: 6 },
                Term::Dice { sign: 1, count: 1, sides: 4 },
                Term::Flat(-1),
            ]
        );
        assert_eq!(
            parse_formula("d20").unwrap(),
            vec![Term::Dice { sign: 1, count: 1, sides: 20 }]
        );
        assert_eq!(parse_formula("-3").unwrap(), vec![Term::Flat(-3)]);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for formula in ["", "   ", "1d", "d", "2x6", "1d20++", "0d6", "1d0", "101d6", "abc"] {
            assert!(
                matches!(parse_formula(formula), Err(HostError::InvalidFormula(_))),
                "accepted {:?}",
                formula
            );
        }
    }

    #[test]
    fn test_fixed_roll_totals() {
        let roll = FixedRoller(4).roll("2d6+3").unwrap();
        assert_eq!(roll.dice, vec![4, 4]);
        assert_eq!(roll.total, 11);

        // Face is capped at the die size
        let roll = FixedRoller(20).roll("1d4 - 1").unwrap();
        assert_eq!(roll.total, 3);
    }

    #[test]
    fn test_roll_rejects_overflowing_total() {
        let err = FixedRoller(1).roll("9223372036854775807+1").unwrap_err();
        assert!(matches!(err, HostError::InvalidFormula(_)));

        let err = FixedRoller(6).roll("1d6 - 9223372036854775807 - 9").unwrap_err();
        assert!(matches!(err, HostError::InvalidFormula(_)));

        let roll = FixedRoller(1).roll("9223372036854775806+1").unwrap();
        assert_eq!(roll.total, i64::MAX);
    }

    #[test]
    fn test_rand_roller_stays_in_range() {
        let roller = RandRoller;
        for _ in 0..200 {
            let face = roller.roll_die(6);
            assert!((1..=6).contains(&face));
        }
        let roll = roller.roll("3d4").unwrap();
        assert!((3..=12).contains(&roll.total));
    }

    #[test]
    fn test_pick() {
        assert_eq!(FixedRoller(1).pick(3), 0);
        assert_eq!(FixedRoller(99).pick(3), 2);
        assert_eq!(FixedRoller(5).pick(0), 0);
    }

    #[test]
    fn test_ability_modifier() {
        assert_eq!(ability_modifier(10), 0);
        assert_eq!(ability_modifier(16), 3);
        assert_eq!(ability_modifier(9), -1);
        assert_eq!(ability_modifier(1), -5);
        assert_eq!(ability_modifier(i64::MIN), i64::MIN / 2);
    }
}
