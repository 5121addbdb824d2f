//! Skill rating: the pure Elo calculator and the outcome type it consumes.

pub mod elo;

pub use elo::{expected_score, rate, DEFAULT_K_FACTOR, DEFAULT_RATING, RATING_FLOOR};

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MatchpointError;

/// Match outcome from a single player's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Loss,
    Draw,
}

impl Outcome {
    /// Actual score used by the Elo update.
    pub fn score(&self) -> f64 {
        match self {
            Outcome::Win => 1.0,
            Outcome::Loss => 0.0,
            Outcome::Draw => 0.5,
        }
    }

    /// The same result seen from the other side of the board.
    pub fn inverse(&self) -> Outcome {
        match self {
            Outcome::Win => Outcome::Loss,
            Outcome::Loss => Outcome::Win,
            Outcome::Draw => Outcome::Draw,
        }
    }
}

impl FromStr for Outcome {
    type Err = MatchpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "win" => Ok(Outcome::Win),
            "loss" => Ok(Outcome::Loss),
            "draw" => Ok(Outcome::Draw),
            other => Err(MatchpointError::InvalidInput(format!(
                "unknown outcome: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_scores() {
        assert_eq!(Outcome::Win.score(), 1.0);
        assert_eq!(Outcome::Draw.score(), 0.5);
        assert_eq!(Outcome::Loss.score(), 0.0);
    }

    #[test]
    fn outcome_parse() {
        assert_eq!("win".parse::<Outcome>().unwrap(), Outcome::Win);
        assert!("victory".parse::<Outcome>().is_err());
    }

    #[test]
    fn outcome_inverse() {
        assert_eq!(Outcome::Win.inverse(), Outcome::Loss);
        assert_eq!(Outcome::Draw.inverse(), Outcome::Draw);
    }
}
